//! Final assembly of an edited message
//!
//! Consumes the untouched source buffer plus a fully built lump list and
//! emits the edited byte stream. The lump list alone never mutates the
//! source; this is the single point where queued edits become output.
//!
//! Emission order: head-linked Add lumps first, in chain order; then a
//! cursor walk over the structural chain (bytes up to each node's offset,
//! the node's before-stack, the node's effect, the node's after-stack);
//! then the remaining source bytes; then tail-linked Add lumps. An Add lump
//! never interacts with offset order, wherever it sits in the chain.

use std::net::SocketAddr;

use crate::error::{EditError, EditResult};
use crate::lump::{Insert, Lump, LumpKind, LumpList, Payload, Subst};

/// Sending context used to resolve substitution lumps
///
/// Both addresses are optional; assembly only fails on a missing address if
/// a queued substitution actually needs it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssembleEnv {
    /// Local address the message arrived on
    pub recv: Option<SocketAddr>,
    /// Local address the message leaves from
    pub send: Option<SocketAddr>,
}

impl AssembleEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recv(mut self, addr: SocketAddr) -> Self {
        self.recv = Some(addr);
        self
    }

    pub fn with_send(mut self, addr: SocketAddr) -> Self {
        self.send = Some(addr);
        self
    }

    fn resolve(&self, subst: Subst) -> EditResult<String> {
        let addr = match subst {
            Subst::RecvAddr | Subst::RecvPort => self.recv,
            Subst::SendAddr | Subst::SendPort => self.send,
        }
        .ok_or_else(|| {
            EditError::state_error("assemble", format!("no address to resolve {:?}", subst))
        })?;

        Ok(match subst {
            Subst::RecvAddr | Subst::SendAddr => addr.ip().to_string(),
            Subst::RecvPort | Subst::SendPort => addr.port().to_string(),
        })
    }
}

/// Produce the edited message bytes
///
/// Offsets that run past the buffer are a caller error (the list never
/// checked them); they are clamped to the buffer end rather than panicking.
/// A structural offset behind the cursor (overlapping deletes) aborts with
/// a state error instead of producing corrupt output.
pub fn assemble(buf: &[u8], lumps: &LumpList, env: &AssembleEnv) -> EditResult<Vec<u8>> {
    let mut out = Vec::with_capacity(buf.len() + 128);
    let mut tail_adds: Vec<&Lump> = Vec::new();
    let mut cursor = 0usize;
    let mut seen_structural = false;

    for (_, lump) in lumps.iter() {
        match lump.kind() {
            LumpKind::Add(payload) => {
                if seen_structural {
                    tail_adds.push(lump);
                } else {
                    emit_add(&mut out, lump, payload, env)?;
                }
            }
            LumpKind::Delete { offset, len } => {
                seen_structural = true;
                let start = (*offset).min(buf.len());
                if start < cursor {
                    return Err(EditError::state_error(
                        "assemble",
                        format!("delete offset {} behind cursor {}", offset, cursor),
                    ));
                }
                out.extend_from_slice(&buf[cursor..start]);
                emit_stack(&mut out, lump.before(), env)?;
                cursor = offset.saturating_add(*len).min(buf.len());
                emit_stack(&mut out, lump.after(), env)?;
            }
            LumpKind::Anchor { offset, len } => {
                seen_structural = true;
                let start = (*offset).min(buf.len());
                if start < cursor {
                    return Err(EditError::state_error(
                        "assemble",
                        format!("anchor offset {} behind cursor {}", offset, cursor),
                    ));
                }
                out.extend_from_slice(&buf[cursor..start]);
                emit_stack(&mut out, lump.before(), env)?;
                // An anchor removes nothing: its covered bytes are copied
                let end = offset.saturating_add(*len).min(buf.len());
                out.extend_from_slice(&buf[start..end]);
                cursor = end;
                emit_stack(&mut out, lump.after(), env)?;
            }
        }
    }

    out.extend_from_slice(&buf[cursor..]);
    for lump in tail_adds {
        if let LumpKind::Add(payload) = lump.kind() {
            emit_add(&mut out, lump, payload, env)?;
        }
    }
    Ok(out)
}

/// UTF-8 convenience wrapper for callers editing text messages
pub fn assemble_str(buf: &str, lumps: &LumpList, env: &AssembleEnv) -> EditResult<String> {
    let bytes = assemble(buf.as_bytes(), lumps, env)?;
    String::from_utf8(bytes)
        .map_err(|_| EditError::state_error("assemble", "edited message is not valid UTF-8"))
}

fn emit_add(
    out: &mut Vec<u8>,
    lump: &Lump,
    payload: &Payload,
    env: &AssembleEnv,
) -> EditResult<()> {
    emit_stack(out, lump.before(), env)?;
    emit_payload(out, payload, env)?;
    emit_stack(out, lump.after(), env)
}

fn emit_stack<'a>(
    out: &mut Vec<u8>,
    stack: impl Iterator<Item = &'a Insert>,
    env: &AssembleEnv,
) -> EditResult<()> {
    for insert in stack {
        emit_payload(out, insert.payload(), env)?;
    }
    Ok(())
}

fn emit_payload(out: &mut Vec<u8>, payload: &Payload, env: &AssembleEnv) -> EditResult<()> {
    match payload {
        Payload::Bytes(bytes) => out.extend_from_slice(bytes),
        Payload::Subst(subst) => out.extend_from_slice(env.resolve(*subst)?.as_bytes()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lump::LumpList;

    const ENV: AssembleEnv = AssembleEnv {
        recv: None,
        send: None,
    };

    #[test]
    fn test_untouched_list_reproduces_source() {
        let buf = b"INVITE sip:a@b SIP/2.0\r\n\r\n";
        let lumps = LumpList::new();
        assert_eq!(assemble(buf, &lumps, &ENV).unwrap(), buf.to_vec());
    }

    #[test]
    fn test_delete_omits_range() {
        let buf = b"0123456789";
        let mut lumps = LumpList::new();
        lumps.mark_delete(3, 4, 0).unwrap();
        assert_eq!(assemble(buf, &lumps, &ENV).unwrap(), b"012789".to_vec());
    }

    #[test]
    fn test_anchor_removes_nothing() {
        let buf = b"0123456789";
        let mut lumps = LumpList::new();
        let anchor = lumps.mark_anchor(5, 0, 0).unwrap();
        lumps.insert_before(anchor, b"<".to_vec(), 0).unwrap();
        lumps.insert_after(anchor, b">".to_vec(), 0).unwrap();
        assert_eq!(
            assemble(buf, &lumps, &ENV).unwrap(),
            b"01234<>56789".to_vec()
        );
    }

    #[test]
    fn test_anchor_with_length_copies_covered_bytes() {
        let buf = b"0123456789";
        let mut lumps = LumpList::new();
        let anchor = lumps.mark_anchor(4, 3, 0).unwrap();
        lumps.insert_before(anchor, b"<".to_vec(), 0).unwrap();
        lumps.insert_after(anchor, b">".to_vec(), 0).unwrap();
        // Before-stack lands ahead of the covered range, after-stack behind it
        assert_eq!(
            assemble(buf, &lumps, &ENV).unwrap(),
            b"0123<456>789".to_vec()
        );
    }

    #[test]
    fn test_head_and_tail_adds() {
        let buf = b"MIDDLE";
        let mut lumps = LumpList::new();
        lumps.append(b"-tail1".to_vec(), 0).unwrap();
        lumps.mark_anchor(3, 0, 0).unwrap();
        lumps.insert_front(b"head-".to_vec(), 0).unwrap();
        lumps.append(b"-tail2".to_vec(), 0).unwrap();
        assert_eq!(
            assemble(buf, &lumps, &ENV).unwrap(),
            b"head-MIDDLE-tail1-tail2".to_vec()
        );
    }

    #[test]
    fn test_side_chain_emission_order() {
        let buf = b"abcdef";
        let mut lumps = LumpList::new();
        let anchor = lumps.mark_anchor(3, 0, 0).unwrap();
        lumps.insert_before(anchor, b"1".to_vec(), 0).unwrap();
        lumps.insert_before(anchor, b"2".to_vec(), 0).unwrap();
        lumps.insert_after(anchor, b"3".to_vec(), 0).unwrap();
        lumps.insert_after(anchor, b"4".to_vec(), 0).unwrap();
        // Stacks emit most-recent first: before → "21", after → "43"
        assert_eq!(assemble(buf, &lumps, &ENV).unwrap(), b"abc2143def".to_vec());
    }

    #[test]
    fn test_subst_resolution() {
        let buf = b"Via: SIP/2.0/UDP ;branch=z9hG4bK1\r\n";
        let mut lumps = LumpList::new();
        let anchor = lumps.mark_anchor(17, 0, 0).unwrap();
        lumps
            .insert_subst_before(anchor, Subst::SendAddr, 0)
            .unwrap();
        let env = AssembleEnv::new().with_send("192.0.2.10:5060".parse().unwrap());
        assert_eq!(
            assemble(buf, &lumps, &env).unwrap(),
            b"Via: SIP/2.0/UDP 192.0.2.10;branch=z9hG4bK1\r\n".to_vec()
        );
    }

    #[test]
    fn test_subst_without_env_fails() {
        let buf = b"x";
        let mut lumps = LumpList::new();
        let anchor = lumps.mark_anchor(0, 0, 0).unwrap();
        lumps
            .insert_subst_after(anchor, Subst::RecvPort, 0)
            .unwrap();
        let err = assemble(buf, &lumps, &ENV).unwrap_err();
        assert!(matches!(err, EditError::StateError { .. }));
    }

    #[test]
    fn test_out_of_range_offsets_clamped() {
        let buf = b"short";
        let mut lumps = LumpList::new();
        lumps.mark_delete(100, 50, 0).unwrap();
        // Caller error, but never a panic: the range clamps to the buffer
        assert_eq!(assemble(buf, &lumps, &ENV).unwrap(), b"short".to_vec());
    }

    #[test]
    fn test_overlapping_deletes_detected_at_assembly() {
        let buf = b"0123456789";
        let mut lumps = LumpList::new();
        lumps.mark_delete(2, 5, 0).unwrap();
        lumps.mark_delete(4, 2, 0).unwrap();
        let err = assemble(buf, &lumps, &ENV).unwrap_err();
        assert!(matches!(err, EditError::StateError { .. }));
    }

    #[test]
    fn test_record_route_before_max_forwards() {
        let buf = b"INVITE sip:a@b SIP/2.0\r\nMax-Forwards: 70\r\n\r\n";
        let offset = 24; // start of the Max-Forwards line
        let mut lumps = LumpList::new();
        let anchor = lumps.mark_anchor(offset, 0, 0).unwrap();
        lumps
            .insert_before(anchor, b"Record-Route: <sip:proxy>\r\n".to_vec(), 0)
            .unwrap();
        assert_eq!(
            assemble(buf, &lumps, &ENV).unwrap(),
            b"INVITE sip:a@b SIP/2.0\r\nRecord-Route: <sip:proxy>\r\nMax-Forwards: 70\r\n\r\n"
                .to_vec()
        );
    }
}

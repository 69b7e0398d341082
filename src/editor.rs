//! High-level header editing on an immutable message
//!
//! [`MessageEditor`] is the proxy-facing face of the lump core. It scans the
//! header block once, recording only byte ranges, then expresses every edit
//! as anchors, deletes and insertions against the untouched buffer. Nothing
//! is copied or rewritten until [`MessageEditor::build`] assembles.
//!
//! # Examples
//! ```
//! use sipedit::MessageEditor;
//! use std::net::SocketAddr;
//!
//! let original = "INVITE sip:bob@example.com SIP/2.0\r\n\
//!     Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
//!     Max-Forwards: 70\r\n\r\n";
//! let addr: SocketAddr = "192.168.1.1:5060".parse().unwrap();
//!
//! let mut editor = MessageEditor::new(original).unwrap();
//! editor.add_via_header("UDP", &addr, "z9hG4bK-branch123").unwrap();
//! editor.add_record_route_header(&addr).unwrap();
//! let modified = editor.build().unwrap();
//! assert!(modified.contains("Record-Route"));
//! ```

use std::net::SocketAddr;

use crate::assemble::{assemble_str, AssembleEnv};
use crate::error::{EditError, EditResult, ResourceType};
use crate::limits::MAX_MESSAGE_SIZE;
use crate::lump::{LumpHandle, LumpList};
use crate::types::{HeaderClass, TextRange};
use crate::validation::{validate_header_name, validate_header_value};

/// One scanned header line: its name and the full line including CRLF
#[derive(Debug, Clone, Copy)]
struct HeaderLine {
    name: TextRange,
    line: TextRange,
}

/// Lump-backed editor for one SIP message
pub struct MessageEditor<'a> {
    raw: &'a str,
    header_lines: Vec<HeaderLine>,
    /// Offset of the first header line (right after the start line)
    headers_start: usize,
    /// Offset of the blank line terminating the header block; new headers
    /// are appended here
    headers_end: usize,
    /// Lines already consumed by a remove/replace, so a repeated edit never
    /// queues overlapping deletes
    consumed: Vec<bool>,
    lumps: LumpList,
    env: AssembleEnv,
}

impl<'a> MessageEditor<'a> {
    /// Scan a message and prepare an empty edit list for it
    pub fn new(message: &'a str) -> EditResult<Self> {
        if message.len() > MAX_MESSAGE_SIZE {
            return Err(EditError::resource_error(
                ResourceType::Memory,
                message.len() as u64,
                MAX_MESSAGE_SIZE as u64,
            ));
        }

        let headers_start = match message.find("\r\n") {
            Some(pos) => pos + 2,
            None => message.len(),
        };
        let (header_lines, headers_end) = scan_header_lines(message, headers_start);
        let consumed = vec![false; header_lines.len()];

        Ok(Self {
            raw: message,
            header_lines,
            headers_start,
            headers_end,
            consumed,
            lumps: LumpList::new(),
            env: AssembleEnv::new(),
        })
    }

    /// Sending context for substitution lumps queued against this message
    pub fn set_env(&mut self, env: AssembleEnv) {
        self.env = env;
    }

    /// The edit list built so far
    pub fn lumps(&self) -> &LumpList {
        &self.lumps
    }

    /// Direct access to the edit list for edits the facade has no verb for
    pub fn lumps_mut(&mut self) -> &mut LumpList {
        &mut self.lumps
    }

    /// Append a header at the end of the header block
    pub fn insert_header(&mut self, name: &str, value: &str) -> EditResult<()> {
        validate_header_name(name)?;
        validate_header_value(value)?;
        let anchor = self.anchor_at(self.headers_end, name)?;
        self.push_header_line(anchor, name, value)
    }

    /// Insert a header at the top of the header block
    ///
    /// Successive calls keep their call order: the first inserted header is
    /// the first one emitted.
    pub fn insert_header_first(&mut self, name: &str, value: &str) -> EditResult<()> {
        validate_header_name(name)?;
        validate_header_value(value)?;
        let anchor = self.anchor_at(self.headers_start, name)?;
        self.push_header_line(anchor, name, value)
    }

    /// Remove every header matching `name`; returns how many were removed
    ///
    /// Matching is case-insensitive and understands RFC 3261 compact forms
    /// ("v" removes Via headers).
    pub fn remove_header(&mut self, name: &str) -> EditResult<usize> {
        validate_header_name(name)?;
        let classifier = HeaderClass::classify(name).classifier();
        let matches: Vec<usize> = self.match_indices(name);
        let mut removed = 0;
        for idx in matches {
            let line = self.header_lines[idx].line;
            self.lumps.mark_delete(line.start, line.len(), classifier)?;
            self.consumed[idx] = true;
            removed += 1;
        }
        Ok(removed)
    }

    /// Update the first header matching `name`, or append it if absent
    pub fn replace_header(&mut self, name: &str, value: &str) -> EditResult<()> {
        validate_header_name(name)?;
        validate_header_value(value)?;
        match self.match_indices(name).first().copied() {
            Some(idx) => {
                let line = self.header_lines[idx].line;
                let classifier = HeaderClass::classify(name).classifier();
                // Anchor before the delete: equal offsets keep creation
                // order, and the replacement text must land ahead of the
                // removed range
                let anchor = self.anchor_at(line.start, name)?;
                self.push_header_line(anchor, name, value)?;
                self.lumps.mark_delete(line.start, line.len(), classifier)?;
                self.consumed[idx] = true;
                Ok(())
            }
            None => self.insert_header(name, value),
        }
    }

    /// Add a Via header recording this hop
    ///
    /// Inserted above any existing Via headers, the standard position for
    /// the newest hop.
    pub fn add_via_header(
        &mut self,
        protocol: &str,
        addr: &SocketAddr,
        branch: &str,
    ) -> EditResult<()> {
        let value = format!("SIP/2.0/{} {};branch={}", protocol, addr, branch);
        validate_header_value(&value)?;
        let position = self
            .match_indices("Via")
            .first()
            .map(|&idx| self.header_lines[idx].line.start)
            .unwrap_or(self.headers_start);
        let anchor = self.anchor_at(position, "Via")?;
        self.push_header_line(anchor, "Via", &value)
    }

    /// Add a Record-Route header so in-dialog requests route through us
    ///
    /// Placed right after the Via block, before the remaining headers.
    pub fn add_record_route_header(&mut self, addr: &SocketAddr) -> EditResult<()> {
        let value = format!("<sip:{};lr>", addr);
        validate_header_value(&value)?;
        let position = self
            .match_indices("Via")
            .last()
            .map(|&idx| self.header_lines[idx].line.end)
            .unwrap_or(self.headers_start);
        let anchor = self.anchor_at(position, "Record-Route")?;
        self.push_header_line(anchor, "Record-Route", &value)
    }

    /// Assemble the edited message
    pub fn build(&self) -> EditResult<String> {
        assemble_str(self.raw, &self.lumps, &self.env)
    }

    /// Header lines still present (not consumed by remove/replace) whose
    /// name matches, compact forms included
    fn match_indices(&self, name: &str) -> Vec<usize> {
        let wanted_class = HeaderClass::classify(name);
        self.header_lines
            .iter()
            .enumerate()
            .filter(|(idx, header)| {
                if self.consumed[*idx] {
                    return false;
                }
                let line_name = header.name.as_str(self.raw);
                if line_name.eq_ignore_ascii_case(name) {
                    return true;
                }
                wanted_class != HeaderClass::Other
                    && HeaderClass::classify(line_name) == wanted_class
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    fn anchor_at(&mut self, offset: usize, name: &str) -> EditResult<LumpHandle> {
        let classifier = HeaderClass::classify(name).classifier();
        self.lumps.mark_anchor(offset, 0, classifier)
    }

    fn push_header_line(
        &mut self,
        anchor: LumpHandle,
        name: &str,
        value: &str,
    ) -> EditResult<()> {
        let classifier = HeaderClass::classify(name).classifier();
        let line = format!("{}: {}\r\n", name, value);
        self.lumps
            .insert_before(anchor, line.into_bytes(), classifier)
    }
}

/// Scan the header block, returning the lines and the offset of the blank
/// line that terminates it. Folded continuation lines extend the previous
/// header's range.
fn scan_header_lines(message: &str, headers_start: usize) -> (Vec<HeaderLine>, usize) {
    let mut lines = Vec::new();
    let mut pos = headers_start;

    while pos < message.len() {
        let rest = &message[pos..];
        let line_len = match rest.find("\r\n") {
            Some(len) => len,
            None => rest.len(),
        };
        let line_end = (pos + line_len + 2).min(message.len());

        if line_len == 0 {
            // Blank line: end of the header block
            return (lines, pos);
        }

        let line = &rest[..line_len];
        if line.starts_with(' ') || line.starts_with('\t') {
            // Folded continuation belongs to the previous header line
            if let Some(prev) = lines.last_mut() {
                prev.line.end = line_end;
            }
        } else if let Some(colon) = line.find(':') {
            let name = line[..colon].trim_end();
            lines.push(HeaderLine {
                name: TextRange::new(pos, pos + name.len()),
                line: TextRange::new(pos, line_end),
            });
        }
        pos = line_end;
    }

    (lines, message.len())
}

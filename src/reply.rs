//! Reply lump list: ordered fragments for a locally built response
//!
//! Header and body fragments accumulate here while a transaction builds its
//! own response. The list enforces exactly one body fragment, keeps every
//! header fragment ahead of it, and tracks per-fragment ownership so each
//! buffer is released exactly once. A reply that must survive a hand-off to
//! another worker is first promoted down to its shared-domain fragments with
//! [`ReplyLumpList::filter_retain_shared`].

use std::sync::Arc;

use crate::error::{EditError, EditResult, ResourceType};
use crate::limits::{MAX_REPLY_FRAGMENT_LEN, MAX_REPLY_LUMPS};

/// Role of a fragment within the response; every fragment is exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Header,
    Body,
}

/// Ownership and memory domain of a fragment's text
///
/// One tagged enum instead of flag bits, so a fragment cannot mix memory
/// domains and a buffer cannot be freed twice or never.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyText {
    /// Private copy owned by the list
    Copied(Box<[u8]>),
    /// Caller buffer adopted without copying; released with the node
    Given(Vec<u8>),
    /// Borrowed bytes, never copied and never released
    Borrowed(&'static [u8]),
    /// Cross-process shared domain; the only variant that survives
    /// promotion. Built through the privileged entry point only.
    Shared(Arc<[u8]>),
}

impl ReplyText {
    /// Copy `text` into list-owned storage
    pub fn copied(text: &[u8]) -> Self {
        ReplyText::Copied(text.to_vec().into_boxed_slice())
    }

    /// Adopt a caller buffer without copying
    pub fn given(text: Vec<u8>) -> Self {
        ReplyText::Given(text)
    }

    /// Borrow static bytes; nothing is copied or released
    pub fn borrowed(text: &'static [u8]) -> Self {
        ReplyText::Borrowed(text)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ReplyText::Copied(b) => b,
            ReplyText::Given(b) => b,
            ReplyText::Borrowed(b) => b,
            ReplyText::Shared(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    fn is_shared(&self) -> bool {
        matches!(self, ReplyText::Shared(_))
    }
}

/// Stable handle to a fragment within its list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyHandle(usize);

/// One response fragment
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyLump {
    text: ReplyText,
    kind: ReplyKind,
    next: Option<ReplyHandle>,
}

impl ReplyLump {
    pub fn text(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn kind(&self) -> ReplyKind {
        self.kind
    }

    pub fn is_shared(&self) -> bool {
        self.text.is_shared()
    }

    /// Consume the fragment and take its text back
    pub fn into_text(self) -> ReplyText {
        self.text
    }
}

/// Flat ordered list of response fragments for one transaction
#[derive(Debug)]
pub struct ReplyLumpList {
    slots: Vec<Option<ReplyLump>>,
    head: Option<ReplyHandle>,
    live: usize,
    max_fragments: usize,
}

impl Default for ReplyLumpList {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyLumpList {
    pub fn new() -> Self {
        Self::with_max_fragments(MAX_REPLY_LUMPS)
    }

    /// Create a list with a non-default fragment ceiling
    pub fn with_max_fragments(max_fragments: usize) -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            live: 0,
            max_fragments,
        }
    }

    /// Number of linked fragments
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, handle: ReplyHandle) -> Option<&ReplyLump> {
        self.slots.get(handle.0).and_then(|slot| slot.as_ref())
    }

    /// Iterate fragments in list order
    pub fn iter(&self) -> ReplyLumps<'_> {
        ReplyLumps {
            list: self,
            cur: self.head,
        }
    }

    /// Whether a body fragment is currently linked
    pub fn has_body(&self) -> bool {
        self.iter().any(|(_, l)| l.kind() == ReplyKind::Body)
    }

    /// Queue a fragment for the response being built
    ///
    /// Rejects empty text, shared-domain text (those fragments are built by
    /// the privileged path, [`ReplyLumpList::add_shared`]) and a second body
    /// fragment; the first body fragment is never silently replaced. Header
    /// fragments always land ahead of a trailing body fragment. On any
    /// failure the list is left exactly as it was.
    pub fn add(&mut self, text: ReplyText, kind: ReplyKind) -> EditResult<ReplyHandle> {
        if text.is_shared() {
            return Err(EditError::fragment_error(
                "shared-domain fragments are built by the privileged path",
            ));
        }
        self.link(text, kind)
    }

    /// Privileged entry point: queue a shared-domain fragment
    ///
    /// Used when the response is being built in the cross-process domain so
    /// it can outlive this worker's context.
    pub fn add_shared(&mut self, text: Arc<[u8]>, kind: ReplyKind) -> EditResult<ReplyHandle> {
        self.link(ReplyText::Shared(text), kind)
    }

    fn link(&mut self, text: ReplyText, kind: ReplyKind) -> EditResult<ReplyHandle> {
        if text.is_empty() {
            return Err(EditError::fragment_error("empty fragment text"));
        }
        if text.len() > MAX_REPLY_FRAGMENT_LEN {
            return Err(EditError::resource_error(
                ResourceType::Memory,
                text.len() as u64,
                MAX_REPLY_FRAGMENT_LEN as u64,
            ));
        }
        if kind == ReplyKind::Body && self.has_body() {
            return Err(EditError::DuplicateBody);
        }
        if self.live >= self.max_fragments {
            return Err(EditError::resource_error(
                ResourceType::ReplyLumps,
                self.live as u64,
                self.max_fragments as u64,
            ));
        }

        let handle = ReplyHandle(self.slots.len());

        // Headers link ahead of a trailing body fragment; everything else
        // goes to the tail. The body, if present, is always last.
        let mut prev: Option<ReplyHandle> = None;
        let mut cur = self.head;
        while let Some(h) = cur {
            let node = match &self.slots[h.0] {
                Some(node) => node,
                None => break,
            };
            if kind == ReplyKind::Header && node.kind() == ReplyKind::Body {
                break;
            }
            prev = Some(h);
            cur = node.next;
        }

        self.slots.push(Some(ReplyLump {
            text,
            kind,
            next: cur,
        }));
        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p.0].as_mut() {
                    node.next = Some(handle);
                }
            }
            None => self.head = Some(handle),
        }
        self.live += 1;
        Ok(handle)
    }

    /// Detach a fragment without releasing it; ownership returns to the
    /// caller. O(n) identity search. Returns `None` if the handle is not
    /// currently linked.
    pub fn unlink(&mut self, handle: ReplyHandle) -> Option<ReplyLump> {
        let mut prev: Option<ReplyHandle> = None;
        let mut cur = self.head;
        while let Some(h) = cur {
            let next = match &self.slots[h.0] {
                Some(node) => node.next,
                None => return None,
            };
            if h == handle {
                match prev {
                    Some(p) => {
                        if let Some(node) = self.slots[p.0].as_mut() {
                            node.next = next;
                        }
                    }
                    None => self.head = next,
                }
                let mut taken = self.slots[h.0].take()?;
                taken.next = None;
                self.live -= 1;
                return Some(taken);
            }
            prev = Some(h);
            cur = next;
        }
        None
    }

    /// Promote the list for a cross-process hand-off
    ///
    /// Single pass: every fragment without shared-domain text is unlinked
    /// and released; shared fragments survive in their original order.
    /// Called exactly once, at the point the reply context moves to another
    /// worker. Returns the number of fragments released.
    pub fn filter_retain_shared(&mut self) -> usize {
        let mut released = 0;
        let mut prev: Option<ReplyHandle> = None;
        let mut cur = self.head;
        while let Some(h) = cur {
            let (next, shared) = match &self.slots[h.0] {
                Some(node) => (node.next, node.is_shared()),
                None => break,
            };
            if shared {
                prev = Some(h);
            } else {
                match prev {
                    Some(p) => {
                        if let Some(node) = self.slots[p.0].as_mut() {
                            node.next = next;
                        }
                    }
                    None => self.head = next,
                }
                // Dropping the slot releases Copied/Given storage; Borrowed
                // text is static and releasing it frees nothing.
                self.slots[h.0] = None;
                self.live -= 1;
                released += 1;
            }
            cur = next;
        }
        released
    }

    /// Concatenate every header fragment, in list order, into the header
    /// block of the response
    pub fn render_headers(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (_, lump) in self.iter() {
            if lump.kind() == ReplyKind::Header {
                out.extend_from_slice(lump.text());
            }
        }
        out
    }

    /// The response body, verbatim, if a body fragment is linked
    pub fn body(&self) -> Option<&[u8]> {
        self.iter()
            .find(|(_, l)| l.kind() == ReplyKind::Body)
            .map(|(_, l)| l.text())
    }
}

/// List-order iterator over reply fragments
pub struct ReplyLumps<'a> {
    list: &'a ReplyLumpList,
    cur: Option<ReplyHandle>,
}

impl<'a> Iterator for ReplyLumps<'a> {
    type Item = (ReplyHandle, &'a ReplyLump);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cur?;
        let lump = self.list.get(handle)?;
        self.cur = lump.next;
        Some((handle, lump))
    }
}

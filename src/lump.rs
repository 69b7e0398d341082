//! Message lump list: the ordered edit backbone for one SIP message
//!
//! Edits never touch the source buffer. Deletions and anchors form a chain
//! sorted ascending by byte offset; insertions either link into the chain at
//! its head or tail, or hang off a structural node's before/after stacks.
//! The buffer stays byte-identical until final assembly.
//!
//! One list belongs to exactly one message and one execution context; there
//! is no internal locking and every operation completes synchronously.

use crate::error::{EditError, EditResult, ResourceType};
use crate::limits::{MAX_INSERT_LEN, MAX_LUMPS, MAX_SIDE_LUMPS};

/// Stable handle to a lump within its list
///
/// Handles index an arena and stay valid while siblings are added or
/// side-chains grow. `clear()` invalidates every handle issued for the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LumpHandle(pub(crate) usize);

/// Substitution token resolved against the sending context at assembly time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subst {
    /// IP address the message was received on
    RecvAddr,
    /// IP address the message will be sent from
    SendAddr,
    /// Port the message was received on
    RecvPort,
    /// Port the message will be sent from
    SendPort,
}

/// Payload carried by an insertion
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Bytes owned by this lump, emitted verbatim; released exactly once,
    /// when the lump is freed
    Bytes(Vec<u8>),
    /// Placeholder the assembler resolves from its environment
    Subst(Subst),
}

impl Payload {
    /// Byte length of the payload as queued (substitutions resolve to an
    /// unknown length and report 0 here)
    pub fn len(&self) -> usize {
        match self {
            Payload::Bytes(b) => b.len(),
            Payload::Subst(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Literal bytes, if this payload is not a substitution
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Bytes(b) => Some(b),
            Payload::Subst(_) => None,
        }
    }
}

/// Side-chain insertion node
///
/// Deliberately carries no before/after fields of its own: a side-chain
/// element cannot hold a side-chain, so teardown never has a reason to
/// recurse no matter how many edits a message accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    payload: Payload,
    classifier: u32,
}

impl Insert {
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn classifier(&self) -> u32 {
        self.classifier
    }
}

/// What a main-chain lump does to the message
#[derive(Debug, Clone, PartialEq)]
pub enum LumpKind {
    /// Insert bytes at the head or tail of the output
    Add(Payload),
    /// Omit `len` bytes of the source buffer starting at `offset`
    Delete { offset: usize, len: usize },
    /// Attachment point at `offset`; removes nothing
    Anchor { offset: usize, len: usize },
}

/// One edit node in the main chain
#[derive(Debug, Clone, PartialEq)]
pub struct Lump {
    kind: LumpKind,
    classifier: u32,
    next: Option<LumpHandle>,
    // Stacks: the last element is the most recent push. Accessors yield
    // stack order (most recent first), which is also emission order.
    before: Vec<Insert>,
    after: Vec<Insert>,
}

impl Lump {
    fn new(kind: LumpKind, classifier: u32) -> Self {
        Self {
            kind,
            classifier,
            next: None,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    pub fn kind(&self) -> &LumpKind {
        &self.kind
    }

    /// Opaque tag recorded at creation; never interpreted by the core
    pub fn classifier(&self) -> u32 {
        self.classifier
    }

    /// Structural offset into the source buffer; `None` for Add lumps,
    /// which carry no position of their own
    pub fn offset(&self) -> Option<usize> {
        match self.kind {
            LumpKind::Delete { offset, .. } | LumpKind::Anchor { offset, .. } => Some(offset),
            LumpKind::Add(_) => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.offset().is_some()
    }

    /// Before-stack in stack order: most recently inserted first
    pub fn before(&self) -> impl Iterator<Item = &Insert> {
        self.before.iter().rev()
    }

    /// After-stack in stack order: most recently inserted first, which puts
    /// it closest to this node's position in the output
    pub fn after(&self) -> impl Iterator<Item = &Insert> {
        self.after.iter().rev()
    }
}

/// The edit list for one message
///
/// Nodes live in an arena and link through index handles, never owning
/// pointers, so dropping the list is a flat pass over the arena no matter
/// how deep the edit set got.
#[derive(Debug)]
pub struct LumpList {
    nodes: Vec<Lump>,
    head: Option<LumpHandle>,
    /// Lumps charged so far: main-chain nodes plus side-chain inserts
    lump_count: usize,
    max_lumps: usize,
}

impl Default for LumpList {
    fn default() -> Self {
        Self::new()
    }
}

impl LumpList {
    pub fn new() -> Self {
        Self::with_max_lumps(MAX_LUMPS)
    }

    /// Create a list with a non-default lump ceiling
    pub fn with_max_lumps(max_lumps: usize) -> Self {
        Self {
            nodes: Vec::new(),
            head: None,
            lump_count: 0,
            max_lumps,
        }
    }

    /// Total lumps charged to this list (main chain plus side-chains)
    pub fn lump_count(&self) -> usize {
        self.lump_count
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn get(&self, handle: LumpHandle) -> Option<&Lump> {
        self.nodes.get(handle.0)
    }

    /// Iterate the main chain in chain order
    pub fn iter(&self) -> Lumps<'_> {
        Lumps {
            list: self,
            cur: self.head,
        }
    }

    fn charge(&mut self, lumps: usize) -> EditResult<()> {
        if self.lump_count + lumps > self.max_lumps {
            return Err(EditError::resource_error(
                ResourceType::Lumps,
                self.lump_count as u64,
                self.max_lumps as u64,
            ));
        }
        self.lump_count += lumps;
        Ok(())
    }

    fn check_payload(payload: &Payload) -> EditResult<()> {
        if payload.len() > MAX_INSERT_LEN {
            return Err(EditError::resource_error(
                ResourceType::Memory,
                payload.len() as u64,
                MAX_INSERT_LEN as u64,
            ));
        }
        Ok(())
    }

    /// Link a new Add lump at the tail of the chain
    ///
    /// Walks to the tail; tail position means the payload is emitted after
    /// everything else at assembly.
    pub fn append(
        &mut self,
        payload: impl Into<Vec<u8>>,
        classifier: u32,
    ) -> EditResult<LumpHandle> {
        let payload = Payload::Bytes(payload.into());
        Self::check_payload(&payload)?;
        self.charge(1)?;

        let handle = LumpHandle(self.nodes.len());
        let mut prev = None;
        let mut cur = self.head;
        while let Some(h) = cur {
            prev = Some(h);
            cur = self.nodes[h.0].next;
        }
        self.nodes.push(Lump::new(LumpKind::Add(payload), classifier));
        match prev {
            Some(p) => self.nodes[p.0].next = Some(handle),
            None => self.head = Some(handle),
        }
        Ok(handle)
    }

    /// Link a new Add lump as the new head of the chain
    pub fn insert_front(
        &mut self,
        payload: impl Into<Vec<u8>>,
        classifier: u32,
    ) -> EditResult<LumpHandle> {
        let payload = Payload::Bytes(payload.into());
        Self::check_payload(&payload)?;
        self.charge(1)?;

        let handle = LumpHandle(self.nodes.len());
        let mut lump = Lump::new(LumpKind::Add(payload), classifier);
        lump.next = self.head;
        self.nodes.push(lump);
        self.head = Some(handle);
        Ok(handle)
    }

    /// Push an insertion onto a node's before-stack
    ///
    /// LIFO: among several pushes onto the same node, the most recent ends
    /// up leftmost in the output, furthest from the node's position.
    pub fn insert_before(
        &mut self,
        node: LumpHandle,
        payload: impl Into<Vec<u8>>,
        classifier: u32,
    ) -> EditResult<()> {
        self.push_side(node, Payload::Bytes(payload.into()), classifier, true)
    }

    /// Push an insertion onto a node's after-stack
    ///
    /// LIFO: the most recently inserted after-lump sits closest to the node
    /// in the output.
    pub fn insert_after(
        &mut self,
        node: LumpHandle,
        payload: impl Into<Vec<u8>>,
        classifier: u32,
    ) -> EditResult<()> {
        self.push_side(node, Payload::Bytes(payload.into()), classifier, false)
    }

    /// Push a substitution onto a node's before-stack
    pub fn insert_subst_before(
        &mut self,
        node: LumpHandle,
        subst: Subst,
        classifier: u32,
    ) -> EditResult<()> {
        self.push_side(node, Payload::Subst(subst), classifier, true)
    }

    /// Push a substitution onto a node's after-stack
    pub fn insert_subst_after(
        &mut self,
        node: LumpHandle,
        subst: Subst,
        classifier: u32,
    ) -> EditResult<()> {
        self.push_side(node, Payload::Subst(subst), classifier, false)
    }

    fn push_side(
        &mut self,
        node: LumpHandle,
        payload: Payload,
        classifier: u32,
        before: bool,
    ) -> EditResult<()> {
        Self::check_payload(&payload)?;
        if node.0 >= self.nodes.len() {
            return Err(EditError::state_error("insert", "stale lump handle"));
        }
        let chain_len = if before {
            self.nodes[node.0].before.len()
        } else {
            self.nodes[node.0].after.len()
        };
        if chain_len >= MAX_SIDE_LUMPS {
            return Err(EditError::resource_error(
                ResourceType::SideLumps,
                chain_len as u64,
                MAX_SIDE_LUMPS as u64,
            ));
        }
        self.charge(1)?;

        let insert = Insert { payload, classifier };
        if before {
            self.nodes[node.0].before.push(insert);
        } else {
            self.nodes[node.0].after.push(insert);
        }
        Ok(())
    }

    /// Mark a byte range of the source buffer for omission
    ///
    /// The new Delete node lands immediately before the first structural
    /// node whose offset exceeds `offset`, keeping the Delete/Anchor
    /// subsequence ascending. Add lumps met during the scan are skipped and
    /// never affect placement. Out-of-range offsets are a caller error and
    /// are not detected here.
    pub fn mark_delete(
        &mut self,
        offset: usize,
        len: usize,
        classifier: u32,
    ) -> EditResult<LumpHandle> {
        self.link_structural(LumpKind::Delete { offset, len }, classifier)
    }

    /// Place a zero-effect anchor at `offset`
    ///
    /// Same placement rule as `mark_delete`; the node removes nothing and
    /// exists only as a target for `insert_before`/`insert_after`.
    pub fn mark_anchor(
        &mut self,
        offset: usize,
        len: usize,
        classifier: u32,
    ) -> EditResult<LumpHandle> {
        self.link_structural(LumpKind::Anchor { offset, len }, classifier)
    }

    fn link_structural(&mut self, kind: LumpKind, classifier: u32) -> EditResult<LumpHandle> {
        let offset = match kind {
            LumpKind::Delete { offset, .. } | LumpKind::Anchor { offset, .. } => offset,
            LumpKind::Add(_) => {
                return Err(EditError::state_error("link", "Add lumps carry no offset"));
            }
        };
        self.charge(1)?;

        let handle = LumpHandle(self.nodes.len());
        let mut prev = None;
        let mut cur = self.head;
        while let Some(h) = cur {
            let node = &self.nodes[h.0];
            if let Some(existing) = node.offset() {
                if existing > offset {
                    break;
                }
            }
            prev = Some(h);
            cur = node.next;
        }

        let mut lump = Lump::new(kind, classifier);
        lump.next = cur;
        self.nodes.push(lump);
        match prev {
            Some(p) => self.nodes[p.0].next = Some(handle),
            None => self.head = Some(handle),
        }
        Ok(handle)
    }

    /// Tear down the whole chain in one flat pass
    ///
    /// For each node in chain order: release its before-stack, then its
    /// after-stack, then the node itself. Iterative on purpose: side-chains
    /// cannot nest, so a single loop with constant stack depth releases
    /// every lump regardless of how many edits the peer provoked. Returns
    /// the number of lumps released. Every handle issued for this list is
    /// invalid afterwards.
    pub fn clear(&mut self) -> usize {
        let mut released = 0;
        let mut cur = self.head.take();
        while let Some(h) = cur {
            let node = &mut self.nodes[h.0];
            cur = node.next.take();
            released += node.before.drain(..).count();
            released += node.after.drain(..).count();
            released += 1;
        }
        self.nodes.clear();
        self.lump_count = 0;
        released
    }
}

/// Chain-order iterator over a lump list
pub struct Lumps<'a> {
    list: &'a LumpList,
    cur: Option<LumpHandle>,
}

impl<'a> Iterator for Lumps<'a> {
    type Item = (LumpHandle, &'a Lump);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cur?;
        let lump = self.list.get(handle)?;
        self.cur = lump.next;
        Some((handle, lump))
    }
}

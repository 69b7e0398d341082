//! Security limits and constants for sipedit
//!
//! These limits bound attacker-influenced edit counts while leaving room
//! for legitimate proxy workloads

/// Maximum SIP message size we'll edit (64KB - 1)
pub const MAX_MESSAGE_SIZE: usize = 65535;

/// Maximum number of lumps charged against one message edit list
/// Edit counts track header counts, which the peer controls
pub const MAX_LUMPS: usize = 1024;

/// Maximum number of insert lumps on a single before/after side-chain
pub const MAX_SIDE_LUMPS: usize = 256;

/// Maximum number of fragments in one reply lump list
pub const MAX_REPLY_LUMPS: usize = 128;

/// Maximum length of a single inserted payload
pub const MAX_INSERT_LEN: usize = 8192;

/// Maximum length of a single reply fragment
pub const MAX_REPLY_FRAGMENT_LEN: usize = 16384;

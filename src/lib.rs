//! sipedit - In-place message editing core for SIP proxies
//!
//! This library provides the ordered edit lists ("lumps") a proxy uses to
//! queue insertions and deletions against an immutable wire-format SIP
//! message, plus the fragment list for locally built replies. The original
//! bytes are never copied or mutated until final assembly.

pub mod assemble;
pub mod benchmark;
pub mod editor;
pub mod error;
pub mod limits;
pub mod lump;
pub mod reply;
pub mod types;
pub mod validation;

pub use assemble::{assemble, assemble_str, AssembleEnv};
pub use editor::MessageEditor;
pub use error::{EditError, EditResult, ResourceType};
pub use lump::{Insert, Lump, LumpHandle, LumpKind, LumpList, Payload, Subst};
pub use reply::{ReplyHandle, ReplyKind, ReplyLump, ReplyLumpList, ReplyText};
pub use types::{HeaderClass, TextRange};

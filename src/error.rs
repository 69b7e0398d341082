//! Unified error handling for sipedit
//!
//! Single error type covering every edit-list failure mode. Errors surface
//! synchronously to the immediate caller and are never retried or downgraded
//! internally; the list is left exactly as it was before the failing call.

use std::fmt;
use std::error::Error as StdError;

/// Unified error type for edit-list operations
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    /// Edit-list capacity exhaustion
    ResourceError {
        resource_type: ResourceType,
        current_usage: u64,
        limit: u64,
    },

    /// Invalid reply fragment or injected text (empty text, shared-domain
    /// text through the public entry point, CRLF injection)
    FragmentError {
        reason: String,
    },

    /// A second body fragment was added while the list already holds one
    DuplicateBody,

    /// Operation applied to a list in the wrong state (stale handle,
    /// assembly over inconsistent offsets)
    StateError {
        operation: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Lumps,
    SideLumps,
    ReplyLumps,
    Memory,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::ResourceError { resource_type, current_usage, limit } => {
                write!(f, "Resource exhaustion: {:?} usage {} exceeds limit {}",
                       resource_type, current_usage, limit)
            },
            EditError::FragmentError { reason } => {
                write!(f, "Fragment error: {}", reason)
            },
            EditError::DuplicateBody => {
                write!(f, "Duplicate body: reply list already holds a body fragment")
            },
            EditError::StateError { operation, reason } => {
                write!(f, "State error: {} failed - {}", operation, reason)
            },
        }
    }
}

impl StdError for EditError {}

impl EditError {
    /// Create a resource exhaustion error
    pub fn resource_error(resource_type: ResourceType, current: u64, limit: u64) -> Self {
        EditError::ResourceError {
            resource_type,
            current_usage: current,
            limit,
        }
    }

    /// Create a fragment validation error
    pub fn fragment_error(reason: impl Into<String>) -> Self {
        EditError::FragmentError {
            reason: reason.into(),
        }
    }

    /// Create a state error
    pub fn state_error(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        EditError::StateError {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is recoverable (the worker can keep processing
    /// other messages after aborting the current rewrite)
    pub fn is_recoverable(&self) -> bool {
        match self {
            EditError::ResourceError { .. } => true,
            EditError::FragmentError { .. } => true,
            EditError::DuplicateBody => true,
            EditError::StateError { .. } => false,
        }
    }

    /// Get error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            EditError::ResourceError { .. } => "resource",
            EditError::FragmentError { .. } => "fragment",
            EditError::DuplicateBody => "fragment",
            EditError::StateError { .. } => "state",
        }
    }
}

/// Result type for sipedit operations
pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let resource_error = EditError::resource_error(ResourceType::Lumps, 1024, 1024);
        assert!(resource_error.to_string().contains("Resource exhaustion"));
        assert!(resource_error.is_recoverable());

        let state_error = EditError::state_error("assemble", "delete offset behind cursor");
        assert!(state_error.to_string().contains("assemble"));
        assert!(!state_error.is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        let fragment_error = EditError::fragment_error("empty fragment text");
        assert_eq!(fragment_error.category(), "fragment");
        assert_eq!(EditError::DuplicateBody.category(), "fragment");

        let resource_error = EditError::resource_error(ResourceType::Memory, 100, 50);
        assert_eq!(resource_error.category(), "resource");
    }
}

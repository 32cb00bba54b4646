//! Error types for the labeled event queue
//!
//! Queue operations themselves never fail; these errors come from the
//! administrative surface (group registration and run tracking).

use core::fmt;
use crate::id::GroupId;

/// Result type for group administration
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors returned by group administration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Group table is full
    NoGroupSlots,

    /// Group id is stale or was never registered
    UnknownGroup(GroupId),

    /// Group still has queued events and cannot be retired
    GroupBusy { group: GroupId, pending: u32 },

    /// Run finished for a group that was not marked running
    NotRunning(GroupId),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::NoGroupSlots => write!(f, "no group slots available"),
            QueueError::UnknownGroup(id) => write!(f, "unknown group {}", id),
            QueueError::GroupBusy { group, pending } => {
                write!(f, "group {} still has {} queued event(s)", group, pending)
            }
            QueueError::NotRunning(id) => write!(f, "group {} is not running", id),
        }
    }
}

impl std::error::Error for QueueError {}

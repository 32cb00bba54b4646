//! Interfaces between the queue and its execution harness

use crate::id::GroupId;

/// Running state consulted by the readiness oracle
///
/// The harness owns this state: it marks work running before executing an
/// event returned by the queue and clears it afterwards. The queue only
/// reads it.
pub trait RunningState {
    /// Anything at all is executing
    fn any_running(&self) -> bool;

    /// An unlabeled event is executing
    fn unlabeled_running(&self) -> bool;

    /// An event touching `group` is executing
    fn is_group_running(&self, group: GroupId) -> bool;
}

impl<S: RunningState + ?Sized> RunningState for &S {
    fn any_running(&self) -> bool {
        (**self).any_running()
    }

    fn unlabeled_running(&self) -> bool {
        (**self).unlabeled_running()
    }

    fn is_group_running(&self, group: GroupId) -> bool {
        (**self).is_group_running(group)
    }
}

/// Nothing is running anywhere
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl RunningState for Idle {
    fn any_running(&self) -> bool {
        false
    }

    fn unlabeled_running(&self) -> bool {
        false
    }

    fn is_group_running(&self, _group: GroupId) -> bool {
        false
    }
}

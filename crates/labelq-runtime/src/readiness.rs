//! Readiness oracle
//!
//! Decides whether a queued event may start given what is already
//! running. Unlabeled work is globally exclusive; labeled work only
//! excludes work of the same group.

use labelq_core::label::Label;
use labelq_core::traits::RunningState;

/// Whether an event with `label` may run now
pub fn is_ready_to_run<S: RunningState + ?Sized>(label: &Label, state: &S) -> bool {
    if !state.any_running() {
        return true;
    }

    if state.unlabeled_running() {
        return false;
    }

    match label {
        Label::Group(group) => !state.is_group_running(*group),
        Label::Affects(groups) => groups.iter().all(|g| !state.is_group_running(g)),
        Label::Unlabeled => false,
    }
}

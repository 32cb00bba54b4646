//! Queued event entry

use labelq_core::id::{EpochNumber, GroupId};
use labelq_core::label::Label;

/// A runnable together with the epoch it arrived in and its resolved label
#[derive(Debug)]
pub struct Entry<R> {
    runnable: R,
    epoch: EpochNumber,
    label: Label,
}

impl<R> Entry<R> {
    pub(crate) fn new(runnable: R, epoch: EpochNumber, label: Label) -> Self {
        Self { runnable, epoch, label }
    }

    #[inline]
    pub fn epoch(&self) -> EpochNumber {
        self.epoch
    }

    #[inline]
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Group whose FIFO held this entry
    #[inline]
    pub fn group(&self) -> Option<GroupId> {
        self.label.owner()
    }

    #[inline]
    pub fn runnable(&self) -> &R {
        &self.runnable
    }

    pub fn into_runnable(self) -> R {
        self.runnable
    }

    pub fn into_parts(self) -> (R, Label) {
        (self.runnable, self.label)
    }
}

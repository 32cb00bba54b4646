//! Scheduler context shared by labeled queues
//!
//! The context owns everything that is not per-queue: the group table, the
//! group ring with its round-robin cursor, the active (foreground) group
//! set and the running state read by the readiness oracle. Several
//! [`LabeledQueue`](crate::queue::LabeledQueue)s may share one context,
//! in which case they cooperate over a single ring; every queue operation
//! takes the context explicitly, under the same lock as the queue.

use labelq_core::error::{QueueError, QueueResult};
use labelq_core::id::GroupId;
use labelq_core::label::Label;
use labelq_core::slot::{Dequeued, Enqueued, GroupTable};
use labelq_core::traits::RunningState;
use labelq_core::{contract_assert, kdebug, kwarn};

use crate::config::QueueConfig;
use crate::ring::GroupRing;

/// Shared scheduling state
pub struct SchedulerContext {
    pub(crate) groups: GroupTable,
    pub(crate) ring: GroupRing,
    /// Group the next labeled scan starts at
    pub(crate) cursor: Option<GroupId>,
    /// Active groups, in activation order
    pub(crate) active: Vec<GroupId>,
    unlabeled_running: bool,
    running_groups: u32,
}

/// Proof that a label was marked running by [`SchedulerContext::begin_run`]
#[must_use = "a run must be finished with SchedulerContext::finish_run"]
#[derive(Debug)]
pub struct RunTicket {
    label: Label,
}

impl RunTicket {
    pub fn label(&self) -> &Label {
        &self.label
    }
}

impl SchedulerContext {
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            groups: GroupTable::new(config.max_groups),
            ring: GroupRing::new(),
            cursor: None,
            active: Vec::new(),
            unlabeled_running: false,
            running_groups: 0,
        }
    }

    // ------------------------------------------------------------------
    // Group registry
    // ------------------------------------------------------------------

    pub fn register_group(&mut self) -> QueueResult<GroupId> {
        let id = self.groups.allocate()?;
        kdebug!("registered group {}", id);
        Ok(id)
    }

    /// Retire a group. Fails while any queue still holds events for it.
    pub fn unregister_group(&mut self, id: GroupId) -> QueueResult<()> {
        let running = self.groups.is_running(id);
        self.groups.release(id)?;
        if running {
            kwarn!("group {} retired while marked running", id);
            self.running_groups -= 1;
        }
        self.active.retain(|&g| g != id);
        kdebug!("unregistered group {}", id);
        Ok(())
    }

    #[inline]
    pub fn is_registered(&self, id: GroupId) -> bool {
        self.groups.is_live(id)
    }

    #[inline]
    pub fn group_count(&self) -> u32 {
        self.groups.live_count()
    }

    /// Events queued for `id` across every queue sharing this context
    pub fn enqueued(&self, id: GroupId) -> u32 {
        self.groups.get(id).map_or(0, |rec| rec.enqueued())
    }

    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    // ------------------------------------------------------------------
    // Ring
    // ------------------------------------------------------------------

    /// Groups with queued events, in ring order starting from the head
    pub fn ring_order(&self) -> Vec<GroupId> {
        self.ring.iter(&self.groups).collect()
    }

    #[inline]
    pub fn cursor(&self) -> Option<GroupId> {
        self.cursor
    }

    /// Count an event in for `id`, linking the group into the ring on its
    /// first queued event
    pub(crate) fn count_in(&mut self, id: GroupId) {
        match self.groups.enqueue(id) {
            Ok(Enqueued::NewlyQueued) => {
                self.ring.push_back(&mut self.groups, id);
                if self.cursor.is_none() {
                    self.cursor = Some(id);
                }
                kdebug!("group {} joined ring (len {})", id, self.ring.len());
            }
            Ok(Enqueued::AlreadyQueued) => {}
            Err(e) => contract_assert!(false, "count_in: {}", e),
        }
    }

    /// Count an event out for `id`, unlinking the group once it has nothing
    /// queued anywhere
    pub(crate) fn count_out(&mut self, id: GroupId) {
        match self.groups.dequeue(id) {
            Ok(Dequeued::NoLongerQueued) => {
                if self.cursor == Some(id) {
                    // Cursor already moved past `id` unless it was alone
                    let next = self.ring.next_wrapping(&self.groups, id);
                    self.cursor = (next != id).then_some(next);
                }
                self.ring.remove(&mut self.groups, id);
                kdebug!("group {} left ring (len {})", id, self.ring.len());
            }
            Ok(Dequeued::StillQueued) => {}
            Err(e) => contract_assert!(false, "count_out: {}", e),
        }
    }

    /// Step the cursor past `id`
    pub(crate) fn advance_cursor(&mut self, id: GroupId) {
        self.cursor = Some(self.ring.next_wrapping(&self.groups, id));
    }

    // ------------------------------------------------------------------
    // Active groups
    // ------------------------------------------------------------------

    /// Mark a group as active (foreground) or background
    pub fn set_active(&mut self, id: GroupId, active: bool) -> QueueResult<()> {
        if !self.groups.is_live(id) {
            return Err(QueueError::UnknownGroup(id));
        }
        let present = self.active.contains(&id);
        if active && !present {
            self.active.push(id);
        } else if !active && present {
            self.active.retain(|&g| g != id);
        }
        Ok(())
    }

    pub fn clear_active(&mut self) {
        self.active.clear();
    }

    pub fn active_groups(&self) -> &[GroupId] {
        &self.active
    }

    // ------------------------------------------------------------------
    // Running state
    // ------------------------------------------------------------------

    /// Set a group's running flag directly
    pub fn set_group_running(&mut self, id: GroupId, running: bool) -> QueueResult<()> {
        let was = self.groups.get(id).ok_or(QueueError::UnknownGroup(id))?.is_running();
        self.groups.set_running(id, running)?;
        match (was, running) {
            (false, true) => self.running_groups += 1,
            (true, false) => self.running_groups -= 1,
            _ => {}
        }
        Ok(())
    }

    pub fn set_unlabeled_running(&mut self, running: bool) {
        self.unlabeled_running = running;
    }

    /// Mark everything `label` touches as running
    ///
    /// Call before executing an event returned by the queue; hand the
    /// ticket back to [`finish_run`](Self::finish_run) when it completes.
    pub fn begin_run(&mut self, label: &Label) -> QueueResult<RunTicket> {
        if let Some(&bad) = label.groups().iter().find(|&&g| !self.groups.is_live(g)) {
            return Err(QueueError::UnknownGroup(bad));
        }
        match label {
            Label::Unlabeled => {
                contract_assert!(!self.unlabeled_running, "unlabeled event already running");
                self.unlabeled_running = true;
            }
            _ => {
                for &g in label.groups() {
                    contract_assert!(!self.groups.is_running(g), "group {} already running", g);
                    self.set_group_running(g, true)?;
                }
            }
        }
        Ok(RunTicket { label: label.clone() })
    }

    /// Clear what [`begin_run`](Self::begin_run) marked
    pub fn finish_run(&mut self, ticket: RunTicket) -> QueueResult<()> {
        match &ticket.label {
            Label::Unlabeled => {
                self.unlabeled_running = false;
                Ok(())
            }
            label => {
                let mut result = Ok(());
                for &g in label.groups() {
                    if !self.groups.is_running(g) {
                        // Keep clearing the rest; report the first mismatch
                        if result.is_ok() {
                            result = Err(if self.groups.is_live(g) {
                                QueueError::NotRunning(g)
                            } else {
                                QueueError::UnknownGroup(g)
                            });
                        }
                        continue;
                    }
                    self.set_group_running(g, false)?;
                }
                result
            }
        }
    }

    /// Check ring links and that ring membership matches queued counts
    pub fn verify(&self) -> Result<(), String> {
        self.ring.verify(&self.groups)?;
        let queued = self
            .groups
            .live_ids()
            .filter(|&id| self.enqueued(id) > 0)
            .count();
        if queued != self.ring.len() {
            return Err(format!(
                "{} groups have queued events but ring holds {}",
                queued,
                self.ring.len()
            ));
        }
        for id in self.groups.live_ids() {
            if (self.enqueued(id) > 0) != self.ring.contains(&self.groups, id) {
                return Err(format!("group {} ring membership disagrees with its count", id));
            }
        }
        match self.cursor {
            None if !self.ring.is_empty() => Err("ring non-empty but cursor is null".into()),
            Some(c) if !self.ring.contains(&self.groups, c) => {
                Err(format!("cursor {} is not in the ring", c))
            }
            _ => Ok(()),
        }
    }
}

impl Default for SchedulerContext {
    fn default() -> Self {
        Self::new(&QueueConfig::default())
    }
}

impl RunningState for SchedulerContext {
    fn any_running(&self) -> bool {
        self.unlabeled_running || self.running_groups > 0
    }

    fn unlabeled_running(&self) -> bool {
        self.unlabeled_running
    }

    fn is_group_running(&self, group: GroupId) -> bool {
        self.groups.is_running(group)
    }
}

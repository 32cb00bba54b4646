//! # labelq - Labeled Event Queue
//!
//! Multiplexes work from many independent scheduling groups (one per tab,
//! document or session) onto a single logical execution context.
//!
//! ## Guarantees
//!
//! - **Epoch order**: labeled and unlabeled work never overtake each other
//! - **Group exclusion**: no two events of the same group run concurrently
//! - **Unlabeled exclusion**: unlabeled work runs only when nothing else does
//! - **Group FIFO**: events of one group run in the order they were queued
//! - **Fairness**: active (foreground) groups are preferred, but background
//!   groups keep getting their round-robin turn
//!
//! ## Quick Start
//!
//! ```ignore
//! use labelq::{EventQueue, GroupSet, Labelable, QueueConfig};
//!
//! struct Task { tab: Option<labelq::GroupId> }
//!
//! impl Labelable for Task {
//!     fn affected_groups(&self) -> Option<GroupSet> {
//!         self.tab.map(GroupSet::one)
//!     }
//! }
//!
//! let queue = EventQueue::new(QueueConfig::from_env())?;
//! let tab = queue.register_group()?;
//! queue.put_event(Task { tab: Some(tab) });
//!
//! if let Some((entry, ticket)) = queue.dispatch()? {
//!     // run entry.runnable() ...
//!     queue.finish_run(ticket)?;
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Producers                 Dispatcher             │
//! │           put_event()        get_event() / begin_run()      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼  SpinLock
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     LabeledQueue                            │
//! │    epochs │ unlabeled FIFO │ per-group FIFOs │ prioritizer  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SchedulerContext                          │
//! │    group table │ group ring + cursor │ active │ running     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// Re-export core types
pub use labelq_core::{
    EpochNumber,
    GroupId,
    GroupSet,
    Label,
    Labelable,
    RunningState,
    QueueError,
    QueueResult,
    SpinLock,
    SpinLockGuard,
};

// Re-export kprint macros for debug logging
pub use labelq_core::{kprintln, kerror, kwarn, kinfo, kdebug, ktrace};
pub use labelq_core::kprint::{
    LogLevel, init as init_logging, set_log_level, set_flush_enabled, set_context, clear_context,
};

// Re-export env utilities
pub use labelq_core::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

// Re-export runtime types
pub use labelq_runtime::{
    is_ready_to_run,
    ConfigError,
    Entry,
    LabeledQueue,
    QueueConfig,
    QueueStats,
    RunTicket,
    SchedulerContext,
};

/// A queue and the context it schedules against, guarded together
pub struct QueueState<R> {
    ctx: SchedulerContext,
    queue: LabeledQueue<R>,
}

impl<R> QueueState<R> {
    fn new(config: &QueueConfig) -> Self {
        Self {
            ctx: SchedulerContext::new(config),
            queue: LabeledQueue::new(config),
        }
    }

    pub fn put_event(&mut self, runnable: R)
    where
        R: Labelable,
    {
        self.queue.put_event(&mut self.ctx, runnable);
    }

    pub fn put_labeled(&mut self, runnable: R, label: Label) {
        self.queue.put_labeled(&mut self.ctx, runnable, label);
    }

    pub fn get_event(&mut self) -> Option<Entry<R>> {
        self.queue.get_event(&mut self.ctx)
    }

    /// Take the next ready event and mark its label running
    ///
    /// An event whose label names a group retired since it was queued is
    /// dropped and the error returned.
    pub fn dispatch(&mut self) -> QueueResult<Option<(Entry<R>, RunTicket)>> {
        let Some(entry) = self.queue.get_event(&mut self.ctx) else {
            return Ok(None);
        };
        match self.ctx.begin_run(entry.label()) {
            Ok(ticket) => Ok(Some((entry, ticket))),
            Err(e) => {
                kwarn!("dropping {} event from epoch {}: {}", entry.label(), entry.epoch(), e);
                Err(e)
            }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.queue.count()
    }

    pub fn has_ready_event(&self) -> bool {
        self.queue.has_ready_event(&self.ctx)
    }

    pub fn clear(&mut self) -> Vec<R> {
        self.queue.clear(&mut self.ctx)
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn context(&self) -> &SchedulerContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SchedulerContext {
        &mut self.ctx
    }

    pub fn queue(&self) -> &LabeledQueue<R> {
        &self.queue
    }
}

/// Thread-safe labeled event queue
///
/// Every method takes the lock for the duration of the call. Use
/// [`lock`](Self::lock) to group several operations under one acquisition.
pub struct EventQueue<R> {
    state: SpinLock<QueueState<R>>,
}

impl<R> EventQueue<R> {
    /// Create a queue after validating `config`
    pub fn new(config: QueueConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        kdebug!(
            "event queue: max_groups={} promotion_credit={}",
            config.max_groups,
            config.promotion_credit
        );
        Ok(Self {
            state: SpinLock::new(QueueState::new(&config)),
        })
    }

    /// Create a queue from library defaults and `LQ_*` overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(QueueConfig::from_env())
    }

    /// Acquire the queue lock
    #[inline]
    pub fn lock(&self) -> SpinLockGuard<'_, QueueState<R>> {
        self.state.lock()
    }

    pub fn put_event(&self, runnable: R)
    where
        R: Labelable,
    {
        self.lock().put_event(runnable);
    }

    pub fn get_event(&self) -> Option<Entry<R>> {
        self.lock().get_event()
    }

    /// See [`QueueState::dispatch`]
    pub fn dispatch(&self) -> QueueResult<Option<(Entry<R>, RunTicket)>> {
        self.lock().dispatch()
    }

    pub fn finish_run(&self, ticket: RunTicket) -> QueueResult<()> {
        self.lock().ctx.finish_run(ticket)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn has_ready_event(&self) -> bool {
        self.lock().has_ready_event()
    }

    pub fn register_group(&self) -> QueueResult<GroupId> {
        self.lock().ctx.register_group()
    }

    pub fn unregister_group(&self, group: GroupId) -> QueueResult<()> {
        self.lock().ctx.unregister_group(group)
    }

    pub fn set_active(&self, group: GroupId, active: bool) -> QueueResult<()> {
        self.lock().ctx.set_active(group, active)
    }

    pub fn clear(&self) -> Vec<R> {
        self.lock().clear()
    }

    pub fn stats(&self) -> QueueStats {
        self.lock().stats()
    }

    pub fn into_inner(self) -> QueueState<R> {
        self.state.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Task {
        id: usize,
        tab: Option<GroupId>,
    }

    impl Labelable for Task {
        fn affected_groups(&self) -> Option<GroupSet> {
            self.tab.map(GroupSet::one)
        }
    }

    fn queue() -> EventQueue<Task> {
        EventQueue::new(QueueConfig::new().max_groups(16).check_invariants(true)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = EventQueue::<Task>::new(QueueConfig::new().promotion_credit(0));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_dispatch_marks_running() {
        let q = queue();
        let tab = q.register_group().unwrap();
        q.put_event(Task { id: 1, tab: Some(tab) });
        q.put_event(Task { id: 2, tab: Some(tab) });

        let (entry, ticket) = q.dispatch().unwrap().unwrap();
        assert_eq!(entry.runnable().id, 1);
        assert!(q.lock().context().is_group_running(tab));

        // Same tab still running
        assert!(q.dispatch().unwrap().is_none());
        assert!(!q.has_ready_event());
        assert_eq!(q.count(), 1);

        q.finish_run(ticket).unwrap();
        let (entry, ticket) = q.dispatch().unwrap().unwrap();
        assert_eq!(entry.runnable().id, 2);
        q.finish_run(ticket).unwrap();
        assert!(q.is_empty());
        q.unregister_group(tab).unwrap();
    }

    #[test]
    fn test_unregister_busy_group() {
        let q = queue();
        let tab = q.register_group().unwrap();
        q.put_event(Task { id: 1, tab: Some(tab) });
        assert_eq!(
            q.unregister_group(tab),
            Err(QueueError::GroupBusy { group: tab, pending: 1 })
        );
        assert_eq!(q.clear().len(), 1);
        q.unregister_group(tab).unwrap();
    }

    #[test]
    fn test_lock_groups_operations() {
        let q = queue();
        let tab = q.register_group().unwrap();
        {
            let mut state = q.lock();
            state.put_event(Task { id: 1, tab: None });
            state.put_labeled(Task { id: 2, tab: None }, Label::Group(tab));
            assert_eq!(state.stats().epochs, 2);
            assert_eq!(state.queue().pending_for(tab), 1);
        }
        assert_eq!(q.get_event().map(|e| e.into_runnable().id), Some(1));
        assert_eq!(q.get_event().map(|e| e.group()), Some(Some(tab)));
    }

    #[test]
    fn test_concurrent_producers() {
        let q = Arc::new(queue());
        let tabs: Vec<GroupId> = (0..4).map(|_| q.register_group().unwrap()).collect();

        let handles: Vec<_> = tabs
            .iter()
            .copied()
            .enumerate()
            .map(|(t, tab)| {
                let q = q.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        q.put_event(Task { id: t * 1000 + i, tab: Some(tab) });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(q.count(), 200);

        // Per-tab order survives interleaved producers
        let mut last = vec![None::<usize>; tabs.len()];
        while let Some(entry) = q.get_event() {
            let task = entry.into_runnable();
            let t = task.id / 1000;
            assert!(last[t].map_or(true, |prev| prev < task.id));
            last[t] = Some(task.id);
        }
        assert!(q.is_empty());
    }
}

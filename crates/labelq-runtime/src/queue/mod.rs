//! Labeled event queue
//!
//! Design:
//! - Epoch deque records the labeled/unlabeled arrival order
//! - One FIFO for unlabeled events, one FIFO per group for labeled events
//! - Labeled events are served round-robin over the context's group ring,
//!   only from the front epoch, skipping groups that are running
//! - Active groups jump the ring, bounded by a starvation credit
//!
//! The queue is not thread-safe. Every method takes `&mut self` (or `&self`
//! for queries) together with the shared [`SchedulerContext`]; callers hold
//! one lock around both.

mod entry;
#[cfg(test)]
mod props;

pub use entry::Entry;

use std::collections::{HashMap, VecDeque};
use std::fmt;

use labelq_core::id::GroupId;
use labelq_core::label::{Label, Labelable};
use labelq_core::{contract_assert, kdebug, kerror, ktrace, kwarn};

use crate::config::QueueConfig;
use crate::context::SchedulerContext;
use crate::epoch::{Epoch, EpochQueue};
use crate::prioritizer::ActivePrioritizer;
use crate::readiness::is_ready_to_run;

/// Snapshot of queue occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub events: usize,
    pub epochs: usize,
    pub unlabeled: usize,
    pub groups: usize,
    pub starvation_credit: i32,
}

impl fmt::Display for QueueStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "events={} epochs={} unlabeled={} groups={} credit={}",
            self.events, self.epochs, self.unlabeled, self.groups, self.starvation_credit
        )
    }
}

/// Epoch-ordered queue of labeled and unlabeled events
pub struct LabeledQueue<R> {
    epochs: EpochQueue,
    unlabeled: VecDeque<Entry<R>>,
    groups: HashMap<GroupId, VecDeque<Entry<R>>>,
    num_events: usize,
    prioritizer: ActivePrioritizer,
    group_queue_capacity: usize,
    check_invariants: bool,
}

impl<R> LabeledQueue<R> {
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            epochs: EpochQueue::new(),
            unlabeled: VecDeque::with_capacity(config.unlabeled_capacity),
            groups: HashMap::new(),
            num_events: 0,
            prioritizer: ActivePrioritizer::new(config.promotion_credit),
            group_queue_capacity: config.group_queue_capacity,
            check_invariants: config.check_invariants,
        }
    }

    /// Enqueue a runnable, resolving its label from [`Labelable`]
    pub fn put_event(&mut self, ctx: &mut SchedulerContext, runnable: R)
    where
        R: Labelable,
    {
        let label = runnable.label();
        self.put_labeled(ctx, runnable, label);
    }

    /// Enqueue a runnable with an explicit label
    ///
    /// `Affects` labels are normalized first: an empty set is unlabeled and
    /// a single group is an ordinary group label.
    pub fn put_labeled(&mut self, ctx: &mut SchedulerContext, runnable: R, label: Label) {
        let label = match label {
            Label::Affects(set) => Label::classify(Some(set)),
            label => label,
        };
        let label = match label {
            Label::Group(group) if !ctx.is_registered(group) => {
                kwarn!("event labeled with unknown group {}, queueing unlabeled", group);
                contract_assert!(false, "put_event: unknown group {}", group);
                Label::Unlabeled
            }
            label => label,
        };

        let epoch = self.epochs.push_event(label.is_labeled());
        self.num_events += 1;
        ktrace!("put {} in epoch {} (count {})", label, epoch, self.num_events);

        match label.owner() {
            None => self.unlabeled.push_back(Entry::new(runnable, epoch, label)),
            Some(group) => {
                let capacity = self.group_queue_capacity;
                self.groups
                    .entry(group)
                    .or_insert_with(|| VecDeque::with_capacity(capacity))
                    .push_back(Entry::new(runnable, epoch, label));
                ctx.count_in(group);
            }
        }

        self.after_mutation(ctx);
    }

    /// Take the next event that may run now, if any
    ///
    /// Only events of the front epoch are candidates. `None` means nothing
    /// is ready, not that the queue is empty.
    pub fn get_event(&mut self, ctx: &mut SchedulerContext) -> Option<Entry<R>> {
        let front = *self.epochs.front()?;

        let entry = if front.labeled {
            self.take_labeled(ctx, &front)
        } else {
            self.take_unlabeled(ctx, &front)
        }?;

        ktrace!("get {} from epoch {} (count {})", entry.label(), entry.epoch(), self.num_events);
        self.after_mutation(ctx);
        Some(entry)
    }

    fn take_unlabeled(&mut self, ctx: &SchedulerContext, front: &Epoch) -> Option<Entry<R>> {
        let head = self.unlabeled.front();
        contract_assert!(head.is_some(), "unlabeled epoch {} without events", front.number);
        if !is_ready_to_run(head?.label(), ctx) {
            return None;
        }

        let entry = self.unlabeled.pop_front()?;
        contract_assert!(entry.epoch() == front.number, "unlabeled entry out of epoch");
        self.retire_one();
        Some(entry)
    }

    fn take_labeled(&mut self, ctx: &mut SchedulerContext, front: &Epoch) -> Option<Entry<R>> {
        self.prioritizer.promote(ctx);

        // Visit every group once, starting at the cursor
        let first = ctx.cursor?;
        let mut group = first;
        loop {
            self.prioritizer.visit();

            // Groups with no FIFO here belong to a sibling queue
            let eligible = match self.groups.get(&group).and_then(|q| q.front()) {
                Some(head) => head.epoch() == front.number && is_ready_to_run(head.label(), &*ctx),
                None => false,
            };
            if eligible {
                return self.pop_group(ctx, group);
            }

            group = ctx.ring.next_wrapping(&ctx.groups, group);
            if group == first {
                return None;
            }
        }
    }

    fn pop_group(&mut self, ctx: &mut SchedulerContext, group: GroupId) -> Option<Entry<R>> {
        ctx.advance_cursor(group);

        let fifo = self.groups.get_mut(&group)?;
        let entry = fifo.pop_front()?;
        if fifo.is_empty() {
            self.groups.remove(&group);
        }

        ctx.count_out(group);
        self.retire_one();
        Some(entry)
    }

    fn retire_one(&mut self) {
        if let Some(done) = self.epochs.pop_event() {
            kdebug!(
                "epoch {} ({}) drained",
                done.number,
                if done.labeled { "labeled" } else { "unlabeled" }
            );
        }
        self.num_events -= 1;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Number of queued events
    #[inline]
    pub fn count(&self) -> usize {
        self.num_events
    }

    /// Whether [`get_event`](Self::get_event) would return an event now
    ///
    /// Considers every group FIFO whose head is in the front epoch, not just
    /// the groups one ring rotation would reach.
    pub fn has_ready_event(&self, ctx: &SchedulerContext) -> bool {
        let Some(front) = self.epochs.front() else {
            return false;
        };

        if !front.labeled {
            return self
                .unlabeled
                .front()
                .map_or(false, |head| is_ready_to_run(head.label(), ctx));
        }

        self.groups
            .values()
            .filter_map(|q| q.front())
            .filter(|head| head.epoch() == front.number)
            .any(|head| is_ready_to_run(head.label(), ctx))
    }

    /// Events queued here for `group`
    pub fn pending_for(&self, group: GroupId) -> usize {
        self.groups.get(&group).map_or(0, |q| q.len())
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            events: self.num_events,
            epochs: self.epochs.len(),
            unlabeled: self.unlabeled.len(),
            groups: self.groups.len(),
            starvation_credit: self.prioritizer.starvation_credit(),
        }
    }

    /// Drain every queued runnable in epoch order
    ///
    /// Groups are released from the ring as their counts drop; within an
    /// epoch, groups are drained in id order.
    pub fn clear(&mut self, ctx: &mut SchedulerContext) -> Vec<R> {
        let mut drained: Vec<Entry<R>> = Vec::with_capacity(self.num_events);
        drained.extend(self.unlabeled.drain(..));

        let mut ids: Vec<GroupId> = self.groups.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            if let Some(fifo) = self.groups.remove(&id) {
                for _ in 0..fifo.len() {
                    ctx.count_out(id);
                }
                drained.extend(fifo);
            }
        }

        // Stable: FIFO order survives within each queue
        drained.sort_by_key(|e| e.epoch());

        kdebug!("cleared {} event(s) across {} epoch(s)", drained.len(), self.epochs.len());
        self.epochs.clear();
        self.num_events = 0;
        self.prioritizer.reset();
        self.after_mutation(ctx);

        drained.into_iter().map(Entry::into_runnable).collect()
    }

    fn after_mutation(&self, ctx: &SchedulerContext) {
        if !self.check_invariants {
            return;
        }
        if let Err(violation) = self.verify(ctx) {
            kerror!("labeled queue invariant violated: {}", violation);
            panic!("labeled queue invariant violated: {}", violation);
        }
    }

    /// Check bookkeeping against the queued entries and the shared context
    pub fn verify(&self, ctx: &SchedulerContext) -> Result<(), String> {
        if self.epochs.total() != self.num_events as u64 {
            return Err(format!(
                "epoch counts sum to {} but {} events are queued",
                self.epochs.total(),
                self.num_events
            ));
        }

        let mut labeled_of: HashMap<u64, bool> = HashMap::new();
        let mut unlabeled_total = 0u64;
        let mut prev: Option<&Epoch> = None;
        for epoch in self.epochs.iter() {
            if epoch.count == 0 {
                return Err(format!("epoch {} is empty", epoch.number));
            }
            if let Some(p) = prev {
                if epoch.number <= p.number {
                    return Err(format!("epoch {} follows {}", epoch.number, p.number));
                }
                if epoch.labeled == p.labeled {
                    return Err(format!("epochs {} and {} not merged", p.number, epoch.number));
                }
            }
            if !epoch.labeled {
                unlabeled_total += epoch.count as u64;
            }
            labeled_of.insert(epoch.number, epoch.labeled);
            prev = Some(epoch);
        }

        if self.unlabeled.len() as u64 != unlabeled_total {
            return Err(format!(
                "{} unlabeled events but unlabeled epochs count {}",
                self.unlabeled.len(),
                unlabeled_total
            ));
        }
        check_fifo(self.unlabeled.iter(), &labeled_of, false)?;

        for (&group, fifo) in &self.groups {
            if fifo.is_empty() {
                return Err(format!("empty FIFO kept for group {}", group));
            }
            if !ctx.is_registered(group) {
                return Err(format!("events queued for unregistered group {}", group));
            }
            if (ctx.enqueued(group) as usize) < fifo.len() {
                return Err(format!(
                    "group {} counts {} but this queue holds {}",
                    group,
                    ctx.enqueued(group),
                    fifo.len()
                ));
            }
            if !ctx.ring.contains(&ctx.groups, group) {
                return Err(format!("group {} has events but is not in the ring", group));
            }
            check_fifo(fifo.iter(), &labeled_of, true)?;
        }

        ctx.verify()
    }
}

fn check_fifo<'a, R: 'a>(
    entries: impl Iterator<Item = &'a Entry<R>>,
    labeled_of: &HashMap<u64, bool>,
    labeled: bool,
) -> Result<(), String> {
    let mut last = None;
    for entry in entries {
        match labeled_of.get(&entry.epoch()) {
            Some(&l) if l == labeled => {}
            _ => return Err(format!("entry in epoch {} has no matching epoch", entry.epoch())),
        }
        if last.map_or(false, |n| entry.epoch() < n) {
            return Err(format!("FIFO goes back to epoch {}", entry.epoch()));
        }
        last = Some(entry.epoch());
    }
    Ok(())
}

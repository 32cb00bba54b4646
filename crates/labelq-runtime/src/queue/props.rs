//! Property tests: random put/get/running sequences checked against a
//! plain model of the queue.

use super::LabeledQueue;
use crate::config::QueueConfig;
use crate::context::SchedulerContext;
use labelq_core::id::GroupId;
use labelq_core::label::{GroupSet, Labelable};
use labelq_core::traits::RunningState;
use proptest::prelude::*;

const GROUPS: usize = 4;

#[derive(Debug, Clone)]
struct Job {
    id: u32,
    group: Option<GroupId>,
}

impl Labelable for Job {
    fn affected_groups(&self) -> Option<GroupSet> {
        self.group.map(GroupSet::one)
    }
}

#[derive(Debug, Clone)]
enum Op {
    Put(Option<usize>),
    Get,
    ToggleRunning(usize),
    ToggleUnlabeled,
    ToggleActive(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => proptest::option::of(0..GROUPS).prop_map(Op::Put),
        4 => Just(Op::Get),
        1 => (0..GROUPS).prop_map(Op::ToggleRunning),
        1 => Just(Op::ToggleUnlabeled),
        1 => (0..GROUPS).prop_map(Op::ToggleActive),
    ]
}

/// Outstanding events in put order, with the epoch each must land in
struct Model {
    outstanding: Vec<(u32, u64, Option<GroupId>)>,
    tail: Option<(bool, u64)>,
    next_epoch: u64,
}

impl Model {
    fn put(&mut self, id: u32, group: Option<GroupId>) {
        let labeled = group.is_some();
        let epoch = match self.tail {
            Some((flag, n)) if flag == labeled => n,
            _ => {
                let n = self.next_epoch;
                self.next_epoch += 1;
                self.tail = Some((labeled, n));
                n
            }
        };
        self.outstanding.push((id, epoch, group));
    }

    fn take(&mut self, id: u32) -> (u64, Option<GroupId>, usize) {
        let pos = self.outstanding.iter().position(|e| e.0 == id).unwrap();
        let (_, epoch, group) = self.outstanding.remove(pos);
        if self.outstanding.is_empty() {
            self.tail = None;
        }
        (epoch, group, pos)
    }
}

fn setup() -> (SchedulerContext, LabeledQueue<Job>, Vec<GroupId>) {
    let config = QueueConfig::new().max_groups(GROUPS).check_invariants(true);
    let mut ctx = SchedulerContext::new(&config);
    let groups = (0..GROUPS).map(|_| ctx.register_group().unwrap()).collect();
    (ctx, LabeledQueue::new(&config), groups)
}

proptest! {
    #[test]
    fn random_ops_match_model(ops in proptest::collection::vec(arb_op(), 1..200)) {
        let (mut ctx, mut q, groups) = setup();
        let mut model = Model { outstanding: Vec::new(), tail: None, next_epoch: 0 };
        let mut next_id = 0u32;

        for op in ops {
            match op {
                Op::Put(idx) => {
                    let group = idx.map(|i| groups[i]);
                    q.put_event(&mut ctx, Job { id: next_id, group });
                    model.put(next_id, group);
                    next_id += 1;
                }
                Op::Get => {
                    let ready = q.has_ready_event(&ctx);
                    let min_epoch = model.outstanding.iter().map(|e| e.1).min();
                    let got = q.get_event(&mut ctx);
                    prop_assert_eq!(ready, got.is_some());

                    if let Some(entry) = got {
                        let job = entry.runnable().clone();
                        prop_assert_eq!(entry.group(), job.group);
                        prop_assert!(!ctx.unlabeled_running());
                        match job.group {
                            Some(g) => prop_assert!(!ctx.is_group_running(g)),
                            None => prop_assert!(!ctx.any_running()),
                        }

                        let head = model.outstanding.iter().position(|e| e.2 == job.group);
                        let (epoch, _, pos) = model.take(job.id);
                        prop_assert_eq!(Some(epoch), min_epoch);
                        prop_assert_eq!(entry.epoch(), epoch);
                        // FIFO within the group (or within unlabeled)
                        prop_assert_eq!(head, Some(pos));
                    }
                }
                Op::ToggleRunning(i) => {
                    let g = groups[i];
                    let running = ctx.is_group_running(g);
                    ctx.set_group_running(g, !running).unwrap();
                }
                Op::ToggleUnlabeled => {
                    let running = ctx.unlabeled_running();
                    ctx.set_unlabeled_running(!running);
                }
                Op::ToggleActive(i) => {
                    let g = groups[i];
                    let active = ctx.active_groups().contains(&g);
                    ctx.set_active(g, !active).unwrap();
                }
            }

            prop_assert!(q.verify(&ctx).is_ok());
            prop_assert_eq!(q.count(), model.outstanding.len());
            prop_assert_eq!(q.is_empty(), model.outstanding.is_empty());
        }

        // Once nothing runs, everything drains
        for &g in &groups {
            ctx.set_group_running(g, false).unwrap();
        }
        ctx.set_unlabeled_running(false);
        let mut drained = Vec::new();
        while let Some(entry) = q.get_event(&mut ctx) {
            drained.push(entry.into_runnable().id);
        }
        let mut expected: Vec<u32> = model.outstanding.iter().map(|e| e.0).collect();
        drained.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(drained, expected);
        prop_assert!(q.is_empty());
        prop_assert!(ctx.ring_order().is_empty());
        prop_assert_eq!(ctx.cursor(), None);
    }

    #[test]
    fn clear_returns_epoch_order(groups_of in proptest::collection::vec(proptest::option::of(0..GROUPS), 0..64)) {
        let (mut ctx, mut q, groups) = setup();
        let mut model = Model { outstanding: Vec::new(), tail: None, next_epoch: 0 };
        for (id, idx) in groups_of.iter().enumerate() {
            let group = idx.map(|i| groups[i]);
            q.put_event(&mut ctx, Job { id: id as u32, group });
            model.put(id as u32, group);
        }

        let cleared = q.clear(&mut ctx);
        prop_assert_eq!(cleared.len(), groups_of.len());

        let epochs: Vec<u64> = cleared
            .iter()
            .map(|j| model.outstanding.iter().find(|e| e.0 == j.id).unwrap().1)
            .collect();
        prop_assert!(epochs.windows(2).all(|w| w[0] <= w[1]));

        for &g in &groups {
            prop_assert_eq!(ctx.enqueued(g), 0);
        }
        prop_assert!(q.verify(&ctx).is_ok());
    }
}

//! Epochs: run-length encoding of labeled/unlabeled arrival order
//!
//! Consecutive events with the same labeled flag share an epoch. The
//! queue only ever serves events of the front epoch, which keeps
//! unlabeled work ordered against labeled work without ordering labeled
//! groups among themselves.

use std::collections::VecDeque;

use labelq_core::id::EpochNumber;

/// One run of equally-labeled events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch {
    pub number: EpochNumber,
    pub labeled: bool,
    /// Events of this epoch still queued
    pub count: u32,
}

/// Ordered deque of epochs
#[derive(Debug, Default)]
pub struct EpochQueue {
    epochs: VecDeque<Epoch>,
    next_number: EpochNumber,
}

impl EpochQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an event into the tail epoch, opening a new epoch when the
    /// labeled flag changes. Returns the event's epoch number.
    pub fn push_event(&mut self, labeled: bool) -> EpochNumber {
        match self.epochs.back_mut() {
            Some(tail) if tail.labeled == labeled => {
                tail.count += 1;
                tail.number
            }
            _ => {
                let number = self.next_number;
                self.next_number += 1;
                self.epochs.push_back(Epoch { number, labeled, count: 1 });
                number
            }
        }
    }

    /// Count an event out of the front epoch, dropping the epoch at zero.
    /// Returns the epoch that was retired, if any.
    pub fn pop_event(&mut self) -> Option<Epoch> {
        let front = self.epochs.front_mut()?;
        debug_assert!(front.count > 0, "empty epoch {} left in queue", front.number);
        if front.count <= 1 {
            self.epochs.pop_front()
        } else {
            front.count -= 1;
            None
        }
    }

    #[inline]
    pub fn front(&self) -> Option<&Epoch> {
        self.epochs.front()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Epoch> + '_ {
        self.epochs.iter()
    }

    /// Sum of all epoch counts
    pub fn total(&self) -> u64 {
        self.epochs.iter().map(|e| e.count as u64).sum()
    }

    /// Drop every epoch; numbering continues where it left off
    pub fn clear(&mut self) {
        self.epochs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_share_an_epoch() {
        let mut q = EpochQueue::new();
        assert_eq!(q.push_event(true), 0);
        assert_eq!(q.push_event(true), 0);
        assert_eq!(q.push_event(false), 1);
        assert_eq!(q.push_event(true), 2);

        let epochs: Vec<_> = q.iter().copied().collect();
        assert_eq!(
            epochs,
            vec![
                Epoch { number: 0, labeled: true, count: 2 },
                Epoch { number: 1, labeled: false, count: 1 },
                Epoch { number: 2, labeled: true, count: 1 },
            ]
        );
        assert_eq!(q.total(), 4);
    }

    #[test]
    fn test_pop_retires_front() {
        let mut q = EpochQueue::new();
        q.push_event(false);
        q.push_event(false);
        q.push_event(true);

        assert_eq!(q.pop_event(), None);
        assert_eq!(q.front().map(|e| e.count), Some(1));
        let retired = q.pop_event().unwrap();
        assert_eq!(retired.number, 0);
        assert!(!retired.labeled);
        assert_eq!(q.front().map(|e| e.number), Some(1));
        assert!(q.pop_event().is_some());
        assert!(q.is_empty());
        assert_eq!(q.pop_event(), None);
    }

    #[test]
    fn test_numbers_stay_monotonic_after_drain() {
        let mut q = EpochQueue::new();
        q.push_event(true);
        q.pop_event();
        assert!(q.is_empty());
        assert_eq!(q.push_event(true), 1);
        q.clear();
        assert_eq!(q.push_event(false), 2);
    }
}

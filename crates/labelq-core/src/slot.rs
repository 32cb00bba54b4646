//! Group table: arena of scheduling group records
//!
//! Each registered group owns one slot. Freed slots go on a LIFO free stack
//! and are handed out again with a bumped generation, so a stale
//! [`GroupId`] never resolves to the group that replaced it.
//!
//! A record carries the state the queue needs from a group: the running
//! flag, the number of queued events across every queue sharing the table,
//! and the intrusive ring links.

use crate::error::{QueueError, QueueResult};
use crate::id::GroupId;

/// Null slot index for ring links
pub const NIL: u32 = u32::MAX;

/// Result of counting an event in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// First queued event for the group
    NewlyQueued,
    AlreadyQueued,
}

/// Result of counting an event out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dequeued {
    /// Group has no queued events left
    NoLongerQueued,
    StillQueued,
}

/// Per-group state
#[derive(Debug, Clone)]
pub struct GroupRecord {
    generation: u32,
    live: bool,
    running: bool,
    enqueued: u32,

    /// Previous slot in the group ring, maintained by the ring
    pub prev: u32,
    /// Next slot in the group ring, maintained by the ring
    pub next: u32,
    /// Whether the ring currently links this record
    pub in_ring: bool,
}

impl GroupRecord {
    fn fresh() -> Self {
        GroupRecord {
            generation: 0,
            live: true,
            running: false,
            enqueued: 0,
            prev: NIL,
            next: NIL,
            in_ring: false,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn enqueued(&self) -> u32 {
        self.enqueued
    }
}

/// Arena of group records addressed by slot index
pub struct GroupTable {
    records: Vec<GroupRecord>,

    /// LIFO stack of free slots (for reuse)
    free_stack: Vec<u32>,

    max_groups: u32,

    live_count: u32,
}

impl GroupTable {
    pub fn new(max_groups: usize) -> Self {
        let max_groups = max_groups.min(NIL as usize) as u32;
        Self {
            records: Vec::new(),
            free_stack: Vec::new(),
            max_groups,
            live_count: 0,
        }
    }

    /// Register a new group
    ///
    /// Prefers recently freed slots; fails once `max_groups` are live.
    pub fn allocate(&mut self) -> QueueResult<GroupId> {
        if let Some(slot) = self.free_stack.pop() {
            let rec = &mut self.records[slot as usize];
            rec.generation = rec.generation.wrapping_add(1);
            rec.live = true;
            rec.running = false;
            rec.enqueued = 0;
            self.live_count += 1;
            return Ok(GroupId::new(slot, rec.generation));
        }

        let slot = self.records.len() as u32;
        if slot >= self.max_groups {
            return Err(QueueError::NoGroupSlots);
        }
        self.records.push(GroupRecord::fresh());
        self.live_count += 1;
        Ok(GroupId::new(slot, 0))
    }

    /// Retire a group and return its slot to the free stack
    ///
    /// A group with queued events is still referenced by them and cannot
    /// be retired.
    pub fn release(&mut self, id: GroupId) -> QueueResult<()> {
        let rec = self.get(id).ok_or(QueueError::UnknownGroup(id))?;
        if rec.enqueued > 0 {
            return Err(QueueError::GroupBusy { group: id, pending: rec.enqueued });
        }
        debug_assert!(!rec.in_ring, "idle group still linked in ring");

        let rec = &mut self.records[id.as_usize()];
        rec.live = false;
        rec.running = false;
        self.free_stack.push(id.slot());
        self.live_count -= 1;
        Ok(())
    }

    /// Look up a live record by id
    #[inline]
    pub fn get(&self, id: GroupId) -> Option<&GroupRecord> {
        self.records
            .get(id.as_usize())
            .filter(|rec| rec.live && rec.generation == id.generation())
    }

    #[inline]
    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut GroupRecord> {
        self.records
            .get_mut(id.as_usize())
            .filter(|rec| rec.live && rec.generation == id.generation())
    }

    #[inline]
    pub fn is_live(&self, id: GroupId) -> bool {
        self.get(id).is_some()
    }

    /// Record at a raw slot index, for ring traversal
    ///
    /// # Panics
    ///
    /// Panics if `slot` was never allocated.
    #[inline]
    pub fn slot(&self, slot: u32) -> &GroupRecord {
        &self.records[slot as usize]
    }

    #[inline]
    pub fn slot_mut(&mut self, slot: u32) -> &mut GroupRecord {
        &mut self.records[slot as usize]
    }

    /// Current id of the group occupying `slot`
    #[inline]
    pub fn id_at(&self, slot: u32) -> GroupId {
        GroupId::new(slot, self.records[slot as usize].generation)
    }

    /// Count one queued event in for `id`
    pub fn enqueue(&mut self, id: GroupId) -> QueueResult<Enqueued> {
        let rec = self.get_mut(id).ok_or(QueueError::UnknownGroup(id))?;
        rec.enqueued += 1;
        Ok(if rec.enqueued == 1 {
            Enqueued::NewlyQueued
        } else {
            Enqueued::AlreadyQueued
        })
    }

    /// Count one queued event out for `id`
    pub fn dequeue(&mut self, id: GroupId) -> QueueResult<Dequeued> {
        let rec = self.get_mut(id).ok_or(QueueError::UnknownGroup(id))?;
        debug_assert!(rec.enqueued > 0, "dequeue on group with no queued events");
        rec.enqueued = rec.enqueued.saturating_sub(1);
        Ok(if rec.enqueued == 0 {
            Dequeued::NoLongerQueued
        } else {
            Dequeued::StillQueued
        })
    }

    pub fn set_running(&mut self, id: GroupId, running: bool) -> QueueResult<()> {
        let rec = self.get_mut(id).ok_or(QueueError::UnknownGroup(id))?;
        rec.running = running;
        Ok(())
    }

    /// Running flag; unknown groups read as not running
    #[inline]
    pub fn is_running(&self, id: GroupId) -> bool {
        self.get(id).map_or(false, |rec| rec.running)
    }

    /// Number of live groups
    #[inline]
    pub fn live_count(&self) -> u32 {
        self.live_count
    }

    pub fn free_stack_size(&self) -> usize {
        self.free_stack.len()
    }

    /// Ids of every live group, in slot order
    pub fn live_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, rec)| rec.live)
            .map(|(slot, rec)| GroupId::new(slot as u32, rec.generation))
    }
}

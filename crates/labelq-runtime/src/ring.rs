//! Group ring: groups with queued events, in round-robin order
//!
//! The ring is a doubly-linked list threaded through the `prev`/`next`
//! fields of the [`GroupTable`] records. It is stored linearly with a head
//! and a tail; stepping past the tail wraps to the head, which makes it
//! behave as a circle for the scan.
//!
//! ```text
//!   head                      tail
//!    │                          │
//!    ▼                          ▼
//!  ┌────┐ next ┌────┐ next ┌────┐
//!  │ g3 │─────▶│ g0 │─────▶│ g7 │──┐ wraps to head
//!  │    │◀─────│    │◀─────│    │  │
//!  └────┘ prev └────┘ prev └────┘  │
//!    ▲─────────────────────────────┘
//! ```
//!
//! All methods take the table explicitly; the ring itself only owns the
//! endpoints and the length.

use labelq_core::id::GroupId;
use labelq_core::slot::{GroupTable, NIL};

#[derive(Debug)]
pub struct GroupRing {
    head: u32,
    tail: u32,
    len: usize,
}

impl GroupRing {
    pub const fn new() -> Self {
        GroupRing { head: NIL, tail: NIL, len: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `id` is a live group linked into the ring
    #[inline]
    pub fn contains(&self, table: &GroupTable, id: GroupId) -> bool {
        table.get(id).map_or(false, |rec| rec.in_ring)
    }

    /// Link `id` at the tail
    pub fn push_back(&mut self, table: &mut GroupTable, id: GroupId) {
        debug_assert!(table.is_live(id), "linking dead group {}", id);
        debug_assert!(!self.contains(table, id), "group {} already in ring", id);

        let slot = id.slot();
        let old_tail = self.tail;
        {
            let rec = table.slot_mut(slot);
            rec.prev = old_tail;
            rec.next = NIL;
            rec.in_ring = true;
        }
        if old_tail == NIL {
            self.head = slot;
        } else {
            table.slot_mut(old_tail).next = slot;
        }
        self.tail = slot;
        self.len += 1;
    }

    /// Link `id` immediately before `anchor`
    pub fn insert_before(&mut self, table: &mut GroupTable, anchor: GroupId, id: GroupId) {
        debug_assert!(self.contains(table, anchor), "anchor {} not in ring", anchor);
        debug_assert!(!self.contains(table, id), "group {} already in ring", id);
        debug_assert_ne!(anchor, id);

        let slot = id.slot();
        let anchor_slot = anchor.slot();
        let before = table.slot(anchor_slot).prev;
        {
            let rec = table.slot_mut(slot);
            rec.prev = before;
            rec.next = anchor_slot;
            rec.in_ring = true;
        }
        table.slot_mut(anchor_slot).prev = slot;
        if before == NIL {
            self.head = slot;
        } else {
            table.slot_mut(before).next = slot;
        }
        self.len += 1;
    }

    /// Unlink `id`; a group that is not linked is left alone
    pub fn remove(&mut self, table: &mut GroupTable, id: GroupId) {
        if !self.contains(table, id) {
            return;
        }
        let slot = id.slot();
        let (prev, next) = {
            let rec = table.slot_mut(slot);
            let links = (rec.prev, rec.next);
            rec.prev = NIL;
            rec.next = NIL;
            rec.in_ring = false;
            links
        };
        if prev == NIL {
            self.head = next;
        } else {
            table.slot_mut(prev).next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            table.slot_mut(next).prev = prev;
        }
        self.len -= 1;
    }

    /// Group after `id` in ring order, wrapping from the tail to the head
    ///
    /// For a single-member ring this is `id` itself.
    pub fn next_wrapping(&self, table: &GroupTable, id: GroupId) -> GroupId {
        debug_assert!(self.contains(table, id), "group {} not in ring", id);
        let next = table.slot(id.slot()).next;
        table.id_at(if next == NIL { self.head } else { next })
    }

    /// Groups from head to tail
    pub fn iter<'a>(&'a self, table: &'a GroupTable) -> RingIter<'a> {
        RingIter { table, at: self.head }
    }

    /// Walk the links and compare with the recorded endpoints and length
    pub fn verify(&self, table: &GroupTable) -> Result<(), String> {
        let mut count = 0usize;
        let mut prev = NIL;
        let mut at = self.head;
        while at != NIL {
            let rec = table.slot(at);
            if !rec.in_ring {
                return Err(format!("slot {} linked but not flagged in_ring", at));
            }
            if rec.prev != prev {
                return Err(format!("slot {} has prev {} expected {}", at, rec.prev, prev));
            }
            count += 1;
            if count > self.len {
                return Err(format!("ring longer than recorded length {}", self.len));
            }
            prev = at;
            at = rec.next;
        }
        if prev != self.tail {
            return Err(format!("ring tail {} but walk ended at {}", self.tail, prev));
        }
        if count != self.len {
            return Err(format!("ring walk found {} groups, length says {}", count, self.len));
        }
        Ok(())
    }
}

impl Default for GroupRing {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RingIter<'a> {
    table: &'a GroupTable,
    at: u32,
}

impl<'a> Iterator for RingIter<'a> {
    type Item = GroupId;

    fn next(&mut self) -> Option<GroupId> {
        if self.at == NIL {
            return None;
        }
        let id = self.table.id_at(self.at);
        self.at = self.table.slot(self.at).next;
        Some(id)
    }
}

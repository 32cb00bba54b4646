//! Scheduling group identifier type

use core::fmt;

/// Identifier for a scheduling group
///
/// A group id names a slot in the [`GroupTable`](crate::slot::GroupTable)
/// arena together with the generation the slot had when the group was
/// registered. Slots are recycled, so two ids with the same slot but
/// different generations refer to different groups.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId {
    slot: u32,
    generation: u32,
}

impl GroupId {
    /// Sentinel value indicating no group
    pub const NONE: GroupId = GroupId { slot: u32::MAX, generation: 0 };

    /// Create a group id from a slot index and generation
    #[inline]
    pub const fn new(slot: u32, generation: u32) -> Self {
        GroupId { slot, generation }
    }

    /// Slot index in the group table
    #[inline]
    pub const fn slot(self) -> u32 {
        self.slot
    }

    /// Get slot as usize for indexing
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.slot as usize
    }

    /// Generation of the slot when this id was handed out
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Check if this is the NONE sentinel
    #[inline]
    pub const fn is_none(self) -> bool {
        self.slot == u32::MAX
    }

    /// Check if this is a real group id
    #[inline]
    pub const fn is_some(self) -> bool {
        self.slot != u32::MAX
    }

    /// Convert to Option
    #[inline]
    pub const fn to_option(self) -> Option<GroupId> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "GroupId(NONE)")
        } else {
            write!(f, "GroupId({}v{})", self.slot, self.generation)
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "g{}.{}", self.slot, self.generation)
        }
    }
}

impl Default for GroupId {
    fn default() -> Self {
        GroupId::NONE
    }
}

/// Monotonic epoch number
///
/// Epochs are numbered per queue, starting at 0 for the first epoch a
/// queue ever creates.
pub type EpochNumber = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id_basics() {
        let id = GroupId::new(42, 3);
        assert_eq!(id.slot(), 42);
        assert_eq!(id.as_usize(), 42);
        assert_eq!(id.generation(), 3);
        assert!(id.is_some());
        assert!(!id.is_none());
    }

    #[test]
    fn test_group_id_none() {
        let none = GroupId::NONE;
        assert!(none.is_none());
        assert_eq!(none.to_option(), None);
        assert_eq!(GroupId::default(), GroupId::NONE);
    }

    #[test]
    fn test_generation_distinguishes() {
        assert_ne!(GroupId::new(1, 0), GroupId::new(1, 1));
        assert_eq!(format!("{}", GroupId::new(7, 2)), "g7.2");
        assert_eq!(format!("{:?}", GroupId::NONE), "GroupId(NONE)");
    }
}

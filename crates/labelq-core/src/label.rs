//! Labels: which scheduling groups a runnable touches
//!
//! A runnable is classified once, when it is enqueued:
//!
//! - no groups: [`Label::Unlabeled`], globally exclusive
//! - one group: [`Label::Group`], queued on that group's FIFO
//! - several groups: [`Label::Affects`], queued with unlabeled work but
//!   only excluded by the groups it names

use crate::id::GroupId;
use core::fmt;

/// Sorted, deduplicated set of group ids
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupSet {
    groups: Vec<GroupId>,
}

impl GroupSet {
    /// Empty set
    pub const fn new() -> Self {
        GroupSet { groups: Vec::new() }
    }

    /// Set containing a single group
    pub fn one(group: GroupId) -> Self {
        GroupSet { groups: vec![group] }
    }

    /// Insert a group, keeping the set sorted. Returns false if present.
    pub fn insert(&mut self, group: GroupId) -> bool {
        match self.groups.binary_search(&group) {
            Ok(_) => false,
            Err(pos) => {
                self.groups.insert(pos, group);
                true
            }
        }
    }

    pub fn contains(&self, group: GroupId) -> bool {
        self.groups.binary_search(&group).is_ok()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.iter().copied()
    }

    /// Groups in ascending id order
    pub fn as_slice(&self) -> &[GroupId] {
        &self.groups
    }
}

impl FromIterator<GroupId> for GroupSet {
    fn from_iter<I: IntoIterator<Item = GroupId>>(iter: I) -> Self {
        let mut groups: Vec<GroupId> = iter.into_iter().filter(|g| g.is_some()).collect();
        groups.sort_unstable();
        groups.dedup();
        GroupSet { groups }
    }
}

impl From<GroupId> for GroupSet {
    fn from(group: GroupId) -> Self {
        GroupSet::one(group)
    }
}

impl fmt::Debug for GroupSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.groups.iter()).finish()
    }
}

/// Resolved label of an enqueued runnable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// Touches no known group; runs only when nothing else runs
    Unlabeled,

    /// Owned by exactly one group
    Group(GroupId),

    /// Touches several groups; none of them may be running
    Affects(GroupSet),
}

impl Label {
    /// Classify the result of an affected-groups query
    pub fn classify(groups: Option<GroupSet>) -> Label {
        match groups {
            None => Label::Unlabeled,
            Some(set) => match set.len() {
                0 => Label::Unlabeled,
                1 => Label::Group(set.as_slice()[0]),
                _ => Label::Affects(set),
            },
        }
    }

    /// Group whose FIFO owns the runnable, if any
    #[inline]
    pub fn owner(&self) -> Option<GroupId> {
        match self {
            Label::Group(group) => Some(*group),
            _ => None,
        }
    }

    /// True if the runnable goes to a group FIFO and a labeled epoch
    #[inline]
    pub fn is_labeled(&self) -> bool {
        matches!(self, Label::Group(_))
    }

    /// Every group this label marks as running while it executes
    pub fn groups(&self) -> &[GroupId] {
        match self {
            Label::Unlabeled => &[],
            Label::Group(group) => core::slice::from_ref(group),
            Label::Affects(set) => set.as_slice(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Unlabeled => write!(f, "unlabeled"),
            Label::Group(group) => write!(f, "{}", group),
            Label::Affects(set) => {
                write!(f, "affects[")?;
                for (i, group) in set.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", group)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Capability query for runnables placed on a labeled queue
///
/// The default implementation describes unlabeled work.
pub trait Labelable {
    /// Groups the runnable touches. `None` or an empty set means unlabeled.
    fn affected_groups(&self) -> Option<GroupSet> {
        None
    }

    /// Resolve the label stored alongside the queued runnable
    fn label(&self) -> Label {
        Label::classify(self.affected_groups())
    }
}

impl<T: Labelable + ?Sized> Labelable for Box<T> {
    fn affected_groups(&self) -> Option<GroupSet> {
        (**self).affected_groups()
    }
}

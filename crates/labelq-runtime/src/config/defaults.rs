//! Compile-time defaults for [`QueueConfig`](super::QueueConfig)

/// Maximum number of live scheduling groups
pub const MAX_GROUPS: usize = 4096;

/// Starvation credit granted per promoted active group: one turn for the
/// active group and one for the group after it
pub const PROMOTION_CREDIT: i32 = 2;

/// Initial capacity of the unlabeled FIFO
pub const UNLABELED_CAPACITY: usize = 64;

/// Initial capacity of each per-group FIFO
pub const GROUP_QUEUE_CAPACITY: usize = 8;

cfg_if::cfg_if! {
    if #[cfg(any(debug_assertions, feature = "debug-assertions"))] {
        /// Full consistency sweep after every mutation
        pub const CHECK_INVARIANTS: bool = true;
    } else {
        pub const CHECK_INVARIANTS: bool = false;
    }
}

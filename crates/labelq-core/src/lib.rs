//! # labelq-core
//!
//! Core types and traits for the labeled event queue.
//!
//! This crate holds everything the queue shares with its collaborators and
//! nothing of the queue itself; the queue lives in `labelq-runtime`.
//!
//! ## Modules
//!
//! - `id` - Group identifier and epoch number types
//! - `label` - Labels, group sets and the `Labelable` capability
//! - `slot` - Group table (arena of group records with ring links)
//! - `traits` - Running state interface for the readiness oracle
//! - `error` - Error types
//! - `spinlock` - Spinlock used as the queue's external lock
//! - `kprint` - Kernel-style leveled logging macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod label;
pub mod slot;
pub mod traits;
pub mod error;
pub mod spinlock;
pub mod kprint;
pub mod env;

pub use id::{EpochNumber, GroupId};
pub use label::{GroupSet, Label, Labelable};
pub use slot::{Dequeued, Enqueued, GroupRecord, GroupTable};
pub use traits::{Idle, RunningState};
pub use error::{QueueError, QueueResult};
pub use spinlock::{SpinLock, SpinLockGuard};
pub use env::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

cfg_if::cfg_if! {
    if #[cfg(any(debug_assertions, feature = "debug-assertions"))] {
        /// Contract checks are compiled in
        pub const CONTRACT_CHECKS: bool = true;

        /// Assert a caller contract; fatal when contract checks are compiled in
        #[macro_export]
        macro_rules! contract_assert {
            ($($arg:tt)*) => { assert!($($arg)*) };
        }
    } else {
        pub const CONTRACT_CHECKS: bool = false;

        #[macro_export]
        macro_rules! contract_assert {
            ($($arg:tt)*) => {{
                if false {
                    assert!($($arg)*);
                }
            }};
        }
    }
}

//! # labelq-runtime
//!
//! The labeled event queue and the scheduler context it shares with its
//! sibling queues.
//!
//! This crate provides:
//! - Epoch bookkeeping (labeled/unlabeled arrival order)
//! - The group ring with its round-robin cursor
//! - The readiness oracle
//! - The active-group prioritizer with its starvation credit
//! - `LabeledQueue`: put/get/is_empty/count/has_ready_event
//!
//! Nothing here locks. Callers serialize every call on a queue and its
//! context behind one external lock (see the `labelq` crate).

pub mod config;
pub mod ring;
pub mod epoch;
pub mod readiness;
pub mod context;
pub mod prioritizer;
pub mod queue;

// Re-exports
pub use config::{ConfigError, QueueConfig};
pub use context::{RunTicket, SchedulerContext};
pub use queue::{Entry, LabeledQueue, QueueStats};
pub use readiness::is_ready_to_run;

//! Queue Manager module
//!
//! Owns the shared queue and bonus ledger behind one exclusive lock.

mod queue_manager;

pub use queue_manager::{Accrual, QueueManager};

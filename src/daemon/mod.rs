//! Daemon Core - periodic loops and their bookkeeping
//!
//! The daemon is the long-running side of the engine:
//! - Accrues queue points on the accrual interval
//! - Checks the target and admits the head on the admission interval
//! - Broadcasts queue status on the status interval

pub mod runner;
pub mod tick;

pub use runner::*;
pub use tick::*;

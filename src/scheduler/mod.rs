//! Periodic processes that drive the admission queue.
//!
//! This module provides:
//! - **PriorityScheduler**: accrues queue points and sends leaderboards.
//! - **AdmissionController**: probes downstream capacity and admits the head.
//! - **StatusNotifier**: pushes each waiting player their points and position.
//! - **ProbeHealth**: tracks consecutive probe failures for staleness warnings.
//!
//! Each process exposes a synchronous or async `tick()`; the daemon decides
//! when ticks happen. All of them act on the shared [`QueueManager`], whose
//! lock serializes their mutations.
//!
//! [`QueueManager`]: crate::manager::QueueManager

mod accrual;
mod admission;
mod probe_health;
mod status;

pub use accrual::{
    AccrualConfig, AccrualOutcome, LEADERBOARD_EVERY, LEADERBOARD_SIZE, POINTS_PER_TICK, PriorityScheduler,
    send_leaderboard,
};
pub use admission::{AdmissionController, AdmissionOutcome, DEFAULT_PROBE_TIMEOUT};
pub use probe_health::{DEFAULT_WARN_AFTER, ProbeHealth};
pub use status::StatusNotifier;

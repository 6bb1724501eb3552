//! Admitq - a priority-queue admission engine
//!
//! Players wait in a queue ranked by accrued queue points plus a persistent
//! bonus. Periodic loops accrue points, admit the top-ranked player when the
//! downstream target has a free slot, and broadcast queue status.

pub mod commands;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod downstream;
pub mod error;
pub mod id;
pub mod manager;
pub mod notify;
pub mod queue;
pub mod scheduler;
pub mod storage;

pub use error::{QueueError, Result};

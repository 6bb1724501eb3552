//! Domain types for the admission queue
//!
//! - QueueEntry: a waiting player with accrued queue points and join sequence
//! - RankedEntry: an entry annotated with its bonus, total, and rank
//! - PointsBreakdown / BonusUpdate / QueueInfo: read models returned to callers

pub mod entry;
pub mod points;

pub use entry::{QueueEntry, RankedEntry};
pub use points::{BonusUpdate, PointsBreakdown, QueueInfo};

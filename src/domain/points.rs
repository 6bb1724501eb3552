//! Read models returned by the command-facing operations.

use serde::{Deserialize, Serialize};

use crate::id::PlayerId;

/// Point totals for one player (`checkpoints`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsBreakdown {
    pub total: i64,
    pub queue: i64,
    pub bonus: i64,
}

impl PointsBreakdown {
    pub fn new(queue: i64, bonus: i64) -> Self {
        Self {
            total: queue.saturating_add(bonus),
            queue,
            bonus,
        }
    }
}

/// Result of a bonus mutation.
///
/// `position` is only present when the player is currently queued; the
/// caller reports the new rank in that case and the new bonus otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusUpdate {
    pub player: PlayerId,
    pub bonus: i64,
    pub position: Option<usize>,
}

/// A queued player's own view of the queue (`info`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    pub position: usize,
    pub points: PointsBreakdown,
}

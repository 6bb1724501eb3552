//! Queue entry records.

use serde::{Deserialize, Serialize};

use crate::id::PlayerId;

/// A player waiting for admission.
///
/// `queue_points` only accrue while the entry exists; leaving, disconnecting,
/// or being admitted destroys the entry, so a rejoin starts again from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub player: PlayerId,
    pub queue_points: i64,
    /// Join order; never changes while the entry is queued.
    pub sequence: u64,
}

impl QueueEntry {
    /// Create a fresh entry with zero queue points
    pub fn new(player: PlayerId, sequence: u64) -> Self {
        Self {
            player,
            queue_points: 0,
            sequence,
        }
    }

    /// Total ranking score given the player's bonus
    pub fn total(&self, bonus: i64) -> i64 {
        self.queue_points.saturating_add(bonus)
    }
}

/// An entry as seen in a ranked snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based rank under the current order
    pub rank: usize,
    pub player: PlayerId,
    pub queue_points: i64,
    pub bonus: i64,
    pub total: i64,
}

//! Point accrual.
//!
//! Each tick adds one queue point to every waiting player and re-ranks. A
//! player whose queue points reach a multiple of `leaderboard_every` is sent
//! the current top of the queue, with their own row marked.

use std::sync::Arc;

use crate::domain::RankedEntry;
use crate::id::PlayerId;
use crate::manager::QueueManager;
use crate::notify::{MessageKey, Notifier, Params, params};

/// Queue points added per accrual tick.
pub const POINTS_PER_TICK: i64 = 1;
/// Accruals between leaderboard broadcasts to a player.
pub const LEADERBOARD_EVERY: i64 = 10;
/// Rows in a leaderboard broadcast.
pub const LEADERBOARD_SIZE: usize = 5;

/// Accrual configuration.
#[derive(Debug, Clone)]
pub struct AccrualConfig {
    pub leaderboard_every: i64,
    pub leaderboard_size: usize,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            leaderboard_every: LEADERBOARD_EVERY,
            leaderboard_size: LEADERBOARD_SIZE,
        }
    }
}

/// What one accrual tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccrualOutcome {
    /// Entries that received points
    pub accrued: usize,
    /// Players sent a leaderboard
    pub leaderboards: usize,
}

/// Periodic process that advances queue points.
pub struct PriorityScheduler {
    manager: Arc<QueueManager>,
    notifier: Arc<dyn Notifier>,
    config: AccrualConfig,
}

impl PriorityScheduler {
    pub fn new(manager: Arc<QueueManager>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            manager,
            notifier,
            config: AccrualConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AccrualConfig) -> Self {
        self.config = config;
        self
    }

    /// Accrue once and send any leaderboards that came due.
    pub fn tick(&self) -> AccrualOutcome {
        let accrual = self
            .manager
            .accrue_all(POINTS_PER_TICK, self.config.leaderboard_size);

        let mut leaderboards = 0;
        for (idx, entry) in accrual.entries.iter().enumerate() {
            if self.leaderboard_due(entry.queue_points) {
                send_leaderboard(self.notifier.as_ref(), entry.player, idx + 1, &accrual.leaders);
                leaderboards += 1;
            }
        }

        if leaderboards > 0 {
            log::debug!("Sent {} leaderboards to {} queued players", leaderboards, accrual.entries.len());
        }

        AccrualOutcome {
            accrued: accrual.entries.len(),
            leaderboards,
        }
    }

    fn leaderboard_due(&self, queue_points: i64) -> bool {
        let every = self.config.leaderboard_every.max(1);
        queue_points > 0 && queue_points % every == 0
    }
}

/// Send `viewer` a header, one row per leader, and their own position.
pub fn send_leaderboard(notifier: &dyn Notifier, viewer: PlayerId, position: usize, leaders: &[RankedEntry]) {
    notifier.notify(viewer, MessageKey::StatusHeader, Params::new());
    for row in leaders {
        notifier.notify(
            viewer,
            MessageKey::StatusPlayerEntry,
            params([
                ("position", row.rank.to_string()),
                ("username", row.player.to_string()),
                ("points", row.total.to_string()),
                ("current", (row.player == viewer).to_string()),
            ]),
        );
    }
    notifier.notify(viewer, MessageKey::StatusPosition, params([("position", position)]));
}

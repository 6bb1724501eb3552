//! Periodic queue status for every waiting player.

use std::sync::Arc;

use crate::manager::QueueManager;
use crate::notify::{MessageKey, Notifier, params};

/// Pushes each queued player their points and position.
pub struct StatusNotifier {
    manager: Arc<QueueManager>,
    notifier: Arc<dyn Notifier>,
}

impl StatusNotifier {
    pub fn new(manager: Arc<QueueManager>, notifier: Arc<dyn Notifier>) -> Self {
        Self { manager, notifier }
    }

    /// Send one status round. Returns the number of players notified.
    pub fn tick(&self) -> usize {
        let mut sent = 0;
        for row in self.manager.snapshot(usize::MAX) {
            self.notifier.notify(row.player, MessageKey::StatusQueuePoints, params([("points", row.queue_points)]));
            self.notifier.notify(row.player, MessageKey::StatusBonusPoints, params([("points", row.bonus)]));
            self.notifier.notify(row.player, MessageKey::StatusTotalPoints, params([("points", row.total)]));
            self.notifier.notify(row.player, MessageKey::StatusPosition, params([("position", row.rank)]));
            sent += 1;
        }
        sent
    }
}

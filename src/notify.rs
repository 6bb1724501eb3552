//! Player notifications.
//!
//! The engine never renders text. It hands the host a semantic message key and
//! a parameter map; templating and delivery belong to the [`Notifier`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::id::PlayerId;

/// Template parameters, e.g. `{"points": "12"}`
pub type Params = BTreeMap<String, String>;

/// Semantic message keys, named after the message template paths hosts use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Leaderboard header
    StatusHeader,
    /// `points`
    StatusQueuePoints,
    /// `points`
    StatusBonusPoints,
    /// `points`
    StatusTotalPoints,
    /// `position`
    StatusPosition,
    /// `position`, `username`, `points`, `current`
    StatusPlayerEntry,
    /// Sent to the head player when the target has no free slot
    ServerFull,
    /// Sent to an admitted player once the connect action was dispatched
    ConnectSuccess,
}

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::StatusHeader => "queue-status.header",
            MessageKey::StatusQueuePoints => "queue-status.queue-points",
            MessageKey::StatusBonusPoints => "queue-status.bonus-points",
            MessageKey::StatusTotalPoints => "queue-status.total-points",
            MessageKey::StatusPosition => "queue-status.position",
            MessageKey::StatusPlayerEntry => "queue-status.player-entry",
            MessageKey::ServerFull => "server-connection.server-full",
            MessageKey::ConnectSuccess => "server-connection.success",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a parameter map from string pairs
pub fn params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Params
where
    K: Into<String>,
    V: ToString,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())).collect()
}

/// Fire-and-forget message sink
pub trait Notifier: Send + Sync {
    fn notify(&self, player: PlayerId, key: MessageKey, params: Params);
}

/// Writes every notification to the log. Used by the CLI simulation.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, player: PlayerId, key: MessageKey, params: Params) {
        tracing::info!(player = %player.short(), key = %key, params = ?params, "notify");
    }
}

/// A delivered notification, as captured by [`MemoryNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub player: PlayerId,
    pub key: MessageKey,
    pub params: Params,
}

/// Keeps notifications in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything captured so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Captured notifications for one player and key
    pub fn for_player(&self, player: &PlayerId, key: MessageKey) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|n| n.player == *player && n.key == key)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, player: PlayerId, key: MessageKey, params: Params) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification { player, key, params });
    }
}

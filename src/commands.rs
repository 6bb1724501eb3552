//! Command-facing surface.
//!
//! Hosts address players by display name; the engine works in ids. A
//! [`SessionResolver`] bridges the two, and [`CommandSurface`] exposes the
//! queue and bonus operations by name, failing with
//! [`QueueError::UnknownPlayer`] when a name has no live session.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::{BonusUpdate, PointsBreakdown, QueueEntry, QueueInfo};
use crate::error::{QueueError, Result};
use crate::id::PlayerId;
use crate::manager::QueueManager;

/// Maps a display name to the id of a connected player
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<PlayerId>;
}

/// Name lookup over the players currently connected. Names match
/// case-insensitively.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<String, PlayerId>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, name: &str, player: PlayerId) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_lowercase(), player);
    }

    pub fn disconnect(&self, name: &str) -> Option<PlayerId> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&name.to_lowercase())
    }
}

impl SessionResolver for SessionTable {
    fn resolve(&self, name: &str) -> Option<PlayerId> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_lowercase())
            .copied()
    }
}

/// Queue and bonus operations addressed by player name
pub struct CommandSurface {
    manager: Arc<QueueManager>,
    resolver: Arc<dyn SessionResolver>,
}

impl CommandSurface {
    pub fn new(manager: Arc<QueueManager>, resolver: Arc<dyn SessionResolver>) -> Self {
        Self { manager, resolver }
    }

    fn resolve(&self, name: &str) -> Result<PlayerId> {
        self.resolver
            .resolve(name)
            .ok_or_else(|| QueueError::UnknownPlayer(name.to_string()))
    }

    pub fn join(&self, name: &str) -> Result<usize> {
        let player = self.resolve(name)?;
        self.manager.join(player)
    }

    pub fn leave(&self, name: &str) -> Result<QueueEntry> {
        let player = self.resolve(name)?;
        self.manager.leave(&player)
    }

    pub fn info(&self, name: &str) -> Result<QueueInfo> {
        let player = self.resolve(name)?;
        self.manager.info(&player)
    }

    pub fn check_points(&self, name: &str) -> Result<PointsBreakdown> {
        let player = self.resolve(name)?;
        Ok(self.manager.check_points(&player))
    }

    pub fn set_points(&self, name: &str, value: i64) -> Result<BonusUpdate> {
        let player = self.resolve(name)?;
        self.manager.set_bonus(player, value)
    }

    pub fn add_points(&self, name: &str, amount: i64) -> Result<BonusUpdate> {
        let player = self.resolve(name)?;
        self.manager.add_bonus(player, amount)
    }

    pub fn remove_points(&self, name: &str, amount: i64) -> Result<BonusUpdate> {
        let player = self.resolve(name)?;
        self.manager.remove_bonus(player, amount)
    }

    pub fn reset_points(&self, name: &str) -> Result<BonusUpdate> {
        let player = self.resolve(name)?;
        self.manager.reset_bonus(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LedgerStore;
    use tempfile::TempDir;

    fn setup() -> (CommandSurface, Arc<QueueManager>, Arc<SessionTable>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let manager = Arc::new(QueueManager::open(LedgerStore::new(
            temp_dir.path().join("bonus_points.json"),
        )));
        let sessions = Arc::new(SessionTable::new());
        sessions.connect("Ash", PlayerId::from_u128(1));
        sessions.connect("Misty", PlayerId::from_u128(2));
        let surface = CommandSurface::new(Arc::clone(&manager), sessions.clone());
        (surface, manager, sessions, temp_dir)
    }

    #[test]
    fn test_resolver_is_case_insensitive() {
        let sessions = SessionTable::new();
        sessions.connect("Brock", PlayerId::from_u128(3));
        assert_eq!(sessions.resolve("brock"), Some(PlayerId::from_u128(3)));
        assert_eq!(sessions.disconnect("BROCK"), Some(PlayerId::from_u128(3)));
        assert_eq!(sessions.resolve("Brock"), None);
    }

    #[test]
    fn test_join_leave_by_name() {
        let (surface, manager, _sessions, _temp) = setup();
        assert_eq!(surface.join("ash").unwrap(), 1);
        assert_eq!(surface.join("misty").unwrap(), 2);
        assert!(matches!(surface.join("ash"), Err(QueueError::AlreadyQueued(_))));

        surface.leave("ash").unwrap();
        assert_eq!(manager.head(), Some(PlayerId::from_u128(2)));
    }

    #[test]
    fn test_unknown_name() {
        let (surface, _manager, _sessions, _temp) = setup();
        let err = surface.check_points("gary").unwrap_err();
        assert!(matches!(err, QueueError::UnknownPlayer(ref name) if name == "gary"));
        assert!(surface.set_points("gary", 5).is_err());
    }

    #[test]
    fn test_check_points_for_unqueued_player() {
        let (surface, _manager, _sessions, _temp) = setup();
        surface.set_points("misty", 7).unwrap();
        let points = surface.check_points("misty").unwrap();
        assert_eq!(points, PointsBreakdown::new(0, 7));
    }

    #[test]
    fn test_points_commands_reorder_queued_player() {
        let (surface, manager, _sessions, _temp) = setup();
        surface.join("ash").unwrap();
        surface.join("misty").unwrap();
        manager.accrue_all(1, 5);

        let update = surface.add_points("misty", 5).unwrap();
        assert_eq!(update.position, Some(1));
        assert_eq!(update.bonus, 5);

        let update = surface.remove_points("misty", 10).unwrap();
        assert_eq!(update.bonus, 0);
        assert_eq!(update.position, Some(2));

        let info = surface.info("ash").unwrap();
        assert_eq!(info.position, 1);
        assert_eq!(info.points.queue, 1);
    }

    #[test]
    fn test_reset_points() {
        let (surface, manager, _sessions, _temp) = setup();
        surface.set_points("ash", 4).unwrap();
        let update = surface.reset_points("ash").unwrap();
        assert_eq!(update.bonus, 0);
        assert!(manager.bonus_entries().is_empty());
    }

    #[test]
    fn test_disconnected_player_cannot_be_resolved() {
        let (surface, _manager, sessions, _temp) = setup();
        sessions.disconnect("Ash");
        assert!(matches!(surface.info("ash"), Err(QueueError::UnknownPlayer(_))));
    }
}

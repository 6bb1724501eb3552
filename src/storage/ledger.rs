//! In-memory bonus ledger.

use std::collections::{BTreeMap, HashMap};

use crate::error::{QueueError, Result};
use crate::id::PlayerId;
use crate::queue::BonusLookup;

/// Mapping player -> bonus points, independent of queue membership.
///
/// Every mutation bumps `revision` and returns a [`LedgerWrite`] holding a full
/// copy of the map at that revision, ready to be handed to
/// [`LedgerStore::commit`](super::LedgerStore::commit).
#[derive(Debug, Clone, Default)]
pub struct BonusLedger {
    points: HashMap<PlayerId, i64>,
    revision: u64,
}

/// Full serialized state of the ledger at one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerWrite {
    pub revision: u64,
    pub points: BTreeMap<String, i64>,
}

impl BonusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_points(points: HashMap<PlayerId, i64>) -> Self {
        Self { points, revision: 0 }
    }

    /// Bonus for a player, 0 when unknown
    pub fn get(&self, player: &PlayerId) -> i64 {
        self.points.get(player).copied().unwrap_or(0)
    }

    /// Current mutation revision; 0 for a freshly loaded ledger
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Players with a stored bonus, in id order
    pub fn entries(&self) -> Vec<(PlayerId, i64)> {
        let mut entries: Vec<(PlayerId, i64)> = self.points.iter().map(|(p, v)| (*p, *v)).collect();
        entries.sort();
        entries
    }

    /// Overwrite a player's bonus. Negative values are rejected.
    pub fn set(&mut self, player: PlayerId, value: i64) -> Result<LedgerWrite> {
        if value < 0 {
            return Err(QueueError::NegativeBonus(value));
        }
        Ok(self.store(player, value))
    }

    /// Add `amount` (any sign) with no floor.
    ///
    /// A large negative amount can leave the stored value below zero; only
    /// [`remove`](Self::remove) clamps.
    pub fn add(&mut self, player: PlayerId, amount: i64) -> LedgerWrite {
        let value = self.get(&player).saturating_add(amount);
        self.store(player, value)
    }

    /// Subtract `amount`, never going below zero.
    pub fn remove(&mut self, player: PlayerId, amount: i64) -> LedgerWrite {
        let value = self.get(&player).saturating_sub(amount).max(0);
        self.store(player, value)
    }

    /// Drop a player's bonus entirely.
    pub fn reset(&mut self, player: &PlayerId) -> LedgerWrite {
        self.points.remove(player);
        self.bump()
    }

    /// Copy of the current state for persistence
    pub fn snapshot(&self) -> LedgerWrite {
        LedgerWrite {
            revision: self.revision,
            points: self.points.iter().map(|(p, v)| (p.to_string(), *v)).collect(),
        }
    }

    fn store(&mut self, player: PlayerId, value: i64) -> LedgerWrite {
        self.points.insert(player, value);
        self.bump()
    }

    fn bump(&mut self) -> LedgerWrite {
        self.revision += 1;
        self.snapshot()
    }
}

impl BonusLookup for BonusLedger {
    fn bonus(&self, player: &PlayerId) -> i64 {
        self.get(player)
    }
}

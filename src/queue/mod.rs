//! The ordered admission queue.
//!
//! Entries are kept sorted by `(-total, sequence)` where
//! `total = queue_points + bonus`. Bonus values live outside the queue (in the
//! ledger), so every operation that can change a total takes a [`BonusLookup`]
//! and re-ranks before returning. `sequence` is assigned at join time and never
//! changes, so equal totals always keep join order no matter how many times
//! the queue is re-ranked.

mod snapshot;

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::domain::{QueueEntry, RankedEntry};
use crate::error::{QueueError, Result};
use crate::id::PlayerId;

pub use snapshot::Snapshot;

/// Source of bonus points used as ranking input.
pub trait BonusLookup {
    /// Bonus for a player; unknown players have 0.
    fn bonus(&self, player: &PlayerId) -> i64;
}

impl BonusLookup for HashMap<PlayerId, i64> {
    fn bonus(&self, player: &PlayerId) -> i64 {
        self.get(player).copied().unwrap_or(0)
    }
}

/// In-memory ordered collection of waiting players, unique by player id.
#[derive(Debug, Default)]
pub struct Queue {
    entries: Vec<QueueEntry>,
    next_sequence: u64,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.index_of(player).is_some()
    }

    /// Entry for a queued player
    pub fn entry(&self, player: &PlayerId) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.player == *player)
    }

    /// Entries in rank order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Queued players in rank order
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.entries.iter().map(|e| e.player)
    }

    /// Add a player with zero queue points and the next join sequence.
    ///
    /// Returns the player's 1-based position after re-ranking.
    pub fn join(&mut self, player: PlayerId, bonus: &impl BonusLookup) -> Result<usize> {
        if self.contains(&player) {
            return Err(QueueError::AlreadyQueued(player));
        }

        self.next_sequence += 1;
        self.entries.push(QueueEntry::new(player, self.next_sequence));
        self.rerank(bonus);
        self.position(&player)
    }

    /// Remove a player's entry, discarding its queue points.
    ///
    /// Removing from a sorted sequence keeps it sorted, so no re-rank is needed.
    pub fn leave(&mut self, player: &PlayerId) -> Result<QueueEntry> {
        let idx = self.index_of(player).ok_or(QueueError::NotQueued(*player))?;
        Ok(self.entries.remove(idx))
    }

    /// 1-based rank under the current order
    pub fn position(&self, player: &PlayerId) -> Result<usize> {
        self.index_of(player)
            .map(|idx| idx + 1)
            .ok_or(QueueError::NotQueued(*player))
    }

    /// The player ranked first, if any
    pub fn head(&self) -> Option<PlayerId> {
        self.entries.first().map(|e| e.player)
    }

    /// Up to `limit` ranked rows in current order.
    pub fn snapshot(&self, limit: usize, bonus: &impl BonusLookup) -> Snapshot {
        let rows = self
            .entries
            .iter()
            .take(limit)
            .enumerate()
            .map(|(idx, entry)| {
                let bonus = bonus.bonus(&entry.player);
                RankedEntry {
                    rank: idx + 1,
                    player: entry.player,
                    queue_points: entry.queue_points,
                    bonus,
                    total: entry.total(bonus),
                }
            })
            .collect();
        Snapshot::new(rows)
    }

    /// Add `delta` queue points to every entry, then re-rank.
    pub fn accrue_all(&mut self, delta: i64, bonus: &impl BonusLookup) {
        for entry in &mut self.entries {
            entry.queue_points = entry.queue_points.saturating_add(delta);
        }
        self.rerank(bonus);
    }

    /// Re-rank after a single player's total changed (bonus mutation).
    ///
    /// Returns the player's new position.
    pub fn reorder(&mut self, player: &PlayerId, bonus: &impl BonusLookup) -> Result<usize> {
        if !self.contains(player) {
            return Err(QueueError::NotQueued(*player));
        }
        self.rerank(bonus);
        self.position(player)
    }

    fn rerank(&mut self, bonus: &impl BonusLookup) {
        // Sequences are unique, so the key is a total order and the result is
        // independent of the previous arrangement.
        self.entries
            .sort_by_cached_key(|e| (Reverse(e.total(bonus.bonus(&e.player))), e.sequence));
    }

    fn index_of(&self, player: &PlayerId) -> Option<usize> {
        self.entries.iter().position(|e| e.player == *player)
    }
}

//! Queue Manager implementation
//!
//! Every mutation of the queue or the bonus ledger goes through a single
//! `Mutex`, so joins, leaves, accrual ticks, bonus commands, and admissions
//! from independent tasks are applied one at a time in submission order. The
//! lock is never held across an `.await` or a file write: bonus mutations copy
//! the ledger under the lock and commit that copy to disk after releasing it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{BonusUpdate, PointsBreakdown, QueueEntry, QueueInfo, RankedEntry};
use crate::error::Result;
use crate::id::PlayerId;
use crate::queue::{Queue, Snapshot};
use crate::storage::{BonusLedger, LedgerStore, LedgerWrite};

#[derive(Debug)]
struct QueueState {
    queue: Queue,
    ledger: BonusLedger,
}

/// Result of one accrual step, captured under the same lock as the accrual.
#[derive(Debug, Clone, Default)]
pub struct Accrual {
    /// Every queued entry after accrual, in rank order
    pub entries: Vec<QueueEntry>,
    /// The top rows of the new order
    pub leaders: Vec<RankedEntry>,
}

/// Shared admission-queue state.
#[derive(Debug)]
pub struct QueueManager {
    state: Mutex<QueueState>,
    store: LedgerStore,
}

impl QueueManager {
    /// Load the ledger from `store` and start with an empty queue.
    pub fn open(store: LedgerStore) -> Self {
        let ledger = store.load();
        Self::with_ledger(ledger, store)
    }

    /// Start from an already loaded ledger.
    pub fn with_ledger(ledger: BonusLedger, store: LedgerStore) -> Self {
        Self {
            state: Mutex::new(QueueState {
                queue: Queue::new(),
                ledger,
            }),
            store,
        }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    // Each operation leaves the state consistent before it can panic, so a
    // poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a player. Returns the player's position.
    pub fn join(&self, player: PlayerId) -> Result<usize> {
        let mut state = self.lock();
        let QueueState { queue, ledger } = &mut *state;
        let position = queue.join(player, ledger)?;
        tracing::debug!(player = %player, position, queued = queue.len(), "Player joined queue");
        Ok(position)
    }

    /// Remove a queued player, discarding their queue points.
    pub fn leave(&self, player: &PlayerId) -> Result<QueueEntry> {
        let entry = self.lock().queue.leave(player)?;
        tracing::debug!(player = %player, queue_points = entry.queue_points, "Player left queue");
        Ok(entry)
    }

    /// Host disconnect: like `leave` but silent when the player is not queued.
    pub fn disconnect(&self, player: &PlayerId) -> bool {
        self.lock().queue.leave(player).is_ok()
    }

    pub fn position(&self, player: &PlayerId) -> Result<usize> {
        self.lock().queue.position(player)
    }

    pub fn head(&self) -> Option<PlayerId> {
        self.lock().queue.head()
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.lock().queue.contains(player)
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Up to `limit` ranked rows
    pub fn snapshot(&self, limit: usize) -> Snapshot {
        let state = self.lock();
        state.queue.snapshot(limit, &state.ledger)
    }

    /// Add `delta` queue points to everyone, re-rank, and capture the result.
    pub fn accrue_all(&self, delta: i64, leaders: usize) -> Accrual {
        let mut state = self.lock();
        let QueueState { queue, ledger } = &mut *state;
        queue.accrue_all(delta, ledger);

        Accrual {
            entries: queue.entries().to_vec(),
            leaders: queue.snapshot(leaders, ledger).collect(),
        }
    }

    /// Position and points for a queued player
    pub fn info(&self, player: &PlayerId) -> Result<QueueInfo> {
        let state = self.lock();
        let position = state.queue.position(player)?;
        let queue_points = state.queue.entry(player).map(|e| e.queue_points).unwrap_or(0);
        Ok(QueueInfo {
            position,
            points: PointsBreakdown::new(queue_points, state.ledger.get(player)),
        })
    }

    /// Total, queue, and bonus points. Queue points are 0 when not queued.
    pub fn check_points(&self, player: &PlayerId) -> PointsBreakdown {
        let state = self.lock();
        let queue_points = state.queue.entry(player).map(|e| e.queue_points).unwrap_or(0);
        PointsBreakdown::new(queue_points, state.ledger.get(player))
    }

    pub fn bonus(&self, player: &PlayerId) -> i64 {
        self.lock().ledger.get(player)
    }

    /// Stored bonuses, in id order
    pub fn bonus_entries(&self) -> Vec<(PlayerId, i64)> {
        self.lock().ledger.entries()
    }

    pub fn set_bonus(&self, player: PlayerId, value: i64) -> Result<BonusUpdate> {
        self.mutate_bonus(player, |ledger| ledger.set(player, value))
    }

    pub fn add_bonus(&self, player: PlayerId, amount: i64) -> Result<BonusUpdate> {
        self.mutate_bonus(player, |ledger| Ok(ledger.add(player, amount)))
    }

    pub fn remove_bonus(&self, player: PlayerId, amount: i64) -> Result<BonusUpdate> {
        self.mutate_bonus(player, |ledger| Ok(ledger.remove(player, amount)))
    }

    pub fn reset_bonus(&self, player: PlayerId) -> Result<BonusUpdate> {
        self.mutate_bonus(player, |ledger| Ok(ledger.reset(&player)))
    }

    fn mutate_bonus(
        &self,
        player: PlayerId,
        mutate: impl FnOnce(&mut BonusLedger) -> Result<LedgerWrite>,
    ) -> Result<BonusUpdate> {
        let (update, write) = {
            let mut state = self.lock();
            let QueueState { queue, ledger } = &mut *state;
            let write = mutate(ledger)?;
            let position = if queue.contains(&player) {
                Some(queue.reorder(&player, ledger)?)
            } else {
                None
            };
            let update = BonusUpdate {
                player,
                bonus: ledger.get(&player),
                position,
            };
            (update, write)
        };

        self.store.commit_or_log(&write);
        tracing::debug!(
            player = %player,
            bonus = update.bonus,
            position = ?update.position,
            "Bonus updated"
        );
        Ok(update)
    }

    /// Remove `expected` only if it is still the head.
    ///
    /// The admission loop probes capacity without holding the lock; this is
    /// the re-check that keeps a stale probe result from admitting someone
    /// who already left or was overtaken.
    pub fn take_head_if(&self, expected: &PlayerId) -> Option<QueueEntry> {
        let mut state = self.lock();
        if state.queue.head().as_ref() != Some(expected) {
            return None;
        }
        state.queue.leave(expected).ok()
    }

    pub fn is_head(&self, player: &PlayerId) -> bool {
        self.lock().queue.head().as_ref() == Some(player)
    }
}

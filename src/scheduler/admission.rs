//! Admission of the top-ranked player.
//!
//! One tick:
//! 1. empty queue: nothing to do
//! 2. probe the target's capacity (timeout-bounded, no lock held)
//! 3. probe failed: no change, the next tick retries
//! 4. free slot: remove the head, but only if it is still the player that was
//!    head when the probe started, then dispatch the connect action
//! 5. no free slot: tell the head the target is full
//!
//! At most one player is admitted per tick however much headroom exists.

use std::sync::Arc;
use std::time::Duration;

use crate::downstream::{Capacity, CapacityProbe, Connector, ProbeError, probe_with_timeout};
use crate::id::PlayerId;
use crate::manager::QueueManager;
use crate::notify::{MessageKey, Notifier, Params, params};
use crate::scheduler::probe_health::{DEFAULT_WARN_AFTER, ProbeHealth};

/// Default bound on a single capacity probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// What one admission tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// Queue was empty
    Idle,
    /// Head removed from the queue and connected
    Admitted(PlayerId),
    /// Target had no free slot
    TargetFull { head: PlayerId, capacity: Capacity },
    /// Probe failed or timed out
    ProbeFailed(ProbeError),
    /// Head changed while the probe was in flight; nothing was done
    StaleHead { probed: PlayerId },
}

/// Periodic process that promotes the head player when capacity allows.
pub struct AdmissionController {
    manager: Arc<QueueManager>,
    probe: Arc<dyn CapacityProbe>,
    connector: Arc<dyn Connector>,
    notifier: Arc<dyn Notifier>,
    target: String,
    probe_timeout: Duration,
    health: ProbeHealth,
}

impl AdmissionController {
    pub fn new(
        manager: Arc<QueueManager>,
        probe: Arc<dyn CapacityProbe>,
        connector: Arc<dyn Connector>,
        notifier: Arc<dyn Notifier>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            probe,
            connector,
            notifier,
            target: target.into(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            health: ProbeHealth::new(DEFAULT_WARN_AFTER),
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_warn_after(mut self, failures: u32) -> Self {
        self.health = ProbeHealth::new(failures);
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn health(&self) -> &ProbeHealth {
        &self.health
    }

    /// Run one admission step.
    pub async fn tick(&mut self) -> AdmissionOutcome {
        let Some(head) = self.manager.head() else {
            return AdmissionOutcome::Idle;
        };

        let capacity = match probe_with_timeout(self.probe.as_ref(), &self.target, self.probe_timeout).await {
            Ok(capacity) => capacity,
            Err(e) => {
                self.health.record_failure(&e);
                return AdmissionOutcome::ProbeFailed(e);
            }
        };
        self.health.record_success();

        if !capacity.has_room() {
            // Only tell the player who is still waiting at the front
            if self.manager.is_head(&head) {
                self.notifier.notify(head, MessageKey::ServerFull, Params::new());
            }
            log::debug!("Target full for {}: {}/{}", head, capacity.used, capacity.capacity);
            return AdmissionOutcome::TargetFull { head, capacity };
        }

        let Some(entry) = self.manager.take_head_if(&head) else {
            log::info!("Queue head changed while probing for {}, skipping admission", head);
            return AdmissionOutcome::StaleHead { probed: head };
        };

        self.connector.connect(entry.player, &self.target);
        self.notifier.notify(
            entry.player,
            MessageKey::ConnectSuccess,
            params([("server", self.target.as_str())]),
        );
        log::info!(
            "Admitted {} to {} with {} queue points ({}/{})",
            entry.player, self.target, entry.queue_points, capacity.used, capacity.capacity
        );
        AdmissionOutcome::Admitted(entry.player)
    }
}

//! Downstream target interfaces.
//!
//! The admission engine needs two things from the host: an asynchronous
//! capacity probe and a fire-and-forget connect action. [`InMemoryTarget`]
//! implements both for local simulation.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::id::PlayerId;

/// Occupancy reported by a capacity probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub used: i64,
    pub capacity: i64,
}

impl Capacity {
    pub fn new(used: i64, capacity: i64) -> Self {
        Self { used, capacity }
    }

    /// At least one free slot
    pub fn has_room(&self) -> bool {
        self.used < self.capacity
    }
}

/// Transient probe failures. None of these are terminal: the admission loop
/// simply tries again on its next tick.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("target unreachable: {0}")]
    Unreachable(String),

    #[error("malformed probe response: {0}")]
    Malformed(String),
}

/// Asynchronous capacity check against the downstream target
#[async_trait]
pub trait CapacityProbe: Send + Sync {
    async fn probe(&self, target: &str) -> Result<Capacity, ProbeError>;
}

/// Moves an admitted player onto the target. No acknowledgement is expected.
pub trait Connector: Send + Sync {
    fn connect(&self, player: PlayerId, target: &str);
}

/// Run a probe bounded by `timeout`; expiry maps to [`ProbeError::Timeout`].
pub async fn probe_with_timeout(
    probe: &dyn CapacityProbe,
    target: &str,
    timeout: Duration,
) -> Result<Capacity, ProbeError> {
    let capacity = tokio::time::timeout(timeout, probe.probe(target))
        .await
        .map_err(|_| ProbeError::Timeout(timeout))??;

    if capacity.capacity < 0 || capacity.used < 0 {
        return Err(ProbeError::Malformed(format!(
            "used={} capacity={}",
            capacity.used, capacity.capacity
        )));
    }
    Ok(capacity)
}

/// A local stand-in for the downstream service.
///
/// `connect` occupies a slot and records the player; `release` frees one.
/// The target can be taken offline to make probes fail, and given a latency
/// to exercise probe timeouts.
#[derive(Debug)]
pub struct InMemoryTarget {
    name: String,
    used: AtomicI64,
    capacity: AtomicI64,
    online: AtomicBool,
    latency: Mutex<Duration>,
    connected: Mutex<Vec<PlayerId>>,
}

impl InMemoryTarget {
    pub fn new(name: impl Into<String>, used: i64, capacity: i64) -> Self {
        Self {
            name: name.into(),
            used: AtomicI64::new(used),
            capacity: AtomicI64::new(capacity),
            online: AtomicBool::new(true),
            latency: Mutex::new(Duration::ZERO),
            connected: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn used(&self) -> i64 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn set_used(&self, used: i64) {
        self.used.store(used, Ordering::SeqCst);
    }

    pub fn set_capacity(&self, capacity: i64) {
        self.capacity.store(capacity, Ordering::SeqCst);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Free one slot (a player left the target)
    pub fn release(&self) {
        let _ = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| Some((used - 1).max(0)));
    }

    /// Players connected so far, in connect order
    pub fn connected(&self) -> Vec<PlayerId> {
        self.connected.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl CapacityProbe for InMemoryTarget {
    async fn probe(&self, target: &str) -> Result<Capacity, ProbeError> {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if target != self.name {
            return Err(ProbeError::Unreachable(format!("no such target: {}", target)));
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(ProbeError::Unreachable(format!("{} is offline", self.name)));
        }

        Ok(Capacity::new(
            self.used.load(Ordering::SeqCst),
            self.capacity.load(Ordering::SeqCst),
        ))
    }
}

impl Connector for InMemoryTarget {
    fn connect(&self, player: PlayerId, target: &str) {
        if target != self.name {
            tracing::warn!(player = %player, target, "Connect requested for unknown target");
            return;
        }
        self.used.fetch_add(1, Ordering::SeqCst);
        self.connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(player);
    }
}

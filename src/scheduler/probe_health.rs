//! Probe staleness tracking.
//!
//! When the capacity probe keeps failing, the queue head cannot advance and
//! nothing else in the system notices. This tracks consecutive failures and
//! surfaces a warning at a threshold. It never changes admission behavior:
//! there is no backoff and no circuit breaking, every tick still probes.

use std::time::{Duration, Instant};

use crate::downstream::ProbeError;

/// Default number of consecutive failures before warning.
pub const DEFAULT_WARN_AFTER: u32 = 12;

/// Health of the downstream capacity probe.
#[derive(Debug)]
pub struct ProbeHealth {
    /// Number of consecutive failed probes.
    pub consecutive_failures: u32,
    /// Last successful probe time.
    pub last_success: Option<Instant>,
    /// Failures needed before warning; warnings repeat every multiple of this.
    pub warn_after: u32,
}

impl ProbeHealth {
    pub fn new(warn_after: u32) -> Self {
        Self {
            consecutive_failures: 0,
            last_success: None,
            warn_after: warn_after.max(1),
        }
    }

    /// Whether failures have reached the warning threshold.
    pub fn is_stale(&self) -> bool {
        self.consecutive_failures >= self.warn_after
    }

    /// Record a failed probe. Returns true when this failure emitted a warning.
    pub fn record_failure(&mut self, error: &ProbeError) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.consecutive_failures % self.warn_after == 0 {
            log::warn!(
                "Capacity probe failed {} times in a row (last success {:?}s ago), queue head cannot advance: {}",
                self.consecutive_failures,
                self.time_since_success().map(|d| d.as_secs()),
                error
            );
            return true;
        }

        log::debug!(
            "Capacity probe failed ({} in a row), retrying next tick: {}",
            self.consecutive_failures, error
        );
        false
    }

    /// Record a successful probe, clearing the failure streak.
    pub fn record_success(&mut self) {
        if self.is_stale() {
            log::info!("Capacity probe recovered after {} failures", self.consecutive_failures);
        }
        self.consecutive_failures = 0;
        self.last_success = Some(Instant::now());
    }

    /// Get time since last successful probe.
    pub fn time_since_success(&self) -> Option<Duration> {
        self.last_success.map(|t| t.elapsed())
    }
}

impl Default for ProbeHealth {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_AFTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn unreachable() -> ProbeError {
        ProbeError::Unreachable("down".to_string())
    }

    #[test]
    fn test_probe_health_new() {
        let health = ProbeHealth::new(3);
        assert!(!health.is_stale());
        assert_eq!(health.consecutive_failures, 0);
        assert!(health.last_success.is_none());
    }

    #[test]
    fn test_warns_at_threshold_and_multiples() {
        let mut health = ProbeHealth::new(3);
        let warned: Vec<bool> = (0..7).map(|_| health.record_failure(&unreachable())).collect();
        assert_eq!(warned, vec![false, false, true, false, false, true, false]);
        assert!(health.is_stale());
    }

    #[test]
    fn test_record_success_clears_streak() {
        let mut health = ProbeHealth::new(2);
        health.record_failure(&unreachable());
        health.record_failure(&unreachable());
        assert!(health.is_stale());

        health.record_success();

        assert!(!health.is_stale());
        assert_eq!(health.consecutive_failures, 0);
        assert!(health.last_success.is_some());
    }

    #[test]
    fn test_zero_threshold_is_clamped() {
        let mut health = ProbeHealth::new(0);
        assert_eq!(health.warn_after, 1);
        assert!(health.record_failure(&unreachable()));
    }

    #[test]
    fn test_time_since_success() {
        let mut health = ProbeHealth::default();
        assert!(health.time_since_success().is_none());

        health.record_success();
        thread::sleep(Duration::from_millis(10));

        let elapsed = health.time_since_success();
        assert!(elapsed.is_some());
        assert!(elapsed.unwrap() >= Duration::from_millis(10));
    }
}

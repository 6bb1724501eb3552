//! Tick bookkeeping - intervals and per-loop counters
//!
//! Each periodic loop owns a `TickState` and folds the outcome of every tick
//! into it. On shutdown the daemon merges the three states into one summary.

use std::time::Duration;

use crate::scheduler::{AccrualOutcome, AdmissionOutcome};

/// Longest period a loop may run on
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
/// Shortest period a loop may run on
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Periods of the three independent loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    /// Between point accruals
    pub accrual: Duration,
    /// Between admission checks
    pub admission: Duration,
    /// Between status broadcasts
    pub status: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            accrual: Duration::from_secs(1),
            admission: Duration::from_secs(5),
            status: Duration::from_secs(30),
        }
    }
}

impl Intervals {
    /// Create intervals from explicit periods
    pub fn new(accrual: Duration, admission: Duration, status: Duration) -> Self {
        Self {
            accrual,
            admission,
            status,
        }
    }

    /// Clamp a period into `MIN_INTERVAL..=MAX_INTERVAL`
    pub fn bounded(period: Duration) -> Duration {
        period.clamp(MIN_INTERVAL, MAX_INTERVAL)
    }
}

/// Tick state tracks what the loops have done since start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickState {
    pub accrual_ticks: u64,
    pub admission_ticks: u64,
    pub status_ticks: u64,
    /// Players moved to the target
    pub admitted: u64,
    /// Admission ticks that found the target full
    pub target_full: u64,
    pub probe_failures: u64,
    /// Admissions aborted because the head changed mid-probe
    pub stale_heads: u64,
    pub leaderboards: u64,
    /// Players sent a status round
    pub status_sent: u64,
}

impl TickState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accrual(&mut self, outcome: &AccrualOutcome) {
        self.accrual_ticks += 1;
        self.leaderboards += outcome.leaderboards as u64;
    }

    pub fn record_admission(&mut self, outcome: &AdmissionOutcome) {
        self.admission_ticks += 1;
        match outcome {
            AdmissionOutcome::Idle => {}
            AdmissionOutcome::Admitted(_) => self.admitted += 1,
            AdmissionOutcome::TargetFull { .. } => self.target_full += 1,
            AdmissionOutcome::ProbeFailed(_) => self.probe_failures += 1,
            AdmissionOutcome::StaleHead { .. } => self.stale_heads += 1,
        }
    }

    pub fn record_status(&mut self, players: usize) {
        self.status_ticks += 1;
        self.status_sent += players as u64;
    }

    /// Fold another loop's counters into this one
    pub fn merge(&mut self, other: &TickState) {
        self.accrual_ticks += other.accrual_ticks;
        self.admission_ticks += other.admission_ticks;
        self.status_ticks += other.status_ticks;
        self.admitted += other.admitted;
        self.target_full += other.target_full;
        self.probe_failures += other.probe_failures;
        self.stale_heads += other.stale_heads;
        self.leaderboards += other.leaderboards;
        self.status_sent += other.status_sent;
    }
}

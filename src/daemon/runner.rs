//! Daemon runner - the three periodic loops
//!
//! Accrual, admission, and status broadcast each run on their own tokio
//! interval against the shared `QueueManager`. A slow admission probe never
//! delays accrual. Shutdown is cooperative: every loop finishes its current
//! tick, then returns its counters.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::tick::{Intervals, TickState};
use crate::config::Config;
use crate::downstream::{CapacityProbe, Connector};
use crate::manager::QueueManager;
use crate::notify::Notifier;
use crate::scheduler::{AdmissionController, PriorityScheduler, StatusNotifier};

/// Handle to the running loops
pub struct Daemon {
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<JoinHandle<TickState>>,
}

impl Daemon {
    /// Spawn the loops. Must be called from within a tokio runtime.
    pub fn start(
        intervals: Intervals,
        accrual: PriorityScheduler,
        admission: AdmissionController,
        status: StatusNotifier,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let handles = vec![
            tokio::spawn(run_accrual(intervals.accrual, accrual, shutdown_tx.subscribe())),
            tokio::spawn(run_admission(intervals.admission, admission, shutdown_tx.subscribe())),
            tokio::spawn(run_status(intervals.status, status, shutdown_tx.subscribe())),
        ];

        log::info!(
            "Daemon started (accrual {:?}, admission {:?}, status {:?})",
            intervals.accrual, intervals.admission, intervals.status
        );

        Self { shutdown_tx, handles }
    }

    /// Build every loop from `config` and start them
    pub fn from_config(
        config: &Config,
        manager: Arc<QueueManager>,
        probe: Arc<dyn CapacityProbe>,
        connector: Arc<dyn Connector>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let accrual = PriorityScheduler::new(Arc::clone(&manager), Arc::clone(&notifier)).with_config(config.accrual());
        let admission = AdmissionController::new(
            Arc::clone(&manager),
            probe,
            connector,
            Arc::clone(&notifier),
            config.target_server.clone(),
        )
        .with_probe_timeout(config.probe_timeout())
        .with_warn_after(config.warn_after());
        let status = StatusNotifier::new(manager, notifier);

        Self::start(config.intervals(), accrual, admission, status)
    }

    /// Stop every loop and wait for it. Returns the merged counters.
    pub async fn shutdown(self) -> TickState {
        // Receivers outlive the send; an error only means every loop already exited
        let _ = self.shutdown_tx.send(());

        let mut summary = TickState::new();
        for result in join_all(self.handles).await {
            match result {
                Ok(state) => summary.merge(&state),
                Err(e) => log::error!("Daemon loop failed: {}", e),
            }
        }

        log::info!(
            "Daemon stopped: {} admitted, {} probe failures, {} accrual ticks",
            summary.admitted, summary.probe_failures, summary.accrual_ticks
        );
        summary
    }
}

/// First tick one period from now; a late tick delays the next rather than bursting
fn ticker(period: Duration) -> Interval {
    let period = Intervals::bounded(period);
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn run_accrual(
    period: Duration,
    scheduler: PriorityScheduler,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> TickState {
    let mut ticker = ticker(period);
    let mut state = TickState::new();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                state.record_accrual(&scheduler.tick());
            }
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }
    state
}

async fn run_admission(
    period: Duration,
    mut controller: AdmissionController,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> TickState {
    let mut ticker = ticker(period);
    let mut state = TickState::new();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = controller.tick().await;
                state.record_admission(&outcome);
            }
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }
    state
}

async fn run_status(
    period: Duration,
    status: StatusNotifier,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> TickState {
    let mut ticker = ticker(period);
    let mut state = TickState::new();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                state.record_status(status.tick());
            }
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downstream::InMemoryTarget;
    use crate::id::PlayerId;
    use crate::notify::{MemoryNotifier, MessageKey};
    use crate::storage::LedgerStore;
    use tempfile::TempDir;

    fn p(n: u128) -> PlayerId {
        PlayerId::from_u128(n)
    }

    struct Fixture {
        manager: Arc<QueueManager>,
        target: Arc<InMemoryTarget>,
        notifier: Arc<MemoryNotifier>,
        _temp: TempDir,
    }

    fn setup(used: i64, capacity: i64) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        Fixture {
            manager: Arc::new(QueueManager::open(LedgerStore::new(
                temp_dir.path().join("bonus_points.json"),
            ))),
            target: Arc::new(InMemoryTarget::new("pokemon", used, capacity)),
            notifier: Arc::new(MemoryNotifier::new()),
            _temp: temp_dir,
        }
    }

    fn start(f: &Fixture) -> Daemon {
        Daemon::from_config(
            &Config::default(),
            Arc::clone(&f.manager),
            f.target.clone(),
            f.target.clone(),
            f.notifier.clone(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_loops_run_on_their_own_intervals() {
        let f = setup(0, 1);
        f.manager.join(p(1)).unwrap();
        f.manager.join(p(2)).unwrap();

        let daemon = start(&f);
        tokio::time::sleep(Duration::from_millis(5500)).await;
        let summary = daemon.shutdown().await;

        assert_eq!(summary.accrual_ticks, 5);
        assert_eq!(summary.admission_ticks, 1);
        assert_eq!(summary.status_ticks, 0);
        assert_eq!(summary.admitted, 1);

        assert_eq!(f.target.connected(), vec![p(1)]);
        assert_eq!(f.manager.head(), Some(p(2)));
        assert_eq!(f.manager.check_points(&p(2)).queue, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_target_holds_queue() {
        let f = setup(1, 1);
        f.manager.join(p(1)).unwrap();

        let daemon = start(&f);
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let summary = daemon.shutdown().await;

        assert_eq!(summary.admission_ticks, 2);
        assert_eq!(summary.target_full, 2);
        assert_eq!(summary.admitted, 0);
        assert!(f.manager.contains(&p(1)));
        assert_eq!(f.notifier.for_player(&p(1), MessageKey::ServerFull).len(), 2);
        // Ten accruals trigger one leaderboard
        assert_eq!(summary.leaderboards, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_broadcast() {
        let f = setup(1, 1);
        f.manager.join(p(1)).unwrap();

        let daemon = start(&f);
        tokio::time::sleep(Duration::from_millis(30_500)).await;
        let summary = daemon.shutdown().await;

        assert_eq!(summary.status_ticks, 1);
        assert_eq!(summary.status_sent, 1);
        let queue_points = f.notifier.for_player(&p(1), MessageKey::StatusQueuePoints);
        assert_eq!(queue_points.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_target_counts_failures() {
        let f = setup(0, 10);
        f.target.set_online(false);
        f.manager.join(p(1)).unwrap();

        let daemon = start(&f);
        tokio::time::sleep(Duration::from_millis(15_500)).await;
        let summary = daemon.shutdown().await;

        assert_eq!(summary.probe_failures, 3);
        assert!(f.manager.contains(&p(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_interval_keeps_loop_alive() {
        let f = setup(0, 10);
        f.manager.join(p(1)).unwrap();
        let huge = Duration::from_secs(u64::MAX);
        let intervals = Intervals::new(huge, huge, Duration::from_secs(1));
        let daemon = Daemon::start(
            intervals,
            PriorityScheduler::new(Arc::clone(&f.manager), f.notifier.clone()),
            AdmissionController::new(
                Arc::clone(&f.manager),
                f.target.clone(),
                f.target.clone(),
                f.notifier.clone(),
                "pokemon",
            ),
            StatusNotifier::new(Arc::clone(&f.manager), f.notifier.clone()),
        );

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let summary = daemon.shutdown().await;

        // Every loop returned its counters, none panicked
        assert_eq!(summary.status_ticks, 2);
        assert_eq!(summary.accrual_ticks, 0);
        assert_eq!(summary.admission_ticks, 0);
    }

    #[tokio::test]
    async fn test_immediate_shutdown() {
        let f = setup(0, 10);
        let daemon = start(&f);
        let summary = daemon.shutdown().await;
        assert_eq!(summary, TickState::new());
    }
}

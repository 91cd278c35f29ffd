//! Periodic maintenance jobs.
//!
//! Two jobs run on fixed intervals: the overdue sweep (every 5 minutes by
//! default) and the idempotency cache purge (hourly). Both are safe to
//! repeat, so a missed or failed tick only delays work until the next one.
//! The ledger is synchronous, so each run happens on the blocking pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use bnpl_engine::Ledger;

/// Builder for the maintenance tasks.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    sweep_interval: Duration,
    purge_interval: Duration,
}

/// Running maintenance tasks; stop them with [`SchedulerHandle::shutdown`].
#[derive(Debug)]
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Create a scheduler. Zero intervals are raised to one second.
    #[must_use]
    pub fn new(sweep_interval: Duration, purge_interval: Duration) -> Self {
        let floor = Duration::from_secs(1);
        Self {
            sweep_interval: sweep_interval.max(floor),
            purge_interval: purge_interval.max(floor),
        }
    }

    /// Spawn both jobs on the current runtime. The first run of each job
    /// happens immediately.
    #[must_use]
    pub fn start(self, ledger: Arc<Ledger>) -> SchedulerHandle {
        let (stop, stopped) = watch::channel(false);

        let sweep = spawn_job(
            "overdue_sweep",
            self.sweep_interval,
            stopped.clone(),
            Arc::clone(&ledger),
            run_sweep,
        );
        let purge = spawn_job(
            "idempotency_purge",
            self.purge_interval,
            stopped,
            ledger,
            run_purge,
        );

        tracing::info!(
            sweep_interval_secs = self.sweep_interval.as_secs(),
            purge_interval_secs = self.purge_interval.as_secs(),
            "Scheduler started"
        );
        SchedulerHandle {
            stop,
            tasks: vec![sweep, purge],
        }
    }
}

impl SchedulerHandle {
    /// Signal both jobs to stop and wait for them. A run in progress is
    /// allowed to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Scheduler task panicked");
            }
        }
        tracing::info!("Scheduler stopped");
    }
}

fn spawn_job(
    name: &'static str,
    period: Duration,
    mut stopped: watch::Receiver<bool>,
    ledger: Arc<Ledger>,
    job: fn(&Ledger),
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let ledger = Arc::clone(&ledger);
                    if let Err(e) = tokio::task::spawn_blocking(move || job(&ledger)).await {
                        tracing::error!(job = name, error = %e, "Scheduled job panicked");
                    }
                }
                _ = stopped.changed() => break,
            }
        }
        tracing::debug!(job = name, "Scheduled job stopped");
    })
}

/// Run one overdue sweep, logging instead of propagating failures.
pub fn run_sweep(ledger: &Ledger) {
    match ledger.sweep_overdue() {
        Ok(report) if report.updated_count > 0 => tracing::info!(
            updated = report.updated_count,
            users = report.affected_users.len(),
            "Overdue sweep marked installments"
        ),
        Ok(_) => tracing::debug!("Overdue sweep found nothing to do"),
        Err(e) => tracing::error!(error = %e, "Overdue sweep failed"),
    }
}

/// Run one idempotency purge, logging instead of propagating failures.
pub fn run_purge(ledger: &Ledger) {
    match ledger.purge_expired() {
        Ok(removed) => tracing::debug!(removed, "Idempotency purge finished"),
        Err(e) => tracing::error!(error = %e, "Idempotency purge failed"),
    }
}

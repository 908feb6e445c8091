//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Currently one task: the availability reminder run.
//!
//! ```text
//! Scheduler (every 30 minutes by default)
//!     │
//!     └─► ReminderScheduler::run_once(now)
//!             ├─► previous run still active → skipped
//!             └─► run_availability_reminders(now)
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::common::AppResult;
use crate::domains::availability::activities::{run_availability_reminders, ReminderReport};
use crate::kernel::ServerDeps;

pub const DEFAULT_REMINDER_CRON: &str = "0 */30 * * * *";

/// Single-flight wrapper around the reminder run.
///
/// A run that starts while another is active returns a skipped report
/// instead of queueing behind it.
pub struct ReminderScheduler {
    deps: Arc<ServerDeps>,
    running: Arc<AtomicBool>,
}

/// Clears the running flag however the run ends.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ReminderScheduler {
    pub fn new(deps: Arc<ServerDeps>) -> Self {
        Self {
            deps,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn run_once(&self, now: DateTime<Utc>) -> AppResult<ReminderReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Previous reminder run still active, skipping");
            return Ok(ReminderReport::skipped());
        }
        let _guard = RunningGuard(self.running.clone());

        run_availability_reminders(now, &self.deps).await
    }
}

/// Start all scheduled tasks
pub async fn start_scheduler(reminders: Arc<ReminderScheduler>, cron: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .context("Failed to create job scheduler")?;

    let reminder_job = Job::new_async(cron, move |_uuid, _lock| {
        let reminders = reminders.clone();
        Box::pin(async move {
            if let Err(e) = reminders.run_once(Utc::now()).await {
                error!("Availability reminder task failed: {}", e);
            }
        })
    })
    .with_context(|| format!("Invalid reminder schedule: {}", cron))?;

    scheduler.add(reminder_job).await?;
    scheduler.start().await?;

    info!(cron = %cron, "Scheduled tasks started (availability reminders)");
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::TestDependencies;

    #[tokio::test]
    async fn overlapping_run_is_skipped() {
        let scheduler = ReminderScheduler::new(Arc::new(TestDependencies::new().into_deps()));
        scheduler.running.store(true, Ordering::SeqCst);

        let report = scheduler.run_once(Utc::now()).await.unwrap();

        assert!(report.skipped);
        assert!(scheduler.is_running());
    }

    #[tokio::test]
    async fn flag_is_released_after_a_run() {
        let scheduler = ReminderScheduler::new(Arc::new(TestDependencies::new().into_deps()));

        let report = scheduler.run_once(Utc::now()).await.unwrap();

        assert!(!report.skipped);
        assert_eq!(report.matches_scanned, 0);
        assert!(!scheduler.is_running());
    }
}

// Scheduling engine: bootstrap backoff, the main cycle, and sleep/wake
// discipline

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::errors::SchedulerError;
use crate::registry::JobRegistry;
use crate::runtime::ContainerRuntime;

/// Configuration for the scheduling loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Wait between discovery retries while no job-bearing container
    /// exists yet.
    pub bootstrap_retry_seconds: u64,
    /// Timezone cron expressions are evaluated in.
    pub timezone: Tz,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bootstrap_retry_seconds: 10,
            timezone: Tz::UTC,
        }
    }
}

/// Outcome of one scheduling cycle.
#[derive(Debug, Clone)]
pub struct Cycle {
    /// Number of jobs executed this cycle.
    pub executed: usize,
    /// Name of the job owning the minimum post-update deadline.
    pub next_job: String,
    /// The minimum deadline across all jobs, updates included.
    pub next_deadline: DateTime<Utc>,
    /// Seconds to sleep before the next cycle.
    pub sleep_seconds: u64,
}

/// Run every due job once and work out when to wake up next.
///
/// Jobs are visited in registry order; a due job runs to completion before
/// the next is looked at, and its freshly advanced deadline takes part in
/// the minimum-deadline selection. The sleep is clamped to at least one
/// second so an already-due deadline cannot busy-loop the scheduler.
pub async fn run_cycle(jobs: &mut JobRegistry, now: DateTime<Utc>) -> Result<Cycle, SchedulerError> {
    let mut executed = 0;
    let mut next: Option<(String, DateTime<Utc>)> = None;

    for job in jobs.iter_mut() {
        if job.deadline() < now {
            info!(job = %job.name(), deadline = %job.deadline(), "running job");
            job.run(now).await?;
            executed += 1;
        }
        match &next {
            // On ties the job visited first keeps the slot
            Some((_, deadline)) if *deadline <= job.deadline() => {}
            _ => next = Some((job.name().to_string(), job.deadline())),
        }
    }

    let (next_job, next_deadline) = next.ok_or(SchedulerError::EmptyRegistry)?;
    let sleep_seconds = (next_deadline - now).num_seconds().max(1) as u64;

    Ok(Cycle {
        executed,
        next_job,
        next_deadline,
        sleep_seconds,
    })
}

/// The long-running scheduler.
///
/// Two states with a one-way transition: waiting for the first job to be
/// discovered, then cycling forever. Discovery is not repeated once the
/// transition happens; the registry snapshot is owned exclusively by the
/// loop and jobs execute one at a time.
pub struct SchedulerEngine {
    config: SchedulerConfig,
    runtime: Arc<dyn ContainerRuntime>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SchedulerEngine {
    pub fn new(config: SchedulerConfig, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        Self {
            config,
            runtime,
            shutdown_tx,
        }
    }

    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal the loop to stop at its next suspension point.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run until stopped externally.
    ///
    /// A discovery failure is fatal: if the runtime API cannot be reached
    /// the process has nothing useful left to do.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut shutdown_rx = self.shutdown_receiver();

        let first_jobs = self.await_first_jobs(&mut shutdown_rx).await?;
        let Some(mut jobs) = first_jobs else {
            info!("shutdown requested before any job was found");
            return Ok(());
        };

        info!(jobs = jobs.len(), "entering scheduling loop");

        loop {
            let now = Utc::now();
            let cycle = run_cycle(&mut jobs, now).await?;
            info!(
                next_job = %cycle.next_job,
                next_deadline = %cycle.next_deadline,
                sleep_seconds = cycle.sleep_seconds,
                "sleeping until next deadline"
            );
            tokio::select! {
                _ = sleep(Duration::from_secs(cycle.sleep_seconds)) => {}
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received, stopping scheduler");
                    return Ok(());
                }
            }
        }
    }

    /// Bootstrap state: retry discovery until at least one job exists.
    ///
    /// Returns `None` when a shutdown arrives first.
    async fn await_first_jobs(
        &self,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Result<Option<JobRegistry>, SchedulerError> {
        loop {
            let jobs =
                JobRegistry::discover(Arc::clone(&self.runtime), self.config.timezone).await?;
            if !jobs.is_empty() {
                return Ok(Some(jobs));
            }
            warn!(
                retry_seconds = self.config.bootstrap_retry_seconds,
                "no jobs found"
            );
            tokio::select! {
                _ = sleep(Duration::from_secs(self.config.bootstrap_retry_seconds)) => {}
                _ = shutdown_rx.recv() => return Ok(None),
            }
        }
    }
}

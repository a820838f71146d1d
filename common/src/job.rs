// A scheduled unit of work bound to one container

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::errors::ScheduleError;
use crate::runtime::{ContainerRef, ContainerRuntime};
use crate::schedule::CronSchedule;
use crate::telemetry;

/// A named, scheduled command bound to one target container.
///
/// The name is the unique key within a registry and never changes; the
/// deadline only moves forward, and only through the owned schedule.
pub struct Job {
    name: String,
    container_id: String,
    container_name: String,
    command: String,
    schedule: CronSchedule,
    runtime: Arc<dyn ContainerRuntime>,
}

impl Job {
    pub fn new(
        name: &str,
        container: &ContainerRef,
        command: &str,
        schedule: CronSchedule,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Self {
        Self {
            name: name.to_string(),
            container_id: container.id.clone(),
            container_name: container.name.clone(),
            command: command.to_string(),
            schedule,
            runtime,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Next instant at which this job becomes due.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.schedule.deadline()
    }

    /// Execute the command inside the target container, log the captured
    /// output, and advance the deadline to the next occurrence after `now`.
    ///
    /// The call blocks until the command completes; no timeout is applied.
    /// A runtime-level failure or a non-zero exit is logged and otherwise
    /// ignored: the deadline advances exactly as on success, so a failing
    /// job is retried at its next scheduled occurrence, never sooner.
    pub async fn run(&mut self, now: DateTime<Utc>) -> Result<(), ScheduleError> {
        let started = Instant::now();
        match self.runtime.exec(&self.container_id, &self.command).await {
            Ok(result) => {
                let output = String::from_utf8_lossy(&result.output);
                match result.exit_code {
                    Some(code) if code != 0 => {
                        warn!(
                            job = %self.name,
                            container = %self.container_name,
                            exit_code = code,
                            output = %output,
                            "job exited non-zero"
                        );
                        telemetry::record_job_failure(&self.name, "non_zero_exit");
                    }
                    _ => {
                        info!(
                            job = %self.name,
                            container = %self.container_name,
                            output = %output,
                            "job completed"
                        );
                        telemetry::record_job_success(&self.name);
                    }
                }
            }
            Err(e) => {
                error!(
                    job = %self.name,
                    container = %self.container_name,
                    error = %e,
                    "job execution failed"
                );
                telemetry::record_job_failure(&self.name, "exec_error");
            }
        }
        telemetry::record_job_duration(&self.name, started.elapsed().as_secs_f64());

        self.schedule.advance(now)?;
        Ok(())
    }
}

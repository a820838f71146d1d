// Job discovery over the container population

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::errors::RuntimeError;
use crate::identity;
use crate::job::Job;
use crate::labels::{self, JobDefinition, LabelKey, COMPOSE_PROJECT_LABEL};
use crate::runtime::{ContainerRuntime, LabelFilter};
use crate::schedule::CronSchedule;
use crate::telemetry;

/// Jobs keyed by name, iterated in discovery order.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.iter().any(|job| job.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.iter_mut()
    }

    /// Insert under the first-seen-wins policy.
    ///
    /// Returns `false` (dropping `job`) when the name is already
    /// registered.
    pub fn insert(&mut self, job: Job) -> bool {
        if self.contains(job.name()) {
            return false;
        }
        self.jobs.push(job);
        true
    }

    /// Discover all jobs advertised by containers in scope.
    ///
    /// The scope is the scheduler's own compose project when detectable;
    /// otherwise every visible container is scanned.
    pub async fn discover(
        runtime: Arc<dyn ContainerRuntime>,
        timezone: Tz,
    ) -> Result<Self, RuntimeError> {
        let scope = match identity::compose_project(runtime.as_ref()).await {
            Some(project) => {
                info!(project = %project, "scoping discovery to compose project");
                Some(LabelFilter::new(COMPOSE_PROJECT_LABEL, &project))
            }
            None => {
                warn!("unable to detect compose project; scanning every visible container");
                None
            }
        };
        Self::discover_scoped(runtime, scope, timezone).await
    }

    /// Discover jobs within an explicit scope.
    ///
    /// Per-key and per-job failures (malformed keys, incomplete
    /// definitions, schedules that fail to build) are logged and skipped;
    /// only an unreachable runtime API propagates.
    pub async fn discover_scoped(
        runtime: Arc<dyn ContainerRuntime>,
        scope: Option<LabelFilter>,
        timezone: Tz,
    ) -> Result<Self, RuntimeError> {
        let containers = runtime.list_containers(scope.as_ref()).await?;
        let mut registry = JobRegistry::new();

        for container in &containers {
            for (key, value) in &container.labels {
                let name = match labels::classify(key) {
                    LabelKey::Foreign => continue,
                    LabelKey::Malformed => {
                        warn!(key = %key, value = %value, "unable to parse dcron job label");
                        continue;
                    }
                    LabelKey::Job { name, .. } => name,
                };
                if registry.contains(name) {
                    // First-seen wins: later containers advertising an
                    // already-registered name are ignored for it.
                    continue;
                }

                let definition = JobDefinition::collect(&container.labels, name);
                let (Some(rule), Some(command)) = (definition.rule, definition.command) else {
                    debug!(
                        job = %name,
                        container = %container.name,
                        "incomplete job definition; skipping"
                    );
                    continue;
                };

                let schedule = match CronSchedule::new(&rule, timezone, Utc::now()) {
                    Ok(schedule) => schedule,
                    Err(e) => {
                        error!(
                            job = %name,
                            container = %container.name,
                            error = %e,
                            "failed to build schedule for job"
                        );
                        continue;
                    }
                };

                info!(
                    job = %name,
                    container = %container.name,
                    deadline = %schedule.deadline(),
                    "adding job"
                );
                registry.insert(Job::new(
                    name,
                    container,
                    &command,
                    schedule,
                    Arc::clone(&runtime),
                ));
            }
        }

        telemetry::record_registry_size(registry.len());
        Ok(registry)
    }
}

// Discovery and registry behavior over a mocked container runtime

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Timelike, Utc};
use chrono_tz::Tz;
use common::errors::RuntimeError;
use common::labels::COMPOSE_PROJECT_LABEL;
use common::registry::JobRegistry;
use common::runtime::{ContainerRef, ContainerRuntime, ExecOutput, LabelFilter};

/// Mock runtime serving a fixed container population.
struct MockRuntime {
    containers: Vec<ContainerRef>,
}

impl MockRuntime {
    fn new(containers: Vec<ContainerRef>) -> Arc<dyn ContainerRuntime> {
        Arc::new(Self { containers })
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn list_containers(
        &self,
        filter: Option<&LabelFilter>,
    ) -> Result<Vec<ContainerRef>, RuntimeError> {
        let containers = match filter {
            Some(f) => self
                .containers
                .iter()
                .filter(|c| c.labels.get(&f.key) == Some(&f.value))
                .cloned()
                .collect(),
            None => self.containers.clone(),
        };
        Ok(containers)
    }

    async fn container_labels(&self, id: &str) -> Result<BTreeMap<String, String>, RuntimeError> {
        self.containers
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.labels.clone())
            .ok_or_else(|| RuntimeError::Api(format!("no such container: {}", id)))
    }

    async fn exec(&self, id: &str, _command: &str) -> Result<ExecOutput, RuntimeError> {
        Ok(ExecOutput {
            exit_code: Some(0),
            output: format!("ran in {}\n", id).into_bytes(),
        })
    }
}

fn container(id: &str, labels: &[(&str, &str)]) -> ContainerRef {
    ContainerRef {
        id: id.to_string(),
        name: format!("{}-name", id),
        labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[tokio::test]
async fn test_single_backup_job_scenario() {
    let runtime = MockRuntime::new(vec![container(
        "c1",
        &[
            ("dcron.jobs.backup.rule", "0 3 * * *"),
            ("dcron.jobs.backup.execute", "/bin/backup.sh"),
        ],
    )]);
    let before = Utc::now();

    let registry = JobRegistry::discover_scoped(runtime, None, Tz::UTC)
        .await
        .unwrap();

    assert_eq!(registry.len(), 1);
    let job = registry.get("backup").unwrap();
    assert_eq!(job.name(), "backup");
    assert_eq!(job.command(), "/bin/backup.sh");
    assert!(job.deadline() > before);
    assert_eq!(job.deadline().hour(), 3);
    assert_eq!(job.deadline().minute(), 0);
}

#[tokio::test]
async fn test_duplicate_names_first_seen_wins() {
    let runtime = MockRuntime::new(vec![
        container(
            "c1",
            &[
                ("dcron.jobs.backup.rule", "0 3 * * *"),
                ("dcron.jobs.backup.execute", "/bin/first.sh"),
            ],
        ),
        container(
            "c2",
            &[
                ("dcron.jobs.backup.rule", "0 4 * * *"),
                ("dcron.jobs.backup.execute", "/bin/second.sh"),
            ],
        ),
    ]);

    let registry = JobRegistry::discover_scoped(runtime, None, Tz::UTC)
        .await
        .unwrap();

    assert_eq!(registry.len(), 1);
    let job = registry.get("backup").unwrap();
    assert_eq!(job.container_id(), "c1");
    assert_eq!(job.command(), "/bin/first.sh");
}

#[tokio::test]
async fn test_later_container_still_contributes_new_names() {
    let runtime = MockRuntime::new(vec![
        container(
            "c1",
            &[
                ("dcron.jobs.backup.rule", "0 3 * * *"),
                ("dcron.jobs.backup.execute", "/bin/first.sh"),
            ],
        ),
        container(
            "c2",
            &[
                ("dcron.jobs.backup.rule", "0 4 * * *"),
                ("dcron.jobs.backup.execute", "/bin/second.sh"),
                ("dcron.jobs.report.rule", "0 6 * * *"),
                ("dcron.jobs.report.execute", "/bin/report.sh"),
            ],
        ),
    ]);

    let registry = JobRegistry::discover_scoped(runtime, None, Tz::UTC)
        .await
        .unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("backup").unwrap().container_id(), "c1");
    assert_eq!(registry.get("report").unwrap().container_id(), "c2");
}

#[tokio::test]
async fn test_malformed_key_does_not_abort_discovery() {
    let runtime = MockRuntime::new(vec![container(
        "c1",
        &[
            ("dcron.jobs.foo", "malformed"),
            ("dcron.jobs.backup.rule", "0 3 * * *"),
            ("dcron.jobs.backup.execute", "/bin/backup.sh"),
        ],
    )]);

    let registry = JobRegistry::discover_scoped(runtime, None, Tz::UTC)
        .await
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.get("backup").is_some());
}

#[tokio::test]
async fn test_incomplete_definition_is_absent() {
    let runtime = MockRuntime::new(vec![
        container("c1", &[("dcron.jobs.rule-only.rule", "0 3 * * *")]),
        container("c2", &[("dcron.jobs.cmd-only.execute", "/bin/x.sh")]),
    ]);

    let registry = JobRegistry::discover_scoped(runtime, None, Tz::UTC)
        .await
        .unwrap();

    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_invalid_rule_is_contained_to_its_job() {
    let runtime = MockRuntime::new(vec![container(
        "c1",
        &[
            ("dcron.jobs.broken.rule", "not a cron expression"),
            ("dcron.jobs.broken.execute", "/bin/broken.sh"),
            ("dcron.jobs.healthy.rule", "*/5 * * * *"),
            ("dcron.jobs.healthy.execute", "/bin/healthy.sh"),
        ],
    )]);

    let registry = JobRegistry::discover_scoped(runtime, None, Tz::UTC)
        .await
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.get("broken").is_none());
    assert!(registry.get("healthy").is_some());
}

#[tokio::test]
async fn test_unknown_field_selector_is_ignored() {
    let runtime = MockRuntime::new(vec![container(
        "c1",
        &[
            ("dcron.jobs.backup.rule", "0 3 * * *"),
            ("dcron.jobs.backup.run", "/bin/backup.sh"),
            ("dcron.jobs.backup.timeout", "30"),
        ],
    )]);

    let registry = JobRegistry::discover_scoped(runtime, None, Tz::UTC)
        .await
        .unwrap();

    // ".run" is accepted as the command synonym; ".timeout" is ignored
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("backup").unwrap().command(), "/bin/backup.sh");
}

#[tokio::test]
async fn test_scoped_discovery_only_sees_the_project() {
    let runtime = MockRuntime::new(vec![
        container(
            "c1",
            &[
                (COMPOSE_PROJECT_LABEL, "prod"),
                ("dcron.jobs.backup.rule", "0 3 * * *"),
                ("dcron.jobs.backup.execute", "/bin/backup.sh"),
            ],
        ),
        container(
            "c2",
            &[
                (COMPOSE_PROJECT_LABEL, "staging"),
                ("dcron.jobs.report.rule", "0 6 * * *"),
                ("dcron.jobs.report.execute", "/bin/report.sh"),
            ],
        ),
    ]);

    let scope = Some(LabelFilter::new(COMPOSE_PROJECT_LABEL, "prod"));
    let registry = JobRegistry::discover_scoped(runtime, scope, Tz::UTC)
        .await
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.get("backup").is_some());
    assert!(registry.get("report").is_none());
}

#[tokio::test]
async fn test_registry_iterates_in_discovery_order() {
    let runtime = MockRuntime::new(vec![
        container(
            "c1",
            &[
                ("dcron.jobs.zeta.rule", "0 1 * * *"),
                ("dcron.jobs.zeta.execute", "/bin/z.sh"),
            ],
        ),
        container(
            "c2",
            &[
                ("dcron.jobs.alpha.rule", "0 2 * * *"),
                ("dcron.jobs.alpha.execute", "/bin/a.sh"),
            ],
        ),
    ]);

    let registry = JobRegistry::discover_scoped(runtime, None, Tz::UTC)
        .await
        .unwrap();

    let names: Vec<&str> = registry.iter().map(|job| job.name()).collect();
    assert_eq!(names, vec!["zeta", "alpha"]);
}

// Container runtime boundary
//
// The scheduler consumes a narrow slice of the runtime API: label-filtered
// listing, label lookup by id, and synchronous exec with buffered output.
// It is injected explicitly so the Docker client stays a process-start
// concern rather than ambient global state.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::RuntimeError;

mod docker;

pub use docker::DockerRuntime;

/// Label equality predicate used to scope container listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFilter {
    pub key: String,
    pub value: String,
}

impl LabelFilter {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Render as the `key=value` form the runtime API expects.
    pub fn to_query(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

/// A running container as seen by discovery.
#[derive(Debug, Clone)]
pub struct ContainerRef {
    pub id: String,
    pub name: String,
    /// Labels in sorted key order so scans are deterministic.
    pub labels: BTreeMap<String, String>,
}

/// Fully buffered result of an exec inside a container.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Exit code as reported by the runtime; `None` if it was unavailable.
    pub exit_code: Option<i64>,
    /// Interleaved stdout/stderr, fully buffered (not streamed).
    pub output: Vec<u8>,
}

/// The container runtime capability consumed by the scheduler.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List running containers, optionally restricted by a label filter.
    async fn list_containers(
        &self,
        filter: Option<&LabelFilter>,
    ) -> Result<Vec<ContainerRef>, RuntimeError>;

    /// Labels of one container, looked up by id.
    async fn container_labels(&self, id: &str) -> Result<BTreeMap<String, String>, RuntimeError>;

    /// Run `command` inside the container and capture its output.
    ///
    /// Blocks until the command exits.
    async fn exec(&self, id: &str, command: &str) -> Result<ExecOutput, RuntimeError>;
}

// Docker implementation of the container runtime boundary

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bollard_next::container::{InspectContainerOptions, ListContainersOptions};
use bollard_next::exec::{CreateExecOptions, StartExecResults};
use bollard_next::Docker;
use futures::StreamExt;
use tracing::debug;

use super::{ContainerRef, ContainerRuntime, ExecOutput, LabelFilter};
use crate::errors::RuntimeError;

/// Docker client backed by the local daemon socket.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    client: Docker,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon.
    pub fn connect() -> Result<Self, RuntimeError> {
        #[cfg(unix)]
        let client = Docker::connect_with_socket_defaults()
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;

        #[cfg(windows)]
        let client = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(
        &self,
        filter: Option<&LabelFilter>,
    ) -> Result<Vec<ContainerRef>, RuntimeError> {
        let options = filter.map(|f| {
            let mut filters = HashMap::new();
            filters.insert("label".to_string(), vec![f.to_query()]);
            ListContainersOptions::<String> {
                filters,
                ..Default::default()
            }
        });

        let summaries = self
            .client
            .list_containers(options)
            .await
            .map_err(|e| RuntimeError::Api(e.to_string()))?;

        let containers = summaries
            .into_iter()
            .map(|summary| {
                let id = summary.id.unwrap_or_default();
                let name = summary
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .next()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_else(|| id.clone());
                let labels = summary.labels.unwrap_or_default().into_iter().collect();
                ContainerRef { id, name, labels }
            })
            .collect();

        Ok(containers)
    }

    async fn container_labels(&self, id: &str) -> Result<BTreeMap<String, String>, RuntimeError> {
        let inspect = self
            .client
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| RuntimeError::Api(e.to_string()))?;

        Ok(inspect
            .config
            .and_then(|c| c.labels)
            .unwrap_or_default()
            .into_iter()
            .collect())
    }

    async fn exec(&self, id: &str, command: &str) -> Result<ExecOutput, RuntimeError> {
        let exec_error = |reason: String| RuntimeError::Exec {
            container: id.to_string(),
            reason,
        };

        let exec = self
            .client
            .create_exec(
                id,
                CreateExecOptions {
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    cmd: Some(vec![
                        "/bin/sh".to_string(),
                        "-c".to_string(),
                        command.to_string(),
                    ]),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| exec_error(e.to_string()))?;

        let mut buffered = Vec::new();
        match self
            .client
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| exec_error(e.to_string()))?
        {
            StartExecResults::Attached { mut output, .. } => {
                while let Some(chunk) = output.next().await {
                    let log = chunk.map_err(|e| exec_error(e.to_string()))?;
                    buffered.extend_from_slice(&log.into_bytes());
                }
            }
            StartExecResults::Detached => {
                debug!(container = %id, "exec started detached; no output to capture");
            }
        }

        let inspect = self
            .client
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| exec_error(e.to_string()))?;

        Ok(ExecOutput {
            exit_code: inspect.exit_code,
            output: buffered,
        })
    }
}

// dcrond binary entry point

use std::sync::Arc;

use anyhow::Context;
use common::config::Settings;
use common::runtime::{ContainerRuntime, DockerRuntime};
use common::scheduler::{SchedulerConfig, SchedulerEngine};
use common::telemetry;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration is loaded before logging so the configured level is
    // honored from the first line
    let settings = Settings::load().context("Failed to load configuration")?;
    settings.validate().map_err(anyhow::Error::msg)?;

    telemetry::init_logging(&settings.observability.log_level)?;

    info!("Starting dcrond");

    if let Some(port) = settings.observability.metrics_port {
        telemetry::init_metrics(port)?;
    }

    let timezone = settings
        .scheduler
        .timezone
        .parse::<chrono_tz::Tz>()
        .map_err(anyhow::Error::msg)?;

    // An unreachable Docker API is fatal: nothing can be discovered or
    // executed without it
    let runtime = DockerRuntime::connect().map_err(|e| {
        error!(error = %e, "Failed to connect to container runtime");
        e
    })?;
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(runtime);
    info!("Container runtime client initialized");

    let engine = Arc::new(SchedulerEngine::new(
        SchedulerConfig {
            bootstrap_retry_seconds: settings.scheduler.bootstrap_retry_seconds,
            timezone,
        },
        runtime,
    ));

    let engine_for_shutdown = Arc::clone(&engine);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
            engine_for_shutdown.stop();
        }
    });

    engine.start().await?;

    info!("Scheduler stopped");
    Ok(())
}

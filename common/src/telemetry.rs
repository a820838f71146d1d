// Telemetry: structured logging and Prometheus metrics

use std::net::SocketAddr;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured JSON logging.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer().json().with_target(true).with_filter(env_filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    Ok(())
}

/// Install the Prometheus exporter and describe the scheduler metrics.
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_gauge!("dcron_jobs_registered", "Number of jobs in the registry");
    describe_counter!(
        "dcron_job_success_total",
        "Total number of successful job executions"
    );
    describe_counter!(
        "dcron_job_failed_total",
        "Total number of failed job executions"
    );
    describe_histogram!(
        "dcron_job_duration_seconds",
        "Duration of job executions in seconds"
    );

    tracing::info!(
        metrics_port = metrics_port,
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

/// Record how many jobs the last discovery produced.
#[inline]
pub fn record_registry_size(count: usize) {
    gauge!("dcron_jobs_registered").set(count as f64);
}

/// Record a successful job execution.
#[inline]
pub fn record_job_success(job_name: &str) {
    counter!("dcron_job_success_total", "job" => job_name.to_string()).increment(1);
}

/// Record a failed job execution.
#[inline]
pub fn record_job_failure(job_name: &str, reason: &str) {
    counter!(
        "dcron_job_failed_total",
        "job" => job_name.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record job execution duration.
#[inline]
pub fn record_job_duration(job_name: &str, duration_seconds: f64) {
    histogram!("dcron_job_duration_seconds", "job" => job_name.to_string())
        .record(duration_seconds);
}

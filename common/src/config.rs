// Configuration management with layered sources (defaults, files, env)

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Top-level settings for the dcrond process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub scheduler: SchedulerSettings,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Seconds between discovery retries while no jobs exist yet.
    pub bootstrap_retry_seconds: u64,
    /// IANA timezone name cron rules are evaluated in.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// Port for the Prometheus exporter; absent disables metrics.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // In-code defaults keep the no-argument invocation working
            // even without any config file present
            .set_default("scheduler.bootstrap_retry_seconds", 10_i64)?
            .set_default("scheduler.timezone", "UTC")?
            .set_default("observability.log_level", "info")?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.scheduler.bootstrap_retry_seconds == 0 {
            return Err("scheduler bootstrap_retry_seconds must be greater than 0".to_string());
        }
        if self.scheduler.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(format!(
                "scheduler timezone '{}' is not a valid IANA timezone",
                self.scheduler.timezone
            ));
        }
        Ok(())
    }
}

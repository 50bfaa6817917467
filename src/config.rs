use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::compliance::CompliancePolicy;
use crate::orchestrator::OrchestratorConfig;
use crate::scheduler::SchedulerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
    pub orchestration: OrchestratorConfig,
    pub compliance: ComplianceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Active policy id (standard | conservative | permissive)
    pub policy: String,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            policy: "standard".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON formatted logs
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("QUORUM_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (QUORUM_SCHEDULER__ENABLED, etc.)
            .add_source(
                Environment::with_prefix("QUORUM")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.scheduler.interval_minutes == 0 {
            errors.push("scheduler.interval_minutes must be at least 1".to_string());
        }

        if self.orchestration.max_concurrent_trades == 0 {
            errors.push("orchestration.max_concurrent_trades must be at least 1".to_string());
        }

        if CompliancePolicy::by_id(&self.compliance.policy).is_none() {
            errors.push(format!(
                "compliance.policy '{}' is not a known policy",
                self.compliance.policy
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

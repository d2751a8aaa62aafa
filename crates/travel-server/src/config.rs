//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use travel_core::CityServiceConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL
    #[serde(default = "default_db_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Request pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Time allowed for the existence probe when creating a city
    #[serde(default = "default_probe_deadline_ms")]
    pub probe_deadline_ms: u64,
    /// Cities whose comments are fetched at once when listing
    #[serde(default = "default_fan_out_concurrency")]
    pub fan_out_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            probe_deadline_ms: default_probe_deadline_ms(),
            fan_out_concurrency: default_fan_out_concurrency(),
        }
    }
}

impl PipelineConfig {
    /// Convert to service settings, raising zero values to their minimum
    pub fn to_service_config(&self) -> CityServiceConfig {
        let mut probe_deadline_ms = self.probe_deadline_ms;
        if probe_deadline_ms == 0 {
            warn!("pipeline.probe_deadline_ms is 0, using 1");
            probe_deadline_ms = 1;
        }

        let mut fan_out_concurrency = self.fan_out_concurrency;
        if fan_out_concurrency == 0 {
            warn!("pipeline.fan_out_concurrency is 0, using 1");
            fan_out_concurrency = 1;
        }

        CityServiceConfig {
            probe_deadline: Duration::from_millis(probe_deadline_ms),
            fan_out_concurrency,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_url() -> String {
    "sqlite:travel.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_probe_deadline_ms() -> u64 {
    5000
}

fn default_fan_out_concurrency() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults if it is missing
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }
}

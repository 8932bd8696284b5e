//! Configuration management with validation and defaults
//!
//! Values come from the built-in defaults, an optional TOML file, and then
//! `ROULETTE_*` environment variables, in that order.

use crate::errors::{ConfigurationError, RouletteResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Top-level engine configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub settlement: SettlementConfig,
    pub ledger: LedgerConfig,
    pub wheel: WheelConfig,
    pub api: ApiConfig,
    pub monitoring: MonitoringConfig,
}

/// Spin settlement limits and retry policy
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Retries after a compare-and-set conflict, per ledger write
    pub max_retries: u32,
    /// Linear backoff step between retries
    pub retry_backoff_ms: u64,
    pub max_wagers_per_spin: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_backoff_ms: 10,
            max_wagers_per_spin: 100,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Balance granted to newly opened accounts
    pub initial_balance: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_balance: Decimal::from(1000),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    /// Fixed RNG seed; `None` draws from OS entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enable_metrics: bool,
    pub log_level: LogLevel,
    /// Buffer of the settlement event channel
    pub event_channel_capacity: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_level: LogLevel::Info,
            event_channel_capacity: 1024,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigurationError::InvalidValue {
                field: "monitoring.log_level".to_string(),
                value: s.to_string(),
                reason: "Expected one of error, warn, info, debug, trace".to_string(),
            }),
        }
    }
}

impl EngineConfig {
    /// Local development: fixed wheel seed, verbose logs
    pub fn development() -> Self {
        Self {
            wheel: WheelConfig { seed: Some(42) },
            monitoring: MonitoringConfig {
                log_level: LogLevel::Debug,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Production deployment: entropy-seeded wheel, public bind
    pub fn production() -> Self {
        Self {
            settlement: SettlementConfig {
                max_retries: 8,
                retry_backoff_ms: 5,
                ..Default::default()
            },
            wheel: WheelConfig { seed: None },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                request_timeout_secs: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.settlement.max_wagers_per_spin == 0 {
            return Err(invalid(
                "settlement.max_wagers_per_spin",
                "0",
                "At least one wager per spin must be allowed",
            ));
        }

        if self.ledger.initial_balance.is_sign_negative() && !self.ledger.initial_balance.is_zero() {
            return Err(invalid(
                "ledger.initial_balance",
                &self.ledger.initial_balance.to_string(),
                "Initial balance cannot be negative",
            ));
        }

        if self.api.host.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired("api.host".to_string()));
        }

        if self.api.port == 0 {
            return Err(invalid("api.port", "0", "Port cannot be zero"));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(invalid("api.request_timeout_secs", "0", "Timeout must be at least 1 second"));
        }

        if self.monitoring.event_channel_capacity == 0 {
            return Err(invalid(
                "monitoring.event_channel_capacity",
                "0",
                "Channel capacity cannot be zero",
            ));
        }

        Ok(())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.settlement.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_env<T: FromStr>(name: &str, value: String, reason: &str) -> Result<T, ConfigurationError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(name, &value, reason))
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
    /// Starting point when no file is given; defaults to `EngineConfig::default()`
    base: Option<EngineConfig>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            base: None,
        }
    }

    /// Start from a preset instead of the defaults when no file is given
    pub fn with_base(mut self, config: EngineConfig) -> Self {
        self.base = Some(config);
        self
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> RouletteResult<EngineConfig> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Same as `load`, reading overrides through `lookup` instead of the process environment
    pub fn load_with_env<F>(&self, lookup: F) -> RouletteResult<EngineConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => self.base.clone().unwrap_or_default(),
        };

        apply_env_overrides(&mut config, lookup)?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> RouletteResult<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    /// Save configuration to file
    pub fn save(&self, config: &EngineConfig, path: &str) -> RouletteResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

fn apply_env_overrides<F>(config: &mut EngineConfig, lookup: F) -> Result<(), ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("ROULETTE_API_HOST") {
        config.api.host = host;
    }
    if let Some(port) = lookup("ROULETTE_API_PORT") {
        config.api.port = parse_env("ROULETTE_API_PORT", port, "Invalid port number")?;
    }
    if let Some(retries) = lookup("ROULETTE_MAX_RETRIES") {
        config.settlement.max_retries =
            parse_env("ROULETTE_MAX_RETRIES", retries, "Invalid retry count")?;
    }
    if let Some(balance) = lookup("ROULETTE_INITIAL_BALANCE") {
        config.ledger.initial_balance =
            parse_env("ROULETTE_INITIAL_BALANCE", balance, "Invalid decimal amount")?;
    }
    if let Some(seed) = lookup("ROULETTE_WHEEL_SEED") {
        config.wheel.seed = Some(parse_env("ROULETTE_WHEEL_SEED", seed, "Seed must be a u64")?);
    }
    if let Some(level) = lookup("ROULETTE_LOG_LEVEL") {
        config.monitoring.log_level = level.parse()?;
    }
    Ok(())
}

/// Write the default configuration as a starting point for operators
pub fn generate_sample_config(path: &str) -> RouletteResult<()> {
    ConfigLoader::new().save(&EngineConfig::default(), path)
}

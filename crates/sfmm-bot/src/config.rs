//! Application configuration.

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sfmm_client::client::{DEFAULT_BASE_URL, DEFAULT_GM_URL};
use sfmm_client::{ClientConfig, ClientResult, RetryPolicy};
use sfmm_mm::MakerConfig;

use crate::error::{AppError, AppResult};

/// Env var consulted when no `--config` flag is given.
pub const CONFIG_ENV: &str = "SFMM_CONFIG";
/// Fallback config path.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Venue connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_gm_url")]
    pub gm_url: String,
    /// Name of the env var holding the API key. The key itself never
    /// lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_gm_url() -> String {
    DEFAULT_GM_URL.to_string()
}

fn default_api_key_env() -> String {
    "STOCKFIGHTER_API_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            gm_url: default_gm_url(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ExchangeConfig {
    /// Client settings, reading the API key from the environment.
    pub fn client_config(&self) -> ClientResult<ClientConfig> {
        ClientConfig::from_env(
            self.base_url.as_str(),
            self.gm_url.as_str(),
            &self.api_key_env,
            Duration::from_millis(self.timeout_ms),
        )
    }
}

/// The instrument being quoted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub account: String,
    /// When set, the instance is restarted at startup and venue, symbol
    /// and account are taken from the game master's response.
    #[serde(default)]
    pub instance_id: Option<u64>,
}

/// Quoting loop pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Sleep after a clean iteration.
    #[serde(default = "default_min_iteration_interval_ms")]
    pub min_iteration_interval_ms: u64,
    #[serde(default = "default_error_backoff_base_ms")]
    pub error_backoff_base_ms: u64,
    #[serde(default = "default_error_backoff_max_ms")]
    pub error_backoff_max_ms: u64,
    /// Consecutive non-clean iterations that stop the loop.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

fn default_min_iteration_interval_ms() -> u64 {
    250
}

fn default_error_backoff_base_ms() -> u64 {
    250
}

fn default_error_backoff_max_ms() -> u64 {
    5_000
}

fn default_max_consecutive_failures() -> u32 {
    10
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_iteration_interval_ms: default_min_iteration_interval_ms(),
            error_backoff_base_ms: default_error_backoff_base_ms(),
            error_backoff_max_ms: default_error_backoff_max_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub maker: MakerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Resolve the config path: CLI flag > `SFMM_CONFIG` > default.
    pub fn resolve_path(cli: Option<String>) -> String {
        cli.or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load from a specific file and validate.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the quoting loop cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        let maker = &self.maker;
        if maker.alpha < Decimal::ZERO || maker.alpha > Decimal::ONE {
            return Err(AppError::Config(format!(
                "maker.alpha must be within [0, 1], got {}",
                maker.alpha
            )));
        }
        if maker.inventory_band <= 0 {
            return Err(AppError::Config(format!(
                "maker.inventory_band must be positive, got {}",
                maker.inventory_band
            )));
        }
        if maker.size_divisor <= 0 {
            return Err(AppError::Config(format!(
                "maker.size_divisor must be positive, got {}",
                maker.size_divisor
            )));
        }
        if maker.bid_base >= maker.ask_base {
            return Err(AppError::Config(format!(
                "maker.bid_base ({}) must be below maker.ask_base ({})",
                maker.bid_base, maker.ask_base
            )));
        }
        if self.market.instance_id.is_none() {
            for (name, value) in [
                ("venue", &self.market.venue),
                ("symbol", &self.market.symbol),
                ("account", &self.market.account),
            ] {
                if value.trim().is_empty() {
                    return Err(AppError::Config(format!(
                        "market.{name} is required when market.instance_id is not set"
                    )));
                }
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

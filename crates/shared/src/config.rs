//! Application configuration management.
//!
//! Values are layered: `config/default`, then `config/{RUN_MODE}`, then
//! `APEX__`-prefixed environment variables (e.g. `APEX__DATABASE__URL`).

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// What happens to the fee of a transaction when it is refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundFeePolicy {
    /// The fee stays with the platform; the counterparty gives back `net_amount`.
    #[default]
    Retain,
    /// The fee is returned too; the counterparty gives back `net_amount` and
    /// the platform absorbs `fee_amount`.
    Reverse,
}

/// Ledger behaviour knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// How many times a unit of work is retried after a serialization
    /// failure or deadlock before giving up with a conflict error.
    #[serde(default = "default_conflict_retry_attempts")]
    pub conflict_retry_attempts: u32,
    /// Processing attempts allowed before a transaction is marked failed.
    #[serde(default = "default_max_processing_retries")]
    pub max_processing_retries: u32,
    /// Fee handling on refund.
    #[serde(default)]
    pub refund_fee_policy: RefundFeePolicy,
}

fn default_conflict_retry_attempts() -> u32 {
    5
}

fn default_max_processing_retries() -> u32 {
    3
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            conflict_retry_attempts: default_conflict_retry_attempts(),
            max_processing_retries: default_max_processing_retries(),
            refund_fee_policy: RefundFeePolicy::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "apex=info,sea_orm=warn".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("APEX").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

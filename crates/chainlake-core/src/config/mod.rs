//! Application configuration with layered loading.
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by the `CHAINLAKE_CONFIG` env var
//! 3. **Environment variables**: `CHAINLAKE_*` vars override specific fields,
//!    with `__` separating nesting levels
//!
//! # Example
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! bind_port = 9091
//!
//! [chain]
//! latest_block_tag = 2
//! stable_block_tag = 1
//!
//! [chain.feature]
//! transaction_indexing = true
//!
//! [[api.auth_clients]]
//! token = "cl_live_..."
//! client_id = "indexer"
//! rcu_per_second = 1000
//! burst = 1000
//! ```

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthClient, AuthClients};
use crate::middleware::RateLimit;

/// gRPC server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind the server to. Defaults to `127.0.0.1`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port number to listen on. Defaults to `9090`.
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    9090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: default_bind_address(), bind_port: default_bind_port() }
    }
}

/// Read-surface settings: range limits, fetch parallelism, streaming pace
/// and admission budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Maximum number of blocks a payload range request may span. Defaults
    /// to `1000`.
    #[serde(default = "default_max_num_blocks")]
    pub max_num_blocks: u64,

    /// Maximum number of blocks a presigned-file range request may span.
    /// Defaults to `1000`.
    #[serde(default = "default_max_num_block_files")]
    pub max_num_block_files: u64,

    /// Parallel download workers for range payload fetches. Defaults to `10`.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Poll interval for event streaming, also the initial backoff interval.
    /// Defaults to `1000` ms.
    #[serde(default = "default_streaming_interval_ms")]
    pub streaming_interval_ms: u64,

    /// Maximum events fetched per streaming poll. Defaults to `500`.
    #[serde(default = "default_streaming_batch_size")]
    pub streaming_batch_size: u64,

    /// How long a stream may stay idle before it is aborted for the client
    /// to retry elsewhere. Defaults to `600000` ms (10 minutes).
    #[serde(default = "default_streaming_max_no_event_time_ms")]
    pub streaming_max_no_event_time_ms: u64,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Configured API consumers, keyed by bearer token.
    #[serde(default)]
    pub auth_clients: Vec<AuthClientConfig>,
}

fn default_max_num_blocks() -> u64 {
    1000
}

fn default_max_num_block_files() -> u64 {
    1000
}

fn default_num_workers() -> usize {
    10
}

fn default_streaming_interval_ms() -> u64 {
    1000
}

fn default_streaming_batch_size() -> u64 {
    500
}

fn default_streaming_max_no_event_time_ms() -> u64 {
    600_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_num_blocks: default_max_num_blocks(),
            max_num_block_files: default_max_num_block_files(),
            num_workers: default_num_workers(),
            streaming_interval_ms: default_streaming_interval_ms(),
            streaming_batch_size: default_streaming_batch_size(),
            streaming_max_no_event_time_ms: default_streaming_max_no_event_time_ms(),
            rate_limit: RateLimitConfig::default(),
            auth_clients: Vec::new(),
        }
    }
}

/// Admission budget for clients without a configured [`AuthClientConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Defaults to `200` RCU/s.
    #[serde(default = "default_rcu_per_second")]
    pub default_rcu_per_second: u32,

    /// Defaults to `200` RCUs.
    #[serde(default = "default_burst")]
    pub default_burst: u32,
}

fn default_rcu_per_second() -> u32 {
    200
}

fn default_burst() -> u32 {
    200
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_rcu_per_second: default_rcu_per_second(),
            default_burst: default_burst(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClientConfig {
    pub token: String,
    pub client_id: String,
    pub rcu_per_second: u32,
    pub burst: u32,
}

/// Schema-tag generations and optional features of the served chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Highest block tag the index serves. Defaults to `1`.
    #[serde(default = "default_tag")]
    pub latest_block_tag: u32,

    /// Block tag substituted when a request leaves the tag unset. Defaults
    /// to `1`.
    #[serde(default = "default_tag")]
    pub stable_block_tag: u32,

    /// Highest event tag the index serves. Defaults to `1`.
    #[serde(default = "default_tag")]
    pub latest_event_tag: u32,

    /// Event tag substituted when `default_stable_event` is on and a request
    /// leaves the event tag unset. Defaults to `1`.
    #[serde(default = "default_tag")]
    pub stable_event_tag: u32,

    #[serde(default)]
    pub feature: FeatureConfig,
}

fn default_tag() -> u32 {
    1
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            latest_block_tag: default_tag(),
            stable_block_tag: default_tag(),
            latest_event_tag: default_tag(),
            stable_event_tag: default_tag(),
            feature: FeatureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Serve `GetBlockByTransaction` / `GetNativeTransaction`. Off by
    /// default; chains without a transaction index answer `UNIMPLEMENTED`.
    #[serde(default)]
    pub transaction_indexing: bool,

    /// Serve `GetVerifiedAccountState`. Off by default.
    #[serde(default)]
    pub verified_account_state: bool,

    /// The chain ships a Rosetta parser; when off, Rosetta reads answer
    /// `UNIMPLEMENTED` before touching payload storage.
    #[serde(default)]
    pub rosetta_parser: bool,

    /// Map an unset event tag to `stable_event_tag` for event reads.
    #[serde(default)]
    pub default_stable_event: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g. "debug", "info", "warn"). Defaults to `"info"`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether the Prometheus exporter is installed. Defaults to `true`.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// Port for the Prometheus scrape endpoint. Defaults to `9102`.
    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_prometheus_port() -> u16 {
    9102
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: default_metrics_enabled(), prometheus_port: default_prometheus_port() }
    }
}

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Loads configuration from the `CHAINLAKE_CONFIG` file (when present)
    /// and `CHAINLAKE_*` environment overrides on top of compiled defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file or an override fails to parse.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("CHAINLAKE_CONFIG")
            .unwrap_or_else(|_| "config/chainlake.toml".to_string());

        Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("CHAINLAKE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Substitutes the stable block tag for an unset request tag.
    pub fn effective_block_tag(&self, tag: u32) -> u32 {
        if tag == 0 {
            self.chain.stable_block_tag
        } else {
            tag
        }
    }

    /// Substitutes the stable event tag for an unset request tag when the
    /// `default_stable_event` feature is on; otherwise passes through.
    pub fn effective_event_tag(&self, event_tag: u32) -> u32 {
        if self.chain.feature.default_stable_event && event_tag == 0 {
            self.chain.stable_event_tag
        } else {
            event_tag
        }
    }

    pub fn streaming_interval(&self) -> Duration {
        Duration::from_millis(self.api.streaming_interval_ms)
    }

    pub fn streaming_max_no_event_time(&self) -> Duration {
        Duration::from_millis(self.api.streaming_max_no_event_time_ms)
    }

    /// Builds the frozen token-to-client mapping.
    pub fn auth_clients(&self) -> AuthClients {
        AuthClients::new(self.api.auth_clients.iter().map(|client| {
            (
                client.token.clone(),
                AuthClient {
                    client_id: client.client_id.clone(),
                    rcu_per_second: client.rcu_per_second,
                    burst: client.burst,
                },
            )
        }))
    }

    pub fn default_rate_limit(&self) -> RateLimit {
        RateLimit {
            rcu_per_second: self.api.rate_limit.default_rcu_per_second,
            burst: self.api.rate_limit.default_burst,
        }
    }
}

//! Labeled counters for requests, errors and served items.
//!
//! Counters go through the `metrics` facade; the binary installs a
//! Prometheus recorder at startup. Recording is lock-free on the hot path,
//! and a process without an installed recorder (unit tests, library users)
//! turns every call into a no-op.

use std::net::Ipv4Addr;

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const FORMAT_FILE: &str = "file";
pub const FORMAT_RAW: &str = "raw";
pub const FORMAT_NATIVE: &str = "native";
pub const FORMAT_ROSETTA: &str = "rosetta";

pub const EVENT_TYPE_BLOCK_ADDED: &str = "block_added";
pub const EVENT_TYPE_BLOCK_REMOVED: &str = "block_removed";

/// Installs the Prometheus recorder with an HTTP scrape listener.
///
/// # Errors
///
/// Returns `BuildError` when a recorder is already installed or the listener
/// cannot bind.
pub fn install_exporter(port: u16) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener((Ipv4Addr::UNSPECIFIED, port))
        .install()
}

/// Counter surface of the serving tier.
///
/// Label sets are intentionally small: client ids are already sanitized into
/// a bounded vocabulary by the auth layer before they reach a label.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerMetrics;

impl ServerMetrics {
    pub fn new() -> Self {
        Self
    }

    /// One increment per completed RPC, success or not.
    pub fn record_request(&self, service: &str, method: &str, client_id: &str, status: &str) {
        counter!(
            "chainlake_requests_total",
            "service" => service.to_string(),
            "method" => method.to_string(),
            "client_id" => client_id.to_string(),
            "status" => status.to_string(),
        )
        .increment(1);
    }

    /// One increment per error leaving the boundary mapper.
    pub fn record_error(&self, method: &str, status: &str) {
        counter!(
            "chainlake_errors_total",
            "method" => method.to_string(),
            "status" => status.to_string(),
        )
        .increment(1);
    }

    pub fn record_blocks_served(&self, format: &'static str, client_id: &str, count: u64) {
        counter!(
            "chainlake_blocks_served_total",
            "format" => format,
            "client_id" => client_id.to_string(),
        )
        .increment(count);
    }

    pub fn record_events_served(
        &self,
        event_type: &'static str,
        client_id: &str,
        event_tag: u32,
        count: u64,
    ) {
        counter!(
            "chainlake_events_served_total",
            "event_type" => event_type,
            "client_id" => client_id.to_string(),
            "event_tag" => event_tag.to_string(),
        )
        .increment(count);
    }

    pub fn record_transactions_served(&self, format: &'static str, client_id: &str, count: u64) {
        counter!(
            "chainlake_transactions_served_total",
            "format" => format,
            "client_id" => client_id.to_string(),
        )
        .increment(count);
    }

    pub fn record_account_state_served(&self, client_id: &str, count: u64) {
        counter!(
            "chainlake_account_state_served_total",
            "client_id" => client_id.to_string(),
        )
        .increment(count);
    }
}

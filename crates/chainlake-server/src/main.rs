use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chainlake_core::api::chain_lake_server::ChainLakeServer;
use chainlake_core::client::UnconfiguredChainClient;
use chainlake_core::config::AppConfig;
use chainlake_core::metrics::{self, ServerMetrics};
use chainlake_core::middleware::Throttler;
use chainlake_core::parser::UnimplementedParser;
use chainlake_core::storage::memory::{
    InMemoryBlobStorage, InMemoryMetaStorage, InMemoryTransactionStorage,
};
use chainlake_server::middleware::AdmissionLayer;
use chainlake_server::Server;

// Keepalive pings detect dead peers on long-lived streams.
const KEEPALIVE_TIME: Duration = Duration::from_secs(5);
const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(5);

fn init_logging(config: &AppConfig) {
    let level = &config.logging.level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,chainlake_core={level},chainlake_server={level}"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format.as_str() == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_target(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(AppConfig::load().context("failed to load configuration")?);
    init_logging(&config);

    if config.metrics.enabled {
        metrics::install_exporter(config.metrics.prometheus_port)
            .context("failed to install metrics exporter")?;
    }

    // The dev profile serves from the in-memory backends; production
    // deployments wire the object-store and index clients here instead.
    let meta = Arc::new(InMemoryMetaStorage::new());
    let blob = Arc::new(InMemoryBlobStorage::default());
    let transactions = Arc::new(InMemoryTransactionStorage::new());

    let server = Server::new(
        Arc::clone(&config),
        meta,
        blob,
        transactions,
        Arc::new(UnimplementedParser),
        Arc::new(UnconfiguredChainClient),
    );
    let shutdown = server.shutdown_token();

    let auth_clients = Arc::new(config.auth_clients());
    let throttler = Arc::new(Throttler::new(config.default_rate_limit(), &auth_clients));
    let admission = AdmissionLayer::new(throttler, auth_clients, ServerMetrics::new());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.bind_port)
        .parse()
        .context("invalid bind address")?;

    info!(
        %addr,
        latest_block_tag = config.chain.latest_block_tag,
        latest_event_tag = config.chain.latest_event_tag,
        "starting chainlake server"
    );

    tonic::transport::Server::builder()
        .http2_keepalive_interval(Some(KEEPALIVE_TIME))
        .http2_keepalive_timeout(Some(KEEPALIVE_TIMEOUT))
        .layer(admission)
        .add_service(ChainLakeServer::new(server))
        .serve_with_shutdown(addr, async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received, draining streams");
            // Streams observe the token and end with a retryable status;
            // unary calls in flight complete before the server stops.
            shutdown.cancel();
        })
        .await
        .context("server terminated")?;

    info!("server stopped");
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{error, info};

use dnsfwd::cache::ResponseCache;
use dnsfwd::config::Config;
use dnsfwd::error::StartupError;
use dnsfwd::logging;
use dnsfwd::metrics::Metrics;
use dnsfwd::pending::PendingTable;
use dnsfwd::server::{Forwarder, run_egress, run_ingress};
use dnsfwd::sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./dnsfwd.toml"));
    let config = Config::load(&config_path).map_err(StartupError::ConfigLoadFailed)?;

    let client_socket = UdpSocket::bind(&config.listen_addr)
        .await
        .map_err(|source| StartupError::BindFailed {
            addr: config.listen_addr.clone(),
            source,
        })?;
    info!(addr = %config.listen_addr, "listening for client queries");

    let upstream_socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|source| StartupError::UpstreamBindFailed { source })?;
    upstream_socket
        .connect(&config.upstream_addr)
        .await
        .map_err(|source| StartupError::DialFailed {
            addr: config.upstream_addr.clone(),
            source,
        })?;
    info!(addr = %config.upstream_addr, "forwarding to upstream");

    let metrics = Metrics::new();
    let pending = Arc::new(PendingTable::new(Duration::from_millis(
        config.pending_timeout_ms,
    )));
    let forwarder = Arc::new(Forwarder {
        client_socket: Arc::new(client_socket),
        upstream_socket: Arc::new(upstream_socket),
        cache: ResponseCache::new(config.cache_max_cost, config.cache_counters),
        pending: pending.clone(),
        metrics: metrics.clone(),
    });

    tokio::spawn(run_ingress(forwarder.clone()));
    tokio::spawn(run_egress(forwarder.clone()));
    tokio::spawn(sweeper::run(
        pending,
        Duration::from_millis(config.sweeper_interval_ms),
    ));

    if !config.metrics_addr.is_empty() {
        let metrics_addr = config.metrics_addr.clone();
        let metrics_router = dnsfwd::metrics::router(metrics.clone());
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(&metrics_addr).await {
                Ok(listener) => {
                    info!(addr = %metrics_addr, "metrics endpoint listening");
                    if let Err(e) = axum::serve(listener, metrics_router).await {
                        error!("metrics server error: {e}");
                    }
                }
                Err(e) => error!("failed to bind metrics endpoint on {metrics_addr}: {e}"),
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    info!(snapshot = %forwarder.metrics.snapshot(), "shutting down");
    Ok(())
}

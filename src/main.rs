use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use callback_relay::config::ServiceConfig;
use callback_relay::server::{self, AppState};
use callback_relay::store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = store::open(config.store_backend, &config.data_dir).with_context(|| {
        format!(
            "failed to open {:?} store at {}",
            config.store_backend,
            config.data_dir.display()
        )
    })?;
    let mode = config.namespace_mode();
    info!(backend = ?config.store_backend, ?mode, "Store ready");

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let shutdown = CancellationToken::new();
    tokio::spawn(server::shutdown_signal(shutdown.clone()));

    server::serve(listener, AppState::with_store(store, mode), shutdown)
        .await
        .context("server error")
}

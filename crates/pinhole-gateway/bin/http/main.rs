mod cli;

use crate::cli::{LogFormatArg, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use pinhole_core::{RecordLog, Shortener, DOMAIN_SIZE};
use pinhole_gateway::{App, AppState};
use pinhole_shortener::ShortenerService;
use pinhole_storage::{FileLog, InMemoryLog, IndexStore, StoreSettings};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        public_base_url = %config.public_base_url,
        "starting pinhole"
    );

    let settings = StoreSettings::builder()
        .limit(config.code_limit.unwrap_or(DOMAIN_SIZE))
        .build();

    match config.storage {
        StorageBackendArg::File => {
            let log = FileLog::open(&config.data_file)
                .await
                .with_context(|| format!("failed to open {}", config.data_file.display()))?;
            run_server(config.listen_addr, config.public_base_url, log, settings).await
        }
        StorageBackendArg::InMemory => {
            run_server(
                config.listen_addr,
                config.public_base_url,
                InMemoryLog::new(),
                settings,
            )
            .await
        }
    }
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

async fn run_server<L: RecordLog>(
    listen_addr: SocketAddr,
    public_base_url: String,
    log: L,
    settings: StoreSettings,
) -> anyhow::Result<()> {
    // A damaged medium stops startup here instead of guessing a counter.
    let store = IndexStore::open_with(log, settings)
        .await
        .context("failed to recover index store")?;
    let shortener: Arc<dyn Shortener> = Arc::new(ShortenerService::new(store));
    let state = AppState::new(shortener, public_base_url);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "starting gateway server");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}

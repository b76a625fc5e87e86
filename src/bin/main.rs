//! Inferd binary.
//!
//! Entry point for the inferd daemon, which serves content-addressed models
//! over HTTP with verifiable inference digests.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use inferd_core::config::{Args, ServiceConfig};
use inferd_core::models::ModelLoader;
use inferd_core::runtime::{Device, WorkerEngineProvider};
use inferd_core::server::{self, state::AppState};
use inferd_core::store::{ContentStore, GatewayStore, LocalStore};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .parse_lossy(
                    args.log_filter
                        .as_deref()
                        .unwrap_or("inferd=info,inferd_core=info"),
                ),
        )
        .with_target(true)
        .init();

    info!("Inferd starting up");

    let config = ServiceConfig::load(&args)?;
    let addr = config.socket_addr()?;

    let store: Arc<dyn ContentStore> = match config.store.kind.as_str() {
        "local" => Arc::new(LocalStore::new(&config.store.root)),
        "gateway" => Arc::new(GatewayStore::new(
            config.store.gateway_url.as_str(),
            &config.store.staging_dir,
        )?),
        other => bail!("Unknown store kind '{}' (expected 'local' or 'gateway')", other),
    };
    info!("Using {} content store", config.store.kind);

    let device = Device::parse(&config.engine.device);
    info!(
        "Generation worker at {} (device: {})",
        config.engine.endpoint, config.engine.device
    );
    let provider = Arc::new(WorkerEngineProvider::new(
        config.engine.endpoint.as_str(),
        Duration::from_secs(config.engine.connect_timeout_secs),
    )?);

    let loader = ModelLoader::new(store, provider, device);
    let state = AppState::new(config, loader).await;

    server::start_server(addr, state).await
}

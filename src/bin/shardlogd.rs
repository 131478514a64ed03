//! shardlog HTTP daemon
//!
//! Environment:
//! - `SHARDLOG_CONFIG`: optional TOML config file (requires the `toml` feature)
//! - `SHARDLOG_BIND`: bind address override
//! - `SHARDLOG_LOG_PATH`: log file override
//! - `RUST_LOG`: tracing filter, `info` when unset

use std::sync::Arc;

use anyhow::Context;
use shardlog::{server, KvService, StoreConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config()?;
    config.validate()?;
    tracing::debug!("\n{}", config.to_string_pretty());

    let service = Arc::new(
        KvService::open(&config)
            .with_context(|| format!("failed to open log sink {:?}", config.log_path))?,
    );

    server::serve(service.clone(), &config.bind_addr, shutdown_signal()).await?;

    let last = service.close()?;
    tracing::info!("\n{}", service.metrics().get_report());
    tracing::info!(last_sequence_id = last, "shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config() -> anyhow::Result<StoreConfig> {
    let mut config = match std::env::var("SHARDLOG_CONFIG") {
        Ok(path) => from_file(&path)?,
        Err(_) => StoreConfig::default(),
    };

    if let Ok(addr) = std::env::var("SHARDLOG_BIND") {
        config = config.with_bind_addr(addr);
    }
    if let Ok(path) = std::env::var("SHARDLOG_LOG_PATH") {
        config = config.with_log_path(path);
    }

    Ok(config)
}

#[cfg(feature = "toml")]
fn from_file(path: &str) -> anyhow::Result<StoreConfig> {
    StoreConfig::from_toml_file(path).with_context(|| format!("failed to load config from {}", path))
}

#[cfg(not(feature = "toml"))]
fn from_file(path: &str) -> anyhow::Result<StoreConfig> {
    anyhow::bail!("cannot read {}: built without the `toml` feature", path)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {}
                    _ = sigterm.recv() => {}
                }
            }
            _ => {
                tracing::warn!("failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        }
    }

    tracing::info!("shutdown signal received");
}

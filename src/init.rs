// Initialization utilities for the dump run
//
// Logging/tracing setup and the collaborators built from RuntimeConfig

use anyhow::{Context, Result};
use promdump_client::PrometheusClient;
use promdump_config::{LogConfig, LogFormat, RuntimeConfig};
use promdump_writer::SnapshotWriter;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging from LogConfig
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*};

    let registry = tracing_subscriber::registry().with(level_filter(config));

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_writer(std::io::stderr)),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_writer(std::io::stderr)),
        ),
    };
}

/// Filter for the configured level, falling back to `info` when it does not parse
fn level_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build the Prometheus client from RuntimeConfig
pub(crate) fn init_client(config: &RuntimeConfig) -> Result<PrometheusClient> {
    let client = PrometheusClient::new(&config.source.url, config.source.timeout())
        .context("Failed to create Prometheus client")?;
    info!(
        endpoint = client.endpoint(),
        timeout_secs = config.source.timeout_secs,
        "Querying Prometheus"
    );
    Ok(client)
}

/// Build the snapshot writer from RuntimeConfig
pub(crate) fn init_writer(config: &RuntimeConfig) -> Result<SnapshotWriter> {
    promdump_writer::initialize_writer(&config.storage, &config.dump.out)
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))
}

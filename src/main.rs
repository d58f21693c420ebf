use anyhow::{Context, Result};
use clap::Parser;
use promdump_config::RuntimeConfig;
use std::path::PathBuf;
use tracing::info;

/// Dump a Prometheus metric over a time period into JSON snapshot files
#[derive(Parser)]
#[command(name = "promdump")]
#[command(version)]
#[command(about = "Dump a Prometheus metric over a time period into JSON snapshot files", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Prometheus server URL
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// End of the dumped period as RFC3339 (defaults to now)
    #[arg(long, value_name = "RFC3339")]
    timestamp: Option<String>,

    /// Total period to dump, e.g. 7d
    #[arg(long, value_name = "DURATION")]
    period: Option<String>,

    /// Lookback of each query, e.g. 24h
    #[arg(long, value_name = "DURATION")]
    batch: Option<String>,

    /// Metric selector to dump, may include label matchers
    #[arg(long, value_name = "SELECTOR")]
    metric: Option<String>,

    /// Output file prefix; files are named <out>.00000, <out>.00001, ...
    #[arg(long, value_name = "PREFIX")]
    out: Option<String>,

    /// Number of batches written to each file
    #[arg(long, value_name = "N")]
    batches_per_file: Option<u64>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, cli);

    // Step 3: Logging first so validation warnings are visible
    promdump::init_tracing(&config.log);

    // Step 4: Validate before any query is issued
    config.validate()?;

    // Queries run strictly one after another; a single thread is enough
    let summary = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(promdump::run_with_config(&config))?;

    info!(
        files = summary.files.len(),
        series = summary.series,
        points = summary.points,
        "Finished dumping {}",
        config.dump.metric
    );

    Ok(())
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: Cli) {
    if let Some(url) = cli.url {
        config.source.url = url;
    }
    if let Some(timestamp) = cli.timestamp {
        // An empty timestamp means "now"
        config.dump.timestamp = Some(timestamp).filter(|ts| !ts.is_empty());
    }
    if let Some(period) = cli.period {
        config.dump.period = period;
    }
    if let Some(batch) = cli.batch {
        config.dump.batch = batch;
    }
    if let Some(metric) = cli.metric {
        config.dump.metric = metric;
    }
    if let Some(out) = cli.out {
        config.dump.out = out;
    }
    if let Some(batches_per_file) = cli.batches_per_file {
        config.dump.batches_per_file = batches_per_file;
    }
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overridden(args: &[&str]) -> RuntimeConfig {
        let cli = Cli::parse_from(std::iter::once("promdump").chain(args.iter().copied()));
        let mut config = RuntimeConfig::default();
        config.dump.timestamp = Some("2024-01-01T00:00:00Z".to_string());
        apply_cli_overrides(&mut config, cli);
        config
    }

    #[test]
    fn empty_timestamp_means_now() {
        let config = overridden(&["--timestamp", ""]);
        assert_eq!(config.dump.timestamp, None);
    }

    #[test]
    fn flags_override_config() {
        let config = overridden(&[
            "--timestamp",
            "2024-01-15T12:00:00Z",
            "--metric",
            "up",
            "--batches-per-file",
            "3",
            "--log-level",
            "debug",
        ]);
        assert_eq!(
            config.dump.timestamp.as_deref(),
            Some("2024-01-15T12:00:00Z")
        );
        assert_eq!(config.dump.metric, "up");
        assert_eq!(config.dump.batches_per_file, 3);
        assert_eq!(config.log.level, "debug");
    }
}

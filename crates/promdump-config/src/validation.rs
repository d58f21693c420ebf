// Configuration validation
//
// Everything here runs before the first query is issued, so a bad flag never
// leaves partial output behind.

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_source_config(&config.source)?;
    validate_dump_config(&config.dump)?;
    validate_storage_config(&config.storage)?;
    validate_log_config(&config.log)?;
    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<()> {
    let url = url::Url::parse(&config.url)
        .map_err(|e| anyhow::anyhow!("source.url '{}' is not a valid URL: {}", config.url, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("source.url must use http or https, got '{}'", url.scheme());
    }

    if config.timeout_secs == 0 {
        bail!("source.timeout_secs must be greater than 0");
    }

    Ok(())
}

fn validate_dump_config(config: &DumpConfig) -> Result<()> {
    if config.metric.trim().is_empty() || config.out.trim().is_empty() {
        bail!("Please specify --metric and --out");
    }

    let period = config.period()?;
    let batch = config.batch()?;

    if period.is_zero() {
        bail!("dump.period must be greater than 0");
    }
    if batch.is_zero() {
        bail!("dump.batch must be greater than 0");
    }
    if period.subsec_nanos() != 0 || batch.subsec_nanos() != 0 {
        bail!("--period and --batch must not have fractional seconds");
    }

    if config.batches_per_file == 0 {
        bail!("dump.batches_per_file must be greater than 0");
    }

    if let Some(ts) = &config.timestamp {
        parse_timestamp(ts)?;
    }

    if batch > period {
        warn!(
            period = %config.period,
            batch = %config.batch,
            "dump.batch is longer than dump.period; a single query will cover the period"
        );
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::Fs => {
            if let Some(fs) = &config.fs {
                if fs.path.is_empty() {
                    bail!("storage.fs.path must not be empty");
                }
            }
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("s3 storage backend requires 's3' configuration"))?;

            if s3.bucket.is_empty() {
                bail!("storage.s3.bucket is required for S3 backend");
            }

            if s3.region.is_empty() {
                bail!("storage.s3.region is required for S3 backend");
            }
        }
    }

    Ok(())
}

fn validate_log_config(config: &LogConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        bail!("log.level must not be empty");
    }
    Ok(())
}

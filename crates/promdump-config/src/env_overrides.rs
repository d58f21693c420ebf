use super::{FsConfig, LogFormat, RuntimeConfig, S3Config, StorageBackend};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "PROMDUMP_";

/// Abstraction over environment-variable lookups so tests can supply their own
/// source of overrides.
pub trait EnvSource {
    /// Get a variable by its name without the PROMDUMP_ prefix
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Query source
    if let Some(url) = env.get("URL") {
        config.source.url = url;
    }
    if let Some(val) = get_env_u64(env, "QUERY_TIMEOUT_SECS")? {
        config.source.timeout_secs = val;
    }

    // Dump parameters
    if let Some(metric) = env.get("METRIC") {
        config.dump.metric = metric;
    }
    if let Some(out) = env.get("OUT") {
        config.dump.out = out;
    }
    if let Some(period) = env.get("PERIOD") {
        config.dump.period = period;
    }
    if let Some(batch) = env.get("BATCH") {
        config.dump.batch = batch;
    }
    if let Some(val) = get_env_u64(env, "BATCHES_PER_FILE")? {
        config.dump.batches_per_file = val;
    }
    if let Some(timestamp) = env.get("TIMESTAMP") {
        config.dump.timestamp = Some(timestamp).filter(|ts| !ts.is_empty());
    }

    // Storage backend
    if let Some(backend) = env.get("STORAGE_BACKEND") {
        config.storage.backend = backend
            .parse::<StorageBackend>()
            .context("Invalid PROMDUMP_STORAGE_BACKEND value")?;
    }
    if let Some(path) = env.get("STORAGE_PATH") {
        config.storage.fs.get_or_insert_with(FsConfig::default).path = path;
    }
    if let Some(bucket) = env.get("S3_BUCKET") {
        ensure_s3(config).bucket = bucket;
    }
    if let Some(region) = env.get("S3_REGION") {
        ensure_s3(config).region = region;
    }
    if let Some(endpoint) = env.get("S3_ENDPOINT") {
        ensure_s3(config).endpoint = Some(endpoint);
    }

    // Logging
    if let Some(level) = env.get("LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.log.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    Ok(())
}

fn ensure_s3(config: &mut RuntimeConfig) -> &mut S3Config {
    config.storage.s3.get_or_insert_with(|| S3Config {
        bucket: String::new(),
        region: String::new(),
        endpoint: None,
    })
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match env.get(key) {
        Some(val) => {
            let parsed = val
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

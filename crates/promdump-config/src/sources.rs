// Configuration source loading.
//
// Priority order:
// 1. Environment variables (PROMDUMP_* prefix)
// 2. Config file path from PROMDUMP_CONFIG
// 3. Default config file (./promdump.toml)
// 4. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "./promdump.toml";

/// Load configuration from the standard locations, falling back to defaults.
pub fn load_config() -> Result<RuntimeConfig> {
    let mut config = match env::var(format!("{}CONFIG", ENV_PREFIX)) {
        Ok(path) => read_file(Path::new(&path))?,
        Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            read_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        Err(_) => RuntimeConfig::default(),
    };

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

/// Load configuration from a specific file path (for the --config flag).
/// Returns error if the file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let mut config = read_file(path.as_ref())?;
    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[source]
url = "http://prometheus.internal:9090"
timeout_secs = 5

[dump]
metric = "node_load1"
out = "dumps/load"
period = "2h"
batch = "30m"
batches_per_file = 2
"#
        )
        .unwrap();

        let config = read_file(file.path()).unwrap();
        assert_eq!(config.source.url, "http://prometheus.internal:9090");
        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.dump.metric, "node_load1");
        assert_eq!(config.dump.batches_per_file, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_file(Path::new("/nonexistent/promdump.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dump\nmetric = ").unwrap();
        let err = read_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}

//! Storage operator construction
//!
//! On the filesystem backend the output prefix is joined onto the storage
//! root and the operator is rooted at the resulting parent directory, so
//! `..` in a relative prefix is honoured. On S3 the prefix is an object key
//! and must not step outside the bucket root.

use promdump_config::{StorageBackend, StorageConfig};
use std::path::{Component, Path, PathBuf};
use tracing::info;

use crate::error::{Result, WriterError};

/// Operator root and the file prefix relative to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    pub root: String,
    pub prefix: String,
}

/// Work out where files for `out` land on the configured backend.
pub fn resolve_output(config: &StorageConfig, out: &str) -> Result<OutputLocation> {
    let path = Path::new(out);
    if path.file_name().is_none() || out.ends_with('/') {
        return Err(WriterError::invalid_config(format!(
            "output prefix '{}' must end with a file name",
            out
        )));
    }

    match config.backend {
        StorageBackend::Fs => {
            let base = config.fs.clone().unwrap_or_default().path;
            let base = std::path::absolute(&base).map_err(|e| {
                WriterError::invalid_config(format!("Invalid storage.fs.path '{}': {}", base, e))
            })?;
            let target = normalize(&base.join(path));

            let prefix = target
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    WriterError::invalid_config(format!(
                        "output prefix '{}' must end with a file name",
                        out
                    ))
                })?;
            let root = target
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| "/".to_string());
            Ok(OutputLocation { root, prefix })
        }
        StorageBackend::S3 => Ok(OutputLocation {
            root: "/".to_string(),
            prefix: object_key(path, out)?,
        }),
    }
}

/// Lexically resolve `.` and `..` in an absolute path.
fn normalize(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}

fn object_key(path: &Path, out: &str) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(WriterError::invalid_config(format!(
                    "output prefix '{}' must not leave the bucket root",
                    out
                )))
            }
        }
    }
    Ok(parts.join("/"))
}

/// Build an OpenDAL operator rooted at `root` for the configured backend.
pub fn build_operator(config: &StorageConfig, root: &str) -> Result<opendal::Operator> {
    let operator = match config.backend {
        StorageBackend::Fs => {
            info!("Using filesystem storage at: {}", root);
            let fs_builder = opendal::services::Fs::default().root(root);
            opendal::Operator::new(fs_builder)
                .map_err(|e| {
                    WriterError::invalid_config(format!(
                        "Failed to create filesystem operator: {}",
                        e
                    ))
                })?
                .finish()
        }
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                WriterError::invalid_config("s3 config required for S3 backend")
            })?;
            info!(
                "Using S3 storage: bucket={}, region={}",
                s3.bucket, s3.region
            );

            let mut s3_builder = opendal::services::S3::default()
                .bucket(&s3.bucket)
                .region(&s3.region)
                .root(root);

            if let Some(endpoint) = &s3.endpoint {
                s3_builder = s3_builder.endpoint(endpoint);
            }

            opendal::Operator::new(s3_builder)
                .map_err(|e| {
                    WriterError::invalid_config(format!("Failed to create S3 operator: {}", e))
                })?
                .finish()
        }
    };

    Ok(operator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promdump_config::{FsConfig, S3Config};

    fn fs_config(path: &str) -> StorageConfig {
        StorageConfig {
            backend: StorageBackend::Fs,
            fs: Some(FsConfig {
                path: path.to_string(),
            }),
            s3: None,
        }
    }

    #[test]
    fn relative_prefix_is_joined_onto_fs_root() {
        let location = resolve_output(&fs_config("/var/lib/promdump"), "./dumps/cpu").unwrap();
        assert_eq!(location.root, "/var/lib/promdump/dumps");
        assert_eq!(location.prefix, "cpu");
    }

    #[test]
    fn parent_components_leave_the_fs_root() {
        let location = resolve_output(&fs_config("/data/work"), "../archive/up").unwrap();
        assert_eq!(location.root, "/data/archive");
        assert_eq!(location.prefix, "up");

        let location = resolve_output(&fs_config("/data/work"), "a/../../up").unwrap();
        assert_eq!(location.root, "/data");
        assert_eq!(location.prefix, "up");
    }

    #[test]
    fn absolute_prefix_reroots_fs() {
        let location = resolve_output(&StorageConfig::default(), "/tmp/dumps/cpu").unwrap();
        assert_eq!(location.root, "/tmp/dumps");
        assert_eq!(location.prefix, "cpu");
    }

    #[test]
    fn s3_prefix_is_a_key() {
        let config = StorageConfig {
            backend: StorageBackend::S3,
            fs: None,
            s3: Some(S3Config {
                bucket: "metrics".to_string(),
                region: "us-east-1".to_string(),
                endpoint: None,
            }),
        };

        let location = resolve_output(&config, "/exports/cpu").unwrap();
        assert_eq!(location.root, "/");
        assert_eq!(location.prefix, "exports/cpu");

        let err = resolve_output(&config, "../exports/cpu").unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::E001InvalidConfig);
    }

    #[test]
    fn prefix_must_name_a_file() {
        assert!(resolve_output(&StorageConfig::default(), "dumps/").is_err());
        assert!(resolve_output(&StorageConfig::default(), "..").is_err());
    }

    #[test]
    fn s3_backend_requires_section() {
        let config = StorageConfig {
            backend: StorageBackend::S3,
            fs: None,
            s3: None,
        };
        let err = build_operator(&config, "/").unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::E001InvalidConfig);
    }
}

//! Snapshot writer for promdump
//!
//! Serializes accumulated series to numbered JSON snapshot files on the
//! configured storage backend (local filesystem or S3).

mod error;
mod storage;
mod write;

use promdump_config::StorageConfig;
use tracing::info;

pub use error::{ErrorCode, Result, WriterError};
pub use storage::{build_operator, resolve_output, OutputLocation};
pub use write::{snapshot_path, SnapshotWriter};

/// Initialize a snapshot writer for the output prefix `out`
pub fn initialize_writer(config: &StorageConfig, out: &str) -> Result<SnapshotWriter> {
    info!(
        "Initializing writer with storage backend: {}",
        config.backend
    );

    let location = resolve_output(config, out)?;
    let operator = build_operator(config, &location.root)?;

    info!(
        root = %location.root,
        prefix = %location.prefix,
        "Snapshot files will be written as {}",
        snapshot_path(&location.prefix, 0)
    );

    Ok(SnapshotWriter::new(operator, location.prefix))
}

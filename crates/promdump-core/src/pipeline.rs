// Collaborator seams for the dump pipeline
//
// Implementations:
// - PrometheusClient (promdump-client): HTTP instant queries
// - SnapshotWriter (promdump-writer): JSON snapshot files via OpenDAL

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{QueryValue, SampleSeries};

/// Backend that evaluates a range selector at a single instant.
#[async_trait]
pub trait QuerySource: Send + Sync {
    /// Evaluate `expression` with a lookback of `lookback_secs` ending at `instant`.
    async fn query(
        &self,
        expression: &str,
        instant: DateTime<Utc>,
        lookback_secs: f64,
    ) -> Result<QueryValue>;
}

/// Destination for accumulated series.
#[async_trait]
pub trait SeriesSink: Send + Sync {
    /// Persist `series` as file number `file_index`.
    ///
    /// Returns `None` without writing anything when `series` is empty.
    async fn write(&self, series: &[SampleSeries], file_index: u64) -> Result<Option<WrittenFile>>;
}

/// Metadata of a snapshot file that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: String,
    pub file_index: u64,
    pub series_count: usize,
    pub point_count: usize,
    pub file_size: u64,
    /// Blake3 hash of the file contents, hex encoded
    pub content_hash: String,
}

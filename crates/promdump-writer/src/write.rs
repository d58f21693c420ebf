//! Snapshot file writes
//!
//! Each flush produces one write-once object named `<prefix>.<index:05>`
//! holding the buffered series as a JSON array.

use async_trait::async_trait;
use promdump_core::{SampleSeries, SeriesSink, WrittenFile};
use tracing::{debug, info};

use crate::error::{Result, WriterError};

/// File name for snapshot number `file_index`.
pub fn snapshot_path(prefix: &str, file_index: u64) -> String {
    format!("{}.{:05}", prefix, file_index)
}

/// Writes buffered series to snapshot files through an OpenDAL operator
#[derive(Clone, Debug)]
pub struct SnapshotWriter {
    operator: opendal::Operator,
    prefix: String,
}

impl SnapshotWriter {
    pub fn new(operator: opendal::Operator, prefix: impl Into<String>) -> Self {
        Self {
            operator,
            prefix: prefix.into(),
        }
    }

    pub fn operator(&self) -> &opendal::Operator {
        &self.operator
    }

    pub fn path_for(&self, file_index: u64) -> String {
        snapshot_path(&self.prefix, file_index)
    }

    /// Write `series` as snapshot `file_index`.
    ///
    /// An empty slice writes nothing and returns `Ok(None)`.
    pub async fn write_series(
        &self,
        series: &[SampleSeries],
        file_index: u64,
    ) -> Result<Option<WrittenFile>> {
        if series.is_empty() {
            return Ok(None);
        }

        let path = self.path_for(file_index);
        let bytes = serde_json::to_vec(series).map_err(|e| WriterError::encoding(&path, e))?;
        let content_hash = blake3::hash(&bytes).to_hex().to_string();
        let file_size = bytes.len() as u64;
        let point_count = series.iter().map(|s| s.points.len()).sum();

        debug!(path = %path, bytes = file_size, "Writing snapshot file");

        self.operator
            .write(&path, bytes)
            .await
            .map_err(|e| WriterError::write_failure(&path, e))?;

        info!(
            path = %path,
            series = series.len(),
            points = point_count,
            bytes = file_size,
            blake3 = %content_hash,
            "Wrote snapshot file"
        );

        Ok(Some(WrittenFile {
            path,
            file_index,
            series_count: series.len(),
            point_count,
            file_size,
            content_hash,
        }))
    }

    /// Read snapshot `file_index` back into series.
    pub async fn read_series(&self, file_index: u64) -> Result<Vec<SampleSeries>> {
        let path = self.path_for(file_index);
        let buffer = self
            .operator
            .read(&path)
            .await
            .map_err(|e| WriterError::write_failure(&path, e))?;
        serde_json::from_slice(&buffer.to_vec()).map_err(|e| WriterError::encoding(&path, e))
    }

    /// Whether snapshot `file_index` exists.
    pub async fn exists(&self, file_index: u64) -> Result<bool> {
        let path = self.path_for(file_index);
        self.operator
            .exists(&path)
            .await
            .map_err(|e| WriterError::write_failure(&path, e))
    }
}

#[async_trait]
impl SeriesSink for SnapshotWriter {
    async fn write(&self, series: &[SampleSeries], file_index: u64) -> anyhow::Result<Option<WrittenFile>> {
        Ok(self.write_series(series, file_index).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promdump_core::{Labels, SamplePair};

    fn memory_writer(prefix: &str) -> SnapshotWriter {
        let operator = opendal::Operator::new(opendal::services::Memory::default())
            .unwrap()
            .finish();
        SnapshotWriter::new(operator, prefix)
    }

    fn series(job: &str, points: &[(i64, f64)]) -> SampleSeries {
        let mut labels = Labels::new();
        labels.insert("__name__".to_string(), "up".to_string());
        labels.insert("job".to_string(), job.to_string());
        SampleSeries::new(
            labels,
            points
                .iter()
                .map(|&(ts, v)| SamplePair::new(ts, v))
                .collect(),
        )
    }

    #[test]
    fn paths_are_zero_padded() {
        assert_eq!(snapshot_path("dumps/up", 0), "dumps/up.00000");
        assert_eq!(snapshot_path("up", 42), "up.00042");
        assert_eq!(snapshot_path("up", 123_456), "up.123456");
    }

    #[tokio::test]
    async fn empty_buffer_writes_nothing() {
        let writer = memory_writer("dumps/up");
        let result = writer.write_series(&[], 0).await.unwrap();

        assert!(result.is_none());
        assert!(!writer.exists(0).await.unwrap());
    }

    #[tokio::test]
    async fn written_file_round_trips() {
        let writer = memory_writer("dumps/up");
        let buffer = vec![
            series("node", &[(1_000, 1.0), (16_000, 0.0)]),
            series("api", &[(1_000, 1.0)]),
            series("node", &[(31_000, 1.0)]),
        ];

        let written = writer.write_series(&buffer, 3).await.unwrap().unwrap();
        assert_eq!(written.path, "dumps/up.00003");
        assert_eq!(written.series_count, 3);
        assert_eq!(written.point_count, 4);
        assert_eq!(written.content_hash.len(), 64);

        let read_back = writer.read_series(3).await.unwrap();
        assert_eq!(read_back, buffer);
    }

    #[tokio::test]
    async fn file_contents_use_prometheus_encoding() {
        let writer = memory_writer("up");
        writer
            .write_series(&[series("node", &[(1_500, 2.5)])], 0)
            .await
            .unwrap();

        let bytes = writer.operator().read("up.00000").await.unwrap().to_vec();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"metric": {"__name__": "up", "job": "node"}, "values": [[1.5, "2.5"]]}
            ])
        );
    }
}

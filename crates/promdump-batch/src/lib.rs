// promdump-batch - Accumulate window results and rotate snapshot files
//
// Windows are queried strictly in order. The series of each window are
// appended to an in-memory buffer; after every `batches_per_file` windows the
// buffer is handed to the sink as the next file and cleared. One final flush
// after the last window covers the remainder.
//
// The file index advances on every flush, including flushes of an empty
// buffer that write nothing, so file numbers can have gaps.

mod buffered_batch;

use anyhow::{bail, Context, Result};
use promdump_core::{
    QuerySource, QueryValue, SampleSeries, SeriesSink, TimeWindow, ValueType, WrittenFile,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use buffered_batch::SeriesBuffer;

/// Settings for one dump run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Metric selector the range lookback is applied to
    pub expression: String,
    /// Number of windows accumulated into each file
    pub batches_per_file: u64,
}

/// The backend answered with something other than a range vector.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Expected matrix value type; got {actual}")]
pub struct UnexpectedValueType {
    pub actual: ValueType,
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub windows: usize,
    pub queried: usize,
    pub skipped: usize,
    pub series: usize,
    pub points: usize,
    pub flushes: u64,
    pub files: Vec<WrittenFile>,
}

impl RunSummary {
    /// Index the next flush would have used.
    pub fn next_file_index(&self) -> u64 {
        self.flushes
    }
}

/// Drives the query source over a window sequence and feeds the sink
pub struct BatchRunner<'a, Q: ?Sized, S: ?Sized> {
    config: BatchConfig,
    source: &'a Q,
    sink: &'a S,
}

impl<'a, Q, S> BatchRunner<'a, Q, S>
where
    Q: QuerySource + ?Sized,
    S: SeriesSink + ?Sized,
{
    pub fn new(config: BatchConfig, source: &'a Q, sink: &'a S) -> Result<Self> {
        if config.batches_per_file == 0 {
            bail!("batches_per_file must be greater than 0");
        }
        Ok(Self {
            config,
            source,
            sink,
        })
    }

    /// Query every window in order, flushing every `batches_per_file` windows
    /// and once more at the end.
    pub async fn run(&self, windows: &[TimeWindow]) -> Result<RunSummary> {
        let mut buffer = SeriesBuffer::new();
        let mut file_index = 0_u64;
        let mut summary = RunSummary {
            windows: windows.len(),
            ..RunSummary::default()
        };

        for (position, window) in windows.iter().enumerate() {
            let batch = position as u64 + 1;

            if window.lookback_secs <= 0.0 {
                warn!(
                    batch,
                    instant = %window.query_instant,
                    lookback_secs = window.lookback_secs,
                    "Skipping window without lookback"
                );
                summary.skipped += 1;
            } else {
                let series = self.query_window(batch, window).await?;
                summary.queried += 1;
                summary.series += series.len();
                summary.points += series.iter().map(|s| s.points.len()).sum::<usize>();
                buffer.add_window(series);
            }

            if batch % self.config.batches_per_file == 0 {
                self.flush(&mut buffer, &mut file_index, &mut summary)
                    .await?;
            }
        }

        self.flush(&mut buffer, &mut file_index, &mut summary)
            .await?;

        info!(
            windows = summary.windows,
            files = summary.files.len(),
            series = summary.series,
            points = summary.points,
            "Dump complete"
        );

        Ok(summary)
    }

    async fn query_window(
        &self,
        batch: u64,
        window: &TimeWindow,
    ) -> Result<Vec<SampleSeries>> {
        info!(
            batch,
            instant = %window.query_instant,
            lookback_secs = window.lookback_secs,
            "Querying {}[{}s]",
            self.config.expression,
            window.lookback_whole_secs()
        );

        let value = self
            .source
            .query(
                &self.config.expression,
                window.query_instant,
                window.lookback_secs,
            )
            .await
            .with_context(|| {
                format!(
                    "Query for batch {} at {} failed",
                    batch, window.query_instant
                )
            })?;

        match value {
            QueryValue::Matrix(series) => {
                debug!(batch, series = series.len(), "Received matrix");
                Ok(series)
            }
            other => Err(UnexpectedValueType {
                actual: other.value_type(),
            }
            .into()),
        }
    }

    async fn flush(
        &self,
        buffer: &mut SeriesBuffer,
        file_index: &mut u64,
        summary: &mut RunSummary,
    ) -> Result<()> {
        debug!(
            file_index = *file_index,
            windows = buffer.windows(),
            series = buffer.series().len(),
            points = buffer.total_points(),
            empty = buffer.is_empty(),
            "Flushing buffer"
        );

        let written = self
            .sink
            .write(buffer.series(), *file_index)
            .await
            .with_context(|| format!("Failed to write snapshot file {}", *file_index))?;

        match written {
            Some(file) => summary.files.push(file),
            None => debug!(file_index = *file_index, "Nothing buffered; skipping file"),
        }

        buffer.reset();
        *file_index += 1;
        summary.flushes += 1;
        Ok(())
    }
}

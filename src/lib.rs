// promdump - Dump a Prometheus metric into rotated JSON snapshot files
//
// One run:
// - plans the query windows covering `[timestamp - period, timestamp]`
// - queries `<metric>[<batch>s]` once per window, strictly in order
// - appends each window's series to a buffer, writing it out as
//   `<out>.00000`, `<out>.00001`, ... every `batches_per_file` windows
//
// Any query or write failure aborts the run; files already written stay.

use anyhow::{Context, Result};
use chrono::Utc;
use promdump_batch::{BatchConfig, BatchRunner, RunSummary};
use promdump_config::RuntimeConfig;
use promdump_core::WindowPlan;
use tracing::{info, warn};

mod init;

pub use init::init_tracing;

/// Plan the windows for a validated configuration, ending now unless a
/// timestamp is configured.
pub fn plan_windows(config: &RuntimeConfig) -> Result<WindowPlan> {
    let end = config.dump.end_time(Utc::now())?;
    let plan = promdump_core::plan(config.dump.period()?, config.dump.batch()?, end)
        .context("Failed to plan query windows")?;

    if plan.batch_clamped {
        warn!(
            batch = %config.dump.batch,
            period = %config.dump.period,
            "Batch is longer than the period; clamping batch to the period"
        );
    }

    info!(
        begin = %plan.begin,
        end = %plan.end,
        batch_secs = plan.batch.as_secs(),
        "Will query from {} to {} in {} batches",
        plan.begin,
        plan.end,
        plan.len()
    );

    Ok(plan)
}

/// Run a full dump with the resolved configuration
pub async fn run_with_config(config: &RuntimeConfig) -> Result<RunSummary> {
    let plan = plan_windows(config)?;

    let client = init::init_client(config)?;
    let writer = init::init_writer(config)?;

    let runner = BatchRunner::new(
        BatchConfig {
            expression: config.dump.metric.clone(),
            batches_per_file: config.dump.batches_per_file,
        },
        &client,
        &writer,
    )?;

    runner.run(&plan.windows).await
}

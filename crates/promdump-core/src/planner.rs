//! Query window planning
//!
//! Splits `[end - period, end]` into consecutive windows of `batch` length.
//! Window `i` (1-based) is evaluated at `begin + i * batch`; the last window
//! is clipped to `end` and its lookback shortened by the overshoot.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use thiserror::Error;

/// One instant query: "this metric, looking back `lookback_secs`, evaluated at `query_instant`".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub query_instant: DateTime<Utc>,
    pub lookback_secs: f64,
}

impl TimeWindow {
    /// Lookback in whole seconds, as used in a range selector.
    pub fn lookback_whole_secs(&self) -> i64 {
        self.lookback_secs as i64
    }

    /// First instant covered by this window.
    pub fn start(&self) -> DateTime<Utc> {
        self.query_instant - TimeDelta::milliseconds((self.lookback_secs * 1000.0) as i64)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("{name} must not have fractional seconds (got {value:?})")]
    FractionalSeconds { name: &'static str, value: Duration },

    #[error("{name} of {value:?} is outside the supported time range")]
    OutOfRange { name: &'static str, value: Duration },
}

/// Ordered windows covering a period, plus the parameters that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlan {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Effective batch length after clamping to the period
    pub batch: Duration,
    pub batch_clamped: bool,
    pub windows: Vec<TimeWindow>,
}

impl WindowPlan {
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Sum of all window lookbacks in seconds.
    pub fn total_lookback_secs(&self) -> f64 {
        self.windows.iter().map(|w| w.lookback_secs).sum()
    }
}

fn whole_seconds(name: &'static str, value: Duration) -> Result<i64, PlanError> {
    if value.is_zero() {
        return Err(PlanError::Zero { name });
    }
    if value.subsec_nanos() != 0 {
        return Err(PlanError::FractionalSeconds { name, value });
    }
    i64::try_from(value.as_secs()).map_err(|_| PlanError::OutOfRange { name, value })
}

fn seconds_delta(name: &'static str, value: Duration, secs: i64) -> Result<TimeDelta, PlanError> {
    TimeDelta::try_seconds(secs).ok_or(PlanError::OutOfRange { name, value })
}

/// Plan the query windows for `period` ending at `end`, `batch` at a time.
///
/// A `batch` longer than `period` is clamped to `period`. Windows whose
/// lookback would not be positive are dropped.
pub fn plan(period: Duration, batch: Duration, end: DateTime<Utc>) -> Result<WindowPlan, PlanError> {
    let period_secs = whole_seconds("period", period)?;
    let mut batch_secs = whole_seconds("batch", batch)?;

    let batch_clamped = batch_secs > period_secs;
    if batch_clamped {
        batch_secs = period_secs;
    }

    let begin = end
        .checked_sub_signed(seconds_delta("period", period, period_secs)?)
        .ok_or(PlanError::OutOfRange {
            name: "period",
            value: period,
        })?;

    let count = period_secs.div_euclid(batch_secs) + i64::from(period_secs % batch_secs != 0);
    let mut windows = Vec::new();

    for i in 1..=count {
        let offset = seconds_delta("period", period, i * batch_secs)?;
        let candidate = begin.checked_add_signed(offset).ok_or(PlanError::OutOfRange {
            name: "period",
            value: period,
        })?;

        let window = if candidate > end {
            let overshoot = (candidate - end).num_milliseconds() as f64 / 1000.0;
            TimeWindow {
                query_instant: end,
                lookback_secs: batch_secs as f64 - overshoot,
            }
        } else {
            TimeWindow {
                query_instant: candidate,
                lookback_secs: batch_secs as f64,
            }
        };

        if window.lookback_secs <= 0.0 {
            continue;
        }
        windows.push(window);
    }

    Ok(WindowPlan {
        begin,
        end,
        batch: Duration::from_secs(batch_secs as u64),
        batch_clamped,
        windows,
    })
}

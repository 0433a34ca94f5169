//! Time normalization
//!
//! Assigns each row a time value, orders the rows by it and works out
//! whether the values count milliseconds or seconds.

use std::cmp::Ordering;

use super::{fields, Row, SampleRecord};

/// Average positive delta above which timestamps are taken to be milliseconds
pub const MILLISECOND_THRESHOLD: f64 = 50.0;

/// Unit of the raw time values in a log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeScale {
    /// Seconds, or a synthetic row index
    Seconds,
    /// Milliseconds
    Milliseconds,
}

impl TimeScale {
    /// Detect the unit from time values sorted ascending
    ///
    /// This is a coarse heuristic: an average positive step strictly above
    /// [`MILLISECOND_THRESHOLD`] means milliseconds.
    pub fn detect(sorted_times: &[f64]) -> Self {
        if average_positive_delta(sorted_times) > MILLISECOND_THRESHOLD {
            TimeScale::Milliseconds
        } else {
            TimeScale::Seconds
        }
    }

    /// Multiplier converting raw values to seconds
    pub fn factor(&self) -> f64 {
        match self {
            TimeScale::Seconds => 1.0,
            TimeScale::Milliseconds => 0.001,
        }
    }
}

/// Mean of the strictly positive steps between consecutive values
///
/// Zero and negative steps are ignored. Returns 1.0 when there are none.
pub fn average_positive_delta(sorted_times: &[f64]) -> f64 {
    let (sum, count) = sorted_times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|dt| *dt > 0.0)
        .fold((0.0, 0usize), |(sum, count), dt| (sum + dt, count + 1));

    if count == 0 {
        1.0
    } else {
        sum / count as f64
    }
}

/// Pick the time value for the row at `index`
///
/// Prefers the device `timestamp`, then the host `pc_time`, and falls back
/// to the row index. The flag tells whether a clock value was used.
pub fn resolve_time(row: &Row, index: usize) -> (f64, bool) {
    [fields::TIMESTAMP, fields::PC_TIME]
        .iter()
        .filter_map(|name| row.parse_f64(name))
        .find(|t| t.is_finite())
        .map(|t| (t, true))
        .unwrap_or((index as f64, false))
}

/// Rows ordered by time, with the detected time unit
#[derive(Debug, Clone)]
pub struct Timeline {
    records: Vec<SampleRecord>,
    scale: TimeScale,
    average_delta: f64,
}

impl Timeline {
    /// Build a timeline from rows in file order
    ///
    /// The sort is stable: rows with equal times keep their file order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut records: Vec<SampleRecord> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let (raw_time, is_real) = resolve_time(row, idx);
                SampleRecord::from_row(row, raw_time, is_real)
            })
            .collect();

        records.sort_by(|a, b| {
            a.raw_time
                .partial_cmp(&b.raw_time)
                .unwrap_or(Ordering::Equal)
        });

        let times: Vec<f64> = records.iter().map(|r| r.raw_time).collect();
        let average_delta = average_positive_delta(&times);
        let scale = TimeScale::detect(&times);

        match scale {
            TimeScale::Milliseconds => {
                tracing::info!("Detected millisecond timestamps. Converting to seconds.")
            }
            TimeScale::Seconds => {
                tracing::info!("Detected second-level timestamps or synthetic index.")
            }
        }
        tracing::debug!(
            rows = records.len(),
            average_delta,
            "Normalized replay timeline"
        );

        Self {
            records,
            scale,
            average_delta,
        }
    }

    /// Records in ascending time order
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Detected time unit
    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// The statistic the unit was detected from
    pub fn average_delta(&self) -> f64 {
        self.average_delta
    }

    /// Raw time of the earliest record
    pub fn first_raw_time(&self) -> Option<f64> {
        self.records.first().map(|r| r.raw_time)
    }

    /// Seconds between the earliest record and `raw_time`
    pub fn relative_time(&self, raw_time: f64) -> f64 {
        let t0 = self.first_raw_time().unwrap_or(raw_time);
        (raw_time - t0) * self.scale.factor()
    }
}

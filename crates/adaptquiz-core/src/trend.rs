//! Session performance trend.
//!
//! The whole history is split into three equal contiguous chunks and the
//! first and last chunk accuracies are compared. There is no "stable"
//! outcome: a tie reads as declining.

use crate::model::{PerformanceRecord, Trend};
use crate::statistics;

/// Minimum number of records before a trend is reported.
pub const MIN_TREND_RECORDS: usize = 3;

/// Classify the trend of `records`.
pub fn analyze(records: &[PerformanceRecord]) -> Trend {
    if records.len() < MIN_TREND_RECORDS {
        return Trend::InsufficientData;
    }
    let Some([first, _, last]) = statistics::thirds(records) else {
        return Trend::InsufficientData;
    };
    let first = statistics::accuracy_ratio(first).unwrap_or(0.0);
    let last = statistics::accuracy_ratio(last).unwrap_or(0.0);

    if last > first {
        Trend::Improving
    } else {
        Trend::Declining
    }
}

/// Per-chunk accuracies, for reporting. Empty below three records.
pub fn chunk_accuracies(records: &[PerformanceRecord]) -> Vec<f64> {
    statistics::thirds(records)
        .map(|chunks| {
            chunks
                .iter()
                .map(|c| statistics::accuracy_ratio(c).unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default()
}

//! Accuracy statistics over answer records.
//!
//! Session accuracy is reported as a rounded percentage; the difficulty and
//! trend rules work on raw ratios instead.

use crate::model::PerformanceRecord;

/// Rounded percentage of correct answers, 0 when there are none.
///
/// Ties round away from zero, so 2 of 8 is 25 and 1 of 8 (12.5) is 13.
pub fn accuracy_percent(records: &[PerformanceRecord]) -> u32 {
    if records.is_empty() {
        return 0;
    }
    let correct = correct_count(records);
    (100.0 * correct as f64 / records.len() as f64).round() as u32
}

/// Fraction of correct answers in `records`, or `None` when empty.
pub fn accuracy_ratio(records: &[PerformanceRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    Some(correct_count(records) as f64 / records.len() as f64)
}

/// The most recent `min(size, n)` records.
pub fn trailing_window(records: &[PerformanceRecord], size: usize) -> &[PerformanceRecord] {
    let start = records.len().saturating_sub(size);
    &records[start..]
}

/// Split `records` into three contiguous chunks of `floor(n/3)` records each.
///
/// Remainder records at the end belong to no chunk. Returns `None` when fewer
/// than three records exist.
pub fn thirds(records: &[PerformanceRecord]) -> Option<[&[PerformanceRecord]; 3]> {
    let size = records.len() / 3;
    if size == 0 {
        return None;
    }
    Some([
        &records[0..size],
        &records[size..2 * size],
        &records[2 * size..3 * size],
    ])
}

/// Mean time spent per answer in milliseconds, 0 when empty.
pub fn average_time_ms(records: &[PerformanceRecord]) -> u64 {
    if records.is_empty() {
        return 0;
    }
    records.iter().map(|r| r.time_spent_ms).sum::<u64>() / records.len() as u64
}

fn correct_count(records: &[PerformanceRecord]) -> usize {
    records.iter().filter(|r| r.is_correct).count()
}

#[cfg(test)]
pub(crate) fn records_from(pattern: &str) -> Vec<PerformanceRecord> {
    pattern
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| PerformanceRecord {
            is_correct: c == 'C',
            time_spent_ms: 1000,
            timestamp: chrono::Utc::now(),
        })
        .collect()
}

//! Per-session answer history.

use chrono::Utc;

use crate::model::PerformanceRecord;
use crate::statistics;

/// Records every answer of the active session in order.
///
/// History is unbounded and only cleared by [`PerformanceTracker::reset`].
#[derive(Debug, Clone, Default)]
pub struct PerformanceTracker {
    records: Vec<PerformanceRecord>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an answer stamped with the current time.
    pub fn record_answer(&mut self, is_correct: bool, time_spent_ms: u64) -> &PerformanceRecord {
        self.push(PerformanceRecord {
            is_correct,
            time_spent_ms,
            timestamp: Utc::now(),
        })
    }

    /// Append a pre-built record (e.g. when replaying a session).
    pub fn push(&mut self, record: PerformanceRecord) -> &PerformanceRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Rounded session accuracy in percent, 0 when empty.
    pub fn accuracy(&self) -> u32 {
        statistics::accuracy_percent(&self.records)
    }

    pub fn average_time_ms(&self) -> u64 {
        statistics::average_time_ms(&self.records)
    }

    /// The most recent `min(size, len)` records.
    pub fn window(&self, size: usize) -> &[PerformanceRecord] {
        statistics::trailing_window(&self.records, size)
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }
}

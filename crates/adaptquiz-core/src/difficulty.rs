//! Difficulty hysteresis state machine.
//!
//! After every answer the adjuster looks at the trailing window of the
//! session's records. Accuracy at or above the promote threshold moves the
//! session to advanced; accuracy below the demote threshold moves it to
//! beginner; anything in between leaves the level alone. Intermediate is only
//! ever an initial state: no rule transitions back into it.
//!
//! The behavior service can also force a level through [`DifficultyAdjuster::force`].
//! A forced level holds until the next recorded answer, which re-runs the
//! window rule against it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::model::{AdjustmentSource, DifficultyAdjustmentEvent, DifficultyLevel, PerformanceRecord};
use crate::statistics;

pub const HIGH_ACCURACY_REASON: &str = "High accuracy";
pub const LOW_ACCURACY_REASON: &str = "Low accuracy";

/// Window size and thresholds for the hysteresis rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyThresholds {
    /// Number of most recent answers considered.
    pub window_size: usize,
    /// Promote to advanced when window accuracy is at least this.
    pub promote_at: f64,
    /// Demote to beginner when window accuracy is strictly below this.
    pub demote_below: f64,
}

impl Default for DifficultyThresholds {
    fn default() -> Self {
        Self {
            window_size: 10,
            promote_at: 0.8,
            demote_below: 0.5,
        }
    }
}

/// Owns the current difficulty level and its audit log.
#[derive(Debug, Clone)]
pub struct DifficultyAdjuster {
    initial: DifficultyLevel,
    current: DifficultyLevel,
    thresholds: DifficultyThresholds,
    events: Vec<DifficultyAdjustmentEvent>,
}

impl DifficultyAdjuster {
    pub fn new(initial: DifficultyLevel, thresholds: DifficultyThresholds) -> Self {
        Self {
            initial,
            current: initial,
            thresholds,
            events: Vec::new(),
        }
    }

    pub fn current(&self) -> DifficultyLevel {
        self.current
    }

    pub fn initial(&self) -> DifficultyLevel {
        self.initial
    }

    pub fn events(&self) -> &[DifficultyAdjustmentEvent] {
        &self.events
    }

    pub fn thresholds(&self) -> &DifficultyThresholds {
        &self.thresholds
    }

    /// Accuracy over the trailing window of `records`, `None` when empty.
    pub fn window_accuracy(&self, records: &[PerformanceRecord]) -> Option<f64> {
        statistics::accuracy_ratio(statistics::trailing_window(
            records,
            self.thresholds.window_size,
        ))
    }

    /// Re-evaluate the level after an answer was appended to `records`.
    ///
    /// Returns the transition event, if one happened.
    pub fn on_answer(&mut self, records: &[PerformanceRecord]) -> Option<&DifficultyAdjustmentEvent> {
        let accuracy = self.window_accuracy(records)?;

        let target = if accuracy >= self.thresholds.promote_at {
            DifficultyLevel::Advanced
        } else if accuracy < self.thresholds.demote_below {
            DifficultyLevel::Beginner
        } else {
            return None;
        };

        if target == self.current {
            return None;
        }

        let reason = match target {
            DifficultyLevel::Advanced => HIGH_ACCURACY_REASON,
            _ => LOW_ACCURACY_REASON,
        };
        tracing::info!(
            from = %self.current,
            to = %target,
            window_accuracy = accuracy,
            "difficulty adjusted"
        );
        Some(self.transition(target, reason.to_string(), AdjustmentSource::Local))
    }

    /// Force the level regardless of window accuracy.
    ///
    /// No event is logged when the level is already `level`.
    pub fn force(&mut self, level: DifficultyLevel, reason: &str) -> Option<&DifficultyAdjustmentEvent> {
        if level == self.current {
            return None;
        }
        tracing::info!(from = %self.current, to = %level, reason, "difficulty overridden");
        Some(self.transition(level, reason.to_string(), AdjustmentSource::Override))
    }

    /// Return to the configured initial level and clear the audit log.
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.events.clear();
    }

    /// Change the initial level; takes effect immediately and on every reset.
    pub fn set_initial(&mut self, level: DifficultyLevel) {
        self.initial = level;
        self.current = level;
        self.events.clear();
    }

    fn transition(
        &mut self,
        to: DifficultyLevel,
        reason: String,
        source: AdjustmentSource,
    ) -> &DifficultyAdjustmentEvent {
        self.events.push(DifficultyAdjustmentEvent {
            from: self.current,
            to,
            reason,
            source,
            timestamp: Utc::now(),
        });
        self.current = to;
        &self.events[self.events.len() - 1]
    }
}

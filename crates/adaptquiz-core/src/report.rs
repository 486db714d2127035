//! Session reports with JSON persistence and a markdown summary.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    DifficultyAdjustmentEvent, DifficultyLevel, RemediationItem, Suggestion, Trend,
};

/// Summary of one quiz attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    pub session_id: Option<String>,
    /// When the session (or its last reset) began.
    pub started_at: DateTime<Utc>,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub questions_answered: usize,
    /// Rounded session accuracy in percent.
    pub accuracy: u32,
    pub initial_difficulty: DifficultyLevel,
    pub final_difficulty: DifficultyLevel,
    pub trend: Trend,
    /// Accuracy of each trend chunk, empty below three answers.
    #[serde(default)]
    pub chunk_accuracies: Vec<f64>,
    /// Difficulty audit log.
    #[serde(default)]
    pub events: Vec<DifficultyAdjustmentEvent>,
    /// Suggestions visible at report time.
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub break_reminder: bool,
    #[serde(default)]
    pub last_break_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_mistakes: u64,
    /// Remediation items visible at report time.
    #[serde(default)]
    pub top_remediation: Vec<RemediationItem>,
}

impl SessionReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Session {}:** {} answered, {}% accuracy, {} → {}, trend {}\n\n",
            self.session_id.as_deref().unwrap_or("(none)"),
            self.questions_answered,
            self.accuracy,
            self.initial_difficulty,
            self.final_difficulty,
            self.trend
        ));

        if !self.events.is_empty() {
            md.push_str("### Difficulty changes\n\n");
            md.push_str("| From | To | Source | Reason |\n");
            md.push_str("|------|----|--------|--------|\n");
            for e in &self.events {
                md.push_str(&format!(
                    "| {} | {} | {:?} | {} |\n",
                    e.from, e.to, e.source, e.reason
                ));
            }
            md.push('\n');
        }

        if !self.suggestions.is_empty() {
            md.push_str("### Suggestions\n\n");
            for s in &self.suggestions {
                md.push_str(&format!("- [{}] {}: {}\n", s.priority, s.kind, s.message));
            }
            md.push('\n');
        }

        if !self.top_remediation.is_empty() {
            md.push_str("### Remediation\n\n");
            md.push_str("| Category | Priority | Sessions |\n");
            md.push_str("|----------|----------|----------|\n");
            for item in &self.top_remediation {
                md.push_str(&format!(
                    "| {} | {:.2} | {} |\n",
                    item.category, item.priority, item.recommended_sessions
                ));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdjustmentSource, Priority};

    fn make_report() -> SessionReport {
        let now = Utc::now();
        SessionReport {
            id: Uuid::nil(),
            session_id: Some("quiz-7".into()),
            started_at: now,
            created_at: now,
            questions_answered: 10,
            accuracy: 30,
            initial_difficulty: DifficultyLevel::Beginner,
            final_difficulty: DifficultyLevel::Beginner,
            trend: Trend::Declining,
            chunk_accuracies: vec![1.0, 0.0, 0.0],
            events: vec![DifficultyAdjustmentEvent {
                from: DifficultyLevel::Advanced,
                to: DifficultyLevel::Beginner,
                reason: "Low accuracy".into(),
                source: AdjustmentSource::Local,
                timestamp: now,
            }],
            suggestions: vec![Suggestion {
                kind: "break_suggestion".into(),
                priority: Priority::High,
                message: "Take five".into(),
                actionable: true,
            }],
            break_reminder: true,
            last_break_time: None,
            total_mistakes: 12,
            top_remediation: vec![RemediationItem {
                category: "polity".into(),
                priority: 0.9,
                recommended_sessions: 3,
            }],
        }
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = SessionReport::load_json(&path).unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionReport::load_json(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read report"));
    }

    #[test]
    fn markdown_output() {
        let md = make_report().to_markdown();
        assert!(md.contains("quiz-7"));
        assert!(md.contains("Low accuracy"));
        assert!(md.contains("break_suggestion"));
        assert!(md.contains("| polity | 0.90 | 3 |"));
    }
}

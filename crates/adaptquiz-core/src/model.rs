//! Core data model types for adaptquiz.
//!
//! These are the records, levels, and analytics shapes that the tracker,
//! adjuster, monitor, and planners pass between each other. Wire-facing types
//! use camelCase field names and tolerate missing fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Session performance
// ---------------------------------------------------------------------------

/// A single answered question within the active session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Whether the learner answered correctly.
    pub is_correct: bool,
    /// Time spent on the question in milliseconds.
    pub time_spent_ms: u64,
    /// When the answer was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Question difficulty, ordered from easiest to hardest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Beginner => write!(f, "beginner"),
            DifficultyLevel::Intermediate => write!(f, "intermediate"),
            DifficultyLevel::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            other => Err(format!("unknown difficulty level: '{other}'")),
        }
    }
}

/// What caused a difficulty transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentSource {
    /// The rolling-window threshold rule.
    Local,
    /// A server-directed override from the behavior service.
    Override,
}

/// One entry in the difficulty audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyAdjustmentEvent {
    pub from: DifficultyLevel,
    pub to: DifficultyLevel,
    pub reason: String,
    pub source: AdjustmentSource,
    pub timestamp: DateTime<Utc>,
}

/// Direction of performance across the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    InsufficientData,
    Improving,
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::InsufficientData => write!(f, "insufficient_data"),
            Trend::Improving => write!(f, "improving"),
            Trend::Declining => write!(f, "declining"),
        }
    }
}

// ---------------------------------------------------------------------------
// Behavior suggestions
// ---------------------------------------------------------------------------

/// Suggestion type the behavior service uses to recommend a pause.
pub const BREAK_SUGGESTION: &str = "break_suggestion";

/// Adjustment type that forces the session down to beginner difficulty.
pub const DIFFICULTY_REDUCTION: &str = "difficulty_reduction";

/// Urgency of a suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// A fatigue or pacing intervention shown to the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub actionable: bool,
}

impl Suggestion {
    /// Whether this suggestion recommends taking a break.
    pub fn is_break(&self) -> bool {
        self.kind == BREAK_SUGGESTION
    }
}

/// A directive from the behavior service, e.g. `difficulty_reduction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorAdjustment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reason: String,
}

/// Behavioral metrics reported alongside suggestions.
///
/// Only a handful of fields are interpreted; everything else is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatigue_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_response_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement_score: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Summary of in-session signals forwarded to the behavior service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorSnapshot {
    pub question_number: usize,
    pub current_accuracy: u32,
    pub average_time_ms: u64,
    pub current_difficulty: DifficultyLevel,
    #[serde(default)]
    pub idle_time_ms: u64,
    #[serde(default)]
    pub tab_switches: u32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Caller-observed signals the engine cannot derive on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorSignals {
    #[serde(default)]
    pub idle_time_ms: u64,
    #[serde(default)]
    pub tab_switches: u32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Quiz configuration tailored to the learner by the behavior service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptedQuizConfig {
    /// Negative values lean easier, positive lean harder. Absent means no
    /// preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_bias: Option<f64>,
    /// Minutes between break suggestions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_suggestion_interval: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Recommendations for the learner's next study session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecommendations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_question_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_time_of_day: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Historical mistakes
// ---------------------------------------------------------------------------

/// A historical mistake as stored by the analytics service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeRecord {
    pub category: String,
    pub mistake_type: String,
    pub timestamp: DateTime<Utc>,
    pub question_id: String,
}

/// Share of mistakes attributed to one mistake type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeTypeShare {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub percentage: f64,
}

/// Mistake statistics computed by the analytics service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeDistribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_mistakes: Option<u64>,
    #[serde(default)]
    pub mistake_trend: Vec<MistakeTypeShare>,
    #[serde(default)]
    pub top_problem_categories: Vec<String>,
}

/// A category the learner should revisit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationItem {
    pub category: String,
    /// Urgency in [0, 1].
    #[serde(default)]
    pub priority: f64,
    #[serde(default)]
    pub recommended_sessions: u32,
}

/// Ranked study plan derived from the mistake distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationPlan {
    #[serde(default, rename = "remediationPlan")]
    pub items: Vec<RemediationItem>,
    #[serde(default)]
    pub estimated_time_to_mastery_hours: f64,
}

// ---------------------------------------------------------------------------
// Fetch state
// ---------------------------------------------------------------------------

/// Outcome of the most recent collaborator call of a component.
///
/// Lets callers tell "nothing fetched yet" apart from "the last fetch failed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Ready,
    Failed(String),
}

impl FetchStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchStatus::Failed(_))
    }
}

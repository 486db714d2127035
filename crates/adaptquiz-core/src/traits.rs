//! Collaborator trait definitions for the analytics services.
//!
//! These async traits are implemented by the `adaptquiz-analytics` crate
//! (HTTP clients and in-memory mocks). The engine only ever talks to the
//! services through them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{
    AdaptedQuizConfig, BehaviorAdjustment, BehaviorMetrics, BehaviorSnapshot,
    MistakeDistribution, RemediationPlan, SessionRecommendations, Suggestion,
};

// ---------------------------------------------------------------------------
// Behavior analytics
// ---------------------------------------------------------------------------

/// Service that analyses in-quiz behavior and recommends interventions.
#[async_trait]
pub trait BehaviorAnalytics: Send + Sync {
    /// Human-readable service name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch suggestions, metrics, and adjustments for the running session.
    async fn get_mid_quiz_adjustments(
        &self,
        session_id: &str,
        snapshot: &BehaviorSnapshot,
    ) -> anyhow::Result<MidQuizAdjustments>;

    /// Fetch a quiz configuration tailored to the learner.
    async fn get_adapted_quiz_config(
        &self,
        options: &AdaptedConfigOptions,
    ) -> anyhow::Result<AdaptedConfigResponse>;

    /// Fetch recommendations for the learner's next session.
    async fn get_session_recommendations(&self) -> anyhow::Result<SessionRecommendations>;
}

/// Response to a mid-quiz adjustment request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MidQuizAdjustments {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub metrics: BehaviorMetrics,
    #[serde(default)]
    pub adjustments: Vec<BehaviorAdjustment>,
}

/// Options sent when requesting an adapted quiz configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptedConfigOptions {
    /// Subject or exam section the quiz covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Planned number of questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_count: Option<u32>,
    /// Planned duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

/// Envelope around an adapted quiz configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptedConfigResponse {
    #[serde(default)]
    pub config: AdaptedQuizConfig,
}

// ---------------------------------------------------------------------------
// Mistake analytics
// ---------------------------------------------------------------------------

/// Service that aggregates historical mistakes into statistics and plans.
#[async_trait]
pub trait MistakeAnalytics: Send + Sync {
    /// Human-readable service name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch the mistake distribution over the last `days` days.
    async fn get_mistake_analysis(&self, days: u32) -> anyhow::Result<MistakeAnalysisResponse>;

    /// Fetch the learner's current remediation plan.
    async fn get_remediation_plan(&self) -> anyhow::Result<RemediationPlanResponse>;
}

/// Envelope around a mistake distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MistakeAnalysisResponse {
    #[serde(default)]
    pub analysis: MistakeDistribution,
}

/// Envelope around a remediation plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationPlanResponse {
    #[serde(default)]
    pub remediation_plan: RemediationPlan,
}

//! In-memory analytics services for offline runs and tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use adaptquiz_core::model::{
    AdaptedQuizConfig, BehaviorSnapshot, MistakeDistribution, RemediationPlan,
    SessionRecommendations,
};
use adaptquiz_core::traits::{
    AdaptedConfigOptions, AdaptedConfigResponse, BehaviorAnalytics, MidQuizAdjustments,
    MistakeAnalysisResponse, MistakeAnalytics, RemediationPlanResponse,
};

/// A mock behavior service.
///
/// Scripted responses are served in order; once they run out, the fallback
/// response is returned for every further call.
pub struct MockBehaviorAnalytics {
    scripted: Mutex<Vec<MidQuizAdjustments>>,
    fallback: MidQuizAdjustments,
    config: AdaptedQuizConfig,
    recommendations: SessionRecommendations,
    call_count: AtomicU32,
    last_snapshot: Mutex<Option<BehaviorSnapshot>>,
}

impl MockBehaviorAnalytics {
    /// Serve the given responses in order, then empty ones.
    pub fn new(responses: Vec<MidQuizAdjustments>) -> Self {
        Self {
            scripted: Mutex::new(responses.into_iter().rev().collect()),
            fallback: MidQuizAdjustments::default(),
            config: AdaptedQuizConfig::default(),
            recommendations: SessionRecommendations::default(),
            call_count: AtomicU32::new(0),
            last_snapshot: Mutex::new(None),
        }
    }

    /// A service that never suggests anything.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Always return the same response.
    pub fn with_fixed_response(response: MidQuizAdjustments) -> Self {
        Self {
            fallback: response,
            ..Self::empty()
        }
    }

    pub fn with_config(mut self, config: AdaptedQuizConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_recommendations(mut self, recommendations: SessionRecommendations) -> Self {
        self.recommendations = recommendations;
        self
    }

    /// Number of mid-quiz adjustment calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Snapshot sent with the most recent adjustment call.
    pub fn last_snapshot(&self) -> Option<BehaviorSnapshot> {
        self.last_snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl BehaviorAnalytics for MockBehaviorAnalytics {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_mid_quiz_adjustments(
        &self,
        _session_id: &str,
        snapshot: &BehaviorSnapshot,
    ) -> anyhow::Result<MidQuizAdjustments> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());

        let next = self
            .scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }

    async fn get_adapted_quiz_config(
        &self,
        _options: &AdaptedConfigOptions,
    ) -> anyhow::Result<AdaptedConfigResponse> {
        Ok(AdaptedConfigResponse {
            config: self.config.clone(),
        })
    }

    async fn get_session_recommendations(&self) -> anyhow::Result<SessionRecommendations> {
        Ok(self.recommendations.clone())
    }
}

/// A mock mistake service returning fixed data.
#[derive(Default)]
pub struct MockMistakeAnalytics {
    analysis: MistakeDistribution,
    plan: RemediationPlan,
    requested_days: Mutex<Vec<u32>>,
}

impl MockMistakeAnalytics {
    pub fn new(analysis: MistakeDistribution, plan: RemediationPlan) -> Self {
        Self {
            analysis,
            plan,
            requested_days: Mutex::new(Vec::new()),
        }
    }

    /// A service with no recorded mistakes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look-back windows requested so far, in call order.
    pub fn requested_days(&self) -> Vec<u32> {
        self.requested_days
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl MistakeAnalytics for MockMistakeAnalytics {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_mistake_analysis(&self, days: u32) -> anyhow::Result<MistakeAnalysisResponse> {
        self.requested_days
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(days);
        Ok(MistakeAnalysisResponse {
            analysis: self.analysis.clone(),
        })
    }

    async fn get_remediation_plan(&self) -> anyhow::Result<RemediationPlanResponse> {
        Ok(RemediationPlanResponse {
            remediation_plan: self.plan.clone(),
        })
    }
}

//! Mid-quiz behavior monitoring.
//!
//! Every few answers the session asks the behavior service for fatigue and
//! pacing interventions. The returned suggestions and metrics replace the
//! previous ones wholesale, and a `difficulty_reduction` directive drops the
//! session to beginner on the spot. Failed calls keep the previous data and
//! only mark the fetch status as failed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyAdjuster;
use crate::error::classify;
use crate::model::{
    AdaptedQuizConfig, BehaviorMetrics, BehaviorSnapshot, DifficultyLevel, FetchStatus,
    SessionRecommendations, Suggestion, BREAK_SUGGESTION, DIFFICULTY_REDUCTION,
};
use crate::policy::SuggestionPolicy;
use crate::traits::{AdaptedConfigOptions, BehaviorAnalytics, MidQuizAdjustments};

/// What a successful adjustment check changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentOutcome {
    /// Suggestions as presented to the learner (after the policy cap).
    pub suggestions: Vec<Suggestion>,
    /// Level the service forced the session to, if any.
    pub forced_difficulty: Option<DifficultyLevel>,
    /// Whether a break reminder is now showing.
    pub break_reminder: bool,
}

/// Holds the latest behavior-service output for one session.
pub struct BehaviorMonitor {
    service: Arc<dyn BehaviorAnalytics>,
    policy: SuggestionPolicy,
    suggestions: Vec<Suggestion>,
    metrics: Option<BehaviorMetrics>,
    break_reminder: bool,
    last_break_time: Option<DateTime<Utc>>,
    adapted_config: Option<AdaptedQuizConfig>,
    recommendations: Option<SessionRecommendations>,
    status: FetchStatus,
}

impl BehaviorMonitor {
    pub fn new(service: Arc<dyn BehaviorAnalytics>, policy: SuggestionPolicy) -> Self {
        Self {
            service,
            policy,
            suggestions: Vec::new(),
            metrics: None,
            break_reminder: false,
            last_break_time: None,
            adapted_config: None,
            recommendations: None,
            status: FetchStatus::Idle,
        }
    }

    /// Whether a check is due after `question_number` answers.
    pub fn is_check_due(question_number: usize, interval: usize) -> bool {
        interval > 0 && question_number > 0 && question_number % interval == 0
    }

    /// Ask the service for adjustments and apply them.
    ///
    /// Returns `None` without calling the service when there is no session id.
    /// When the call fails it returns `None` and keeps the current suggestions,
    /// metrics, break reminder and difficulty; only [`BehaviorMonitor::status`]
    /// changes, to [`FetchStatus::Failed`].
    pub async fn check_adjustments(
        &mut self,
        session_id: Option<&str>,
        snapshot: &BehaviorSnapshot,
        adjuster: &mut DifficultyAdjuster,
    ) -> Option<AdjustmentOutcome> {
        let session_id = session_id.filter(|id| !id.is_empty())?;
        let response = self.request(session_id, snapshot).await?;
        Some(self.apply(response, adjuster))
    }

    /// Call the service without applying the response.
    ///
    /// Failures are logged and recorded in [`BehaviorMonitor::status`].
    pub async fn request(
        &mut self,
        session_id: &str,
        snapshot: &BehaviorSnapshot,
    ) -> Option<MidQuizAdjustments> {
        tracing::debug!(
            session_id,
            question_number = snapshot.question_number,
            "checking mid-quiz adjustments"
        );
        match self
            .service
            .get_mid_quiz_adjustments(session_id, snapshot)
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                self.record_failure(&e);
                None
            }
        }
    }

    /// Note a failed adjustment call made outside [`BehaviorMonitor::request`].
    pub fn record_failure(&mut self, err: &anyhow::Error) {
        tracing::warn!(
            service = self.service.name(),
            kind = classify(err),
            "mid-quiz adjustment check failed: {err:#}"
        );
        self.status = FetchStatus::Failed(err.to_string());
    }

    /// Handle to the behavior service, for calls made without borrowing the monitor.
    pub fn service(&self) -> Arc<dyn BehaviorAnalytics> {
        Arc::clone(&self.service)
    }

    /// Replace suggestions and metrics with `response` and apply overrides.
    pub fn apply(
        &mut self,
        response: MidQuizAdjustments,
        adjuster: &mut DifficultyAdjuster,
    ) -> AdjustmentOutcome {
        let MidQuizAdjustments {
            suggestions,
            metrics,
            adjustments,
        } = response;

        self.suggestions = suggestions
            .into_iter()
            .map(|mut s| {
                s.actionable |= s.is_break();
                s
            })
            .collect();
        self.metrics = Some(metrics);
        if self.suggestions.iter().any(Suggestion::is_break) {
            self.break_reminder = true;
        }

        let mut forced_difficulty = None;
        if let Some(reduction) = adjustments.iter().find(|a| a.kind == DIFFICULTY_REDUCTION) {
            let reason = if reduction.reason.is_empty() {
                "Difficulty reduction".to_string()
            } else {
                format!("Difficulty reduction: {}", reduction.reason)
            };
            adjuster.force(DifficultyLevel::Beginner, &reason);
            forced_difficulty = Some(DifficultyLevel::Beginner);
        }

        self.status = FetchStatus::Ready;
        AdjustmentOutcome {
            suggestions: self.visible_suggestions(),
            forced_difficulty,
            break_reminder: self.break_reminder,
        }
    }

    /// Suggestions shown to the learner, capped by the policy.
    pub fn visible_suggestions(&self) -> Vec<Suggestion> {
        self.policy
            .present(&self.suggestions)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every stored suggestion, uncapped.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// Remove every suggestion of `kind`. Dismissing an absent kind is a no-op.
    pub fn dismiss_suggestion(&mut self, kind: &str) {
        self.suggestions.retain(|s| s.kind != kind);
        if kind == BREAK_SUGGESTION {
            self.break_reminder = false;
        }
    }

    /// Record that the learner took a break and hide the reminder.
    pub fn take_break(&mut self) -> DateTime<Utc> {
        self.take_break_at(Utc::now())
    }

    pub fn take_break_at(&mut self, at: DateTime<Utc>) -> DateTime<Utc> {
        tracing::info!(at = %at, "learner took a break");
        self.last_break_time = Some(at);
        self.break_reminder = false;
        at
    }

    /// Whether the adapted break interval has elapsed since the last break
    /// (or since `session_started` if there was none).
    ///
    /// Always `false` until an adapted config with an interval is loaded.
    pub fn is_break_due(&self, session_started: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let Some(minutes) = self
            .adapted_config
            .as_ref()
            .and_then(|c| c.break_suggestion_interval)
        else {
            return false;
        };
        let since = self.last_break_time.unwrap_or(session_started);
        now - since >= Duration::minutes(i64::from(minutes))
    }

    /// Fetch and store an adapted quiz configuration.
    pub async fn fetch_adapted_config(
        &mut self,
        options: &AdaptedConfigOptions,
    ) -> Option<AdaptedQuizConfig> {
        match self.service.get_adapted_quiz_config(options).await {
            Ok(response) => {
                self.adapted_config = Some(response.config.clone());
                Some(response.config)
            }
            Err(e) => {
                tracing::warn!(kind = classify(&e), "adapted config fetch failed: {e:#}");
                None
            }
        }
    }

    /// Fetch and store recommendations for the next session.
    pub async fn fetch_session_recommendations(&mut self) -> Option<SessionRecommendations> {
        match self.service.get_session_recommendations().await {
            Ok(recs) => {
                self.recommendations = Some(recs.clone());
                Some(recs)
            }
            Err(e) => {
                tracing::warn!(
                    kind = classify(&e),
                    "session recommendations fetch failed: {e:#}"
                );
                None
            }
        }
    }

    pub fn metrics(&self) -> Option<&BehaviorMetrics> {
        self.metrics.as_ref()
    }

    pub fn break_reminder(&self) -> bool {
        self.break_reminder
    }

    pub fn last_break_time(&self) -> Option<DateTime<Utc>> {
        self.last_break_time
    }

    pub fn adapted_config(&self) -> Option<&AdaptedQuizConfig> {
        self.adapted_config.as_ref()
    }

    pub fn recommendations(&self) -> Option<&SessionRecommendations> {
        self.recommendations.as_ref()
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn reset(&mut self) {
        self.suggestions.clear();
        self.metrics = None;
        self.break_reminder = false;
        self.last_break_time = None;
        self.status = FetchStatus::Idle;
    }
}

//! Per-attempt assessment engine.
//!
//! One [`AssessmentEngine`] is built for each quiz attempt and owns every
//! piece of session state: the answer history, the difficulty state machine,
//! the behavior monitor, and the historical mistake views. Answers are
//! processed synchronously so the level served for question N+1 always
//! reflects answers 1..=N. Collaborator calls are tagged with a
//! [`SessionToken`]; responses that come back after a reset, or after the
//! engine was replaced by a new attempt, are dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::behavior::{AdjustmentOutcome, BehaviorMonitor};
use crate::difficulty::{DifficultyAdjuster, DifficultyThresholds};
use crate::error::EngineError;
use crate::mistakes::{MistakeAggregator, DEFAULT_WINDOW_DAYS};
use crate::model::{
    BehaviorSignals, BehaviorSnapshot, DifficultyAdjustmentEvent, DifficultyLevel,
    MistakeDistribution, PerformanceRecord, RemediationPlan, Suggestion, Trend,
};
use crate::policy::{Ordering, RemediationPolicy, SuggestionPolicy};
use crate::remediation::RemediationPlanner;
use crate::report::SessionReport;
use crate::tracker::PerformanceTracker;
use crate::traits::{
    AdaptedConfigOptions, BehaviorAnalytics, MidQuizAdjustments, MistakeAnalysisResponse,
    MistakeAnalytics, RemediationPlanResponse,
};
use crate::trend;

/// Configuration for the assessment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Level served before any answer is recorded, and after every reset.
    pub initial_difficulty: DifficultyLevel,
    /// Number of recent answers the difficulty rule looks at.
    pub window_size: usize,
    /// Window accuracy at or above which the session is promoted to advanced.
    pub promote_threshold: f64,
    /// Window accuracy below which the session is demoted to beginner.
    pub demote_threshold: f64,
    /// Run the behavior check every this many answers (0 disables it).
    pub check_interval: usize,
    /// Suggestions shown at once.
    pub max_suggestions: usize,
    /// Remediation items shown at once.
    pub max_remediation_items: usize,
    /// Ordering applied before the suggestion/remediation caps.
    pub presentation_order: Ordering,
    /// Look-back window for mistake analysis, in days.
    pub mistake_window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let thresholds = DifficultyThresholds::default();
        Self {
            initial_difficulty: DifficultyLevel::Beginner,
            window_size: thresholds.window_size,
            promote_threshold: thresholds.promote_at,
            demote_threshold: thresholds.demote_below,
            check_interval: 5,
            max_suggestions: SuggestionPolicy::default().limit,
            max_remediation_items: RemediationPolicy::default().limit,
            presentation_order: Ordering::Received,
            mistake_window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl EngineConfig {
    pub fn thresholds(&self) -> DifficultyThresholds {
        DifficultyThresholds {
            window_size: self.window_size,
            promote_at: self.promote_threshold,
            demote_below: self.demote_threshold,
        }
    }

    pub fn suggestion_policy(&self) -> SuggestionPolicy {
        SuggestionPolicy {
            limit: self.max_suggestions,
            ordering: self.presentation_order,
        }
    }

    pub fn remediation_policy(&self) -> RemediationPolicy {
        RemediationPolicy {
            limit: self.max_remediation_items,
            ordering: self.presentation_order,
        }
    }

    /// Map an adapted-config difficulty bias onto a starting level.
    ///
    /// Below -1/3 starts at beginner, above 1/3 at advanced, intermediate otherwise.
    pub fn level_for_bias(bias: f64) -> DifficultyLevel {
        if bias < -1.0 / 3.0 {
            DifficultyLevel::Beginner
        } else if bias > 1.0 / 3.0 {
            DifficultyLevel::Advanced
        } else {
            DifficultyLevel::Intermediate
        }
    }

    pub fn with_difficulty_bias(mut self, bias: f64) -> Self {
        self.initial_difficulty = Self::level_for_bias(bias);
        self
    }

    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.window_size >= 1, "window_size must be at least 1");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.promote_threshold)
                && (0.0..=1.0).contains(&self.demote_threshold),
            "thresholds must be between 0.0 and 1.0"
        );
        anyhow::ensure!(
            self.demote_threshold <= self.promote_threshold,
            "demote_threshold must not exceed promote_threshold"
        );
        Ok(())
    }
}

/// Identifies the session state an async call was started against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken {
    pub session_id: Option<String>,
    /// Unique per engine instance, so a new attempt under a reused session
    /// id never accepts the previous attempt's responses.
    pub attempt: uuid::Uuid,
    pub generation: u64,
}

/// Everything that happened as a result of one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub question_number: usize,
    pub record: PerformanceRecord,
    /// Level to serve for the next question.
    pub difficulty: DifficultyLevel,
    /// Local threshold transition triggered by this answer.
    pub transition: Option<DifficultyAdjustmentEvent>,
    pub accuracy: u32,
    pub trend: Trend,
    /// Result of the periodic behavior check, when one ran and succeeded.
    pub adjustments: Option<AdjustmentOutcome>,
}

/// A behavior check detached from the engine, so the engine need not be
/// borrowed while the request is in flight.
pub struct PendingCheck {
    pub token: SessionToken,
    session_id: String,
    snapshot: BehaviorSnapshot,
    service: Arc<dyn BehaviorAnalytics>,
}

impl PendingCheck {
    pub fn snapshot(&self) -> &BehaviorSnapshot {
        &self.snapshot
    }

    pub async fn run(self) -> CheckResponse {
        let result = self
            .service
            .get_mid_quiz_adjustments(&self.session_id, &self.snapshot)
            .await;
        CheckResponse {
            token: self.token,
            result,
        }
    }
}

/// Arrived response of a [`PendingCheck`].
pub struct CheckResponse {
    pub token: SessionToken,
    pub result: anyhow::Result<MidQuizAdjustments>,
}

/// A combined mistake-analysis and remediation-plan fetch.
pub struct PendingHistory {
    pub token: SessionToken,
    window_days: u32,
    service: Arc<dyn MistakeAnalytics>,
}

impl PendingHistory {
    /// Run both requests concurrently.
    pub async fn run(self) -> HistoryResponse {
        let (analysis, plan) = futures::join!(
            self.service.get_mistake_analysis(self.window_days),
            self.service.get_remediation_plan()
        );
        HistoryResponse {
            token: self.token,
            window_days: self.window_days,
            analysis,
            plan,
        }
    }
}

/// Arrived responses of a [`PendingHistory`].
pub struct HistoryResponse {
    pub token: SessionToken,
    pub window_days: u32,
    pub analysis: anyhow::Result<MistakeAnalysisResponse>,
    pub plan: anyhow::Result<RemediationPlanResponse>,
}

/// Which halves of a history refresh succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRefresh {
    pub analysis_loaded: bool,
    pub plan_loaded: bool,
}

/// Adaptive assessment state for a single quiz attempt.
pub struct AssessmentEngine {
    session_id: Option<String>,
    attempt: uuid::Uuid,
    generation: u64,
    started_at: DateTime<Utc>,
    config: EngineConfig,
    tracker: PerformanceTracker,
    adjuster: DifficultyAdjuster,
    monitor: BehaviorMonitor,
    mistakes: MistakeAggregator,
    remediation: RemediationPlanner,
}

impl AssessmentEngine {
    pub fn new(
        session_id: Option<String>,
        config: EngineConfig,
        behavior: Arc<dyn BehaviorAnalytics>,
        mistakes: Arc<dyn MistakeAnalytics>,
    ) -> Self {
        Self {
            session_id,
            attempt: uuid::Uuid::new_v4(),
            generation: 0,
            started_at: Utc::now(),
            tracker: PerformanceTracker::new(),
            adjuster: DifficultyAdjuster::new(config.initial_difficulty, config.thresholds()),
            monitor: BehaviorMonitor::new(behavior, config.suggestion_policy()),
            mistakes: MistakeAggregator::new(Arc::clone(&mistakes)),
            remediation: RemediationPlanner::new(mistakes, config.remediation_policy()),
            config,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn token(&self) -> SessionToken {
        SessionToken {
            session_id: self.session_id.clone(),
            attempt: self.attempt,
            generation: self.generation,
        }
    }

    // -----------------------------------------------------------------------
    // Answers
    // -----------------------------------------------------------------------

    /// Record an answer and re-evaluate difficulty.
    ///
    /// Returns the level to serve for the next question.
    pub fn record_answer(&mut self, is_correct: bool, time_spent_ms: u64) -> DifficultyLevel {
        self.tracker.record_answer(is_correct, time_spent_ms);
        self.adjuster.on_answer(self.tracker.records());
        self.adjuster.current()
    }

    /// Record an answer and, every `check_interval` answers, run the behavior check.
    pub async fn answer(
        &mut self,
        is_correct: bool,
        time_spent_ms: u64,
        signals: BehaviorSignals,
    ) -> AnswerOutcome {
        let record = self.tracker.record_answer(is_correct, time_spent_ms).clone();
        let transition = self.adjuster.on_answer(self.tracker.records()).cloned();

        let adjustments = if self.is_check_due() {
            self.check_adjustments(signals).await
        } else {
            None
        };

        AnswerOutcome {
            question_number: self.question_number(),
            record,
            difficulty: self.current_difficulty(),
            transition,
            accuracy: self.current_accuracy(),
            trend: self.difficulty_trend(),
            adjustments,
        }
    }

    /// Number of answers recorded this session.
    pub fn question_number(&self) -> usize {
        self.tracker.len()
    }

    pub fn current_difficulty(&self) -> DifficultyLevel {
        self.adjuster.current()
    }

    /// Rounded session accuracy in percent.
    pub fn current_accuracy(&self) -> u32 {
        self.tracker.accuracy()
    }

    /// Accuracy over the difficulty window, `None` before the first answer.
    pub fn window_accuracy(&self) -> Option<f64> {
        self.adjuster.window_accuracy(self.tracker.records())
    }

    pub fn difficulty_trend(&self) -> Trend {
        trend::analyze(self.tracker.records())
    }

    pub fn adjustment_events(&self) -> &[DifficultyAdjustmentEvent] {
        self.adjuster.events()
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        self.tracker.records()
    }

    // -----------------------------------------------------------------------
    // Behavior monitoring
    // -----------------------------------------------------------------------

    pub fn is_check_due(&self) -> bool {
        BehaviorMonitor::is_check_due(self.question_number(), self.config.check_interval)
    }

    /// Combine local state with caller-observed signals.
    pub fn snapshot(&self, signals: BehaviorSignals) -> BehaviorSnapshot {
        BehaviorSnapshot {
            question_number: self.question_number(),
            current_accuracy: self.current_accuracy(),
            average_time_ms: self.tracker.average_time_ms(),
            current_difficulty: self.current_difficulty(),
            idle_time_ms: signals.idle_time_ms,
            tab_switches: signals.tab_switches,
            extra: signals.extra,
        }
    }

    /// Run a behavior check to completion.
    ///
    /// `None` when there is no session id or the service call failed.
    pub async fn check_adjustments(&mut self, signals: BehaviorSignals) -> Option<AdjustmentOutcome> {
        let pending = self.begin_check(signals)?;
        let response = pending.run().await;
        self.complete_check(response).ok().flatten()
    }

    /// Prepare a behavior check; `None` when there is no session id.
    pub fn begin_check(&self, signals: BehaviorSignals) -> Option<PendingCheck> {
        let Some(session_id) = self.session_id.clone().filter(|id| !id.is_empty()) else {
            tracing::debug!("behavior check skipped: {}", EngineError::MissingSession);
            return None;
        };
        Some(PendingCheck {
            token: self.token(),
            session_id,
            snapshot: self.snapshot(signals),
            service: self.monitor.service(),
        })
    }

    /// Apply an arrived behavior response.
    ///
    /// Responses for an outdated token are rejected without touching state.
    pub fn complete_check(
        &mut self,
        response: CheckResponse,
    ) -> Result<Option<AdjustmentOutcome>, EngineError> {
        self.ensure_current(&response.token)?;
        match response.result {
            Ok(adjustments) => Ok(Some(self.monitor.apply(adjustments, &mut self.adjuster))),
            Err(e) => {
                self.monitor.record_failure(&e);
                Ok(None)
            }
        }
    }

    pub fn visible_suggestions(&self) -> Vec<Suggestion> {
        self.monitor.visible_suggestions()
    }

    pub fn dismiss_suggestion(&mut self, kind: &str) {
        self.monitor.dismiss_suggestion(kind);
    }

    pub fn take_break(&mut self) -> DateTime<Utc> {
        self.monitor.take_break()
    }

    pub fn is_break_due(&self, now: DateTime<Utc>) -> bool {
        self.monitor.is_break_due(self.started_at, now)
    }

    pub fn monitor(&self) -> &BehaviorMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut BehaviorMonitor {
        &mut self.monitor
    }

    /// Fetch an adapted quiz config and, before the first answer, start from
    /// the level its difficulty bias implies. Returns `None` when the fetch
    /// failed or the config carries no bias; the configured level stands.
    pub async fn apply_adapted_config(
        &mut self,
        options: &AdaptedConfigOptions,
    ) -> Option<DifficultyLevel> {
        let config = self.monitor.fetch_adapted_config(options).await?;
        let Some(bias) = config.difficulty_bias else {
            tracing::debug!("adapted config has no difficulty bias; keeping configured level");
            return None;
        };
        let level = EngineConfig::level_for_bias(bias);
        if self.tracker.is_empty() {
            self.config.initial_difficulty = level;
            self.adjuster.set_initial(level);
        } else {
            tracing::debug!("adapted config arrived mid-session; keeping current level");
        }
        Some(level)
    }

    // -----------------------------------------------------------------------
    // Historical analysis
    // -----------------------------------------------------------------------

    /// Fetch the mistake distribution; defaults to the configured window.
    pub async fn fetch_mistake_analysis(
        &mut self,
        window_days: Option<u32>,
    ) -> Option<&MistakeDistribution> {
        let days = window_days.unwrap_or(self.config.mistake_window_days);
        self.mistakes.fetch_mistake_analysis(days).await
    }

    pub async fn fetch_remediation_plan(&mut self) -> Option<&RemediationPlan> {
        self.remediation.fetch_remediation_plan().await
    }

    /// Fetch analysis and plan concurrently and store what arrived.
    pub async fn refresh_history(&mut self) -> HistoryRefresh {
        let pending = self.begin_history_refresh(None);
        let response = pending.run().await;
        self.complete_history_refresh(response)
            .unwrap_or(HistoryRefresh {
                analysis_loaded: false,
                plan_loaded: false,
            })
    }

    pub fn begin_history_refresh(&self, window_days: Option<u32>) -> PendingHistory {
        PendingHistory {
            token: self.token(),
            window_days: window_days.unwrap_or(self.config.mistake_window_days),
            service: self.mistakes.service(),
        }
    }

    pub fn complete_history_refresh(
        &mut self,
        response: HistoryResponse,
    ) -> Result<HistoryRefresh, EngineError> {
        self.ensure_current(&response.token)?;
        let analysis_loaded = match response.analysis {
            Ok(r) => {
                self.mistakes.store(response.window_days, r.analysis);
                true
            }
            Err(e) => {
                self.mistakes.record_failure(&e);
                false
            }
        };
        let plan_loaded = match response.plan {
            Ok(r) => {
                self.remediation.store(r.remediation_plan);
                true
            }
            Err(e) => {
                self.remediation.record_failure(&e);
                false
            }
        };
        Ok(HistoryRefresh {
            analysis_loaded,
            plan_loaded,
        })
    }

    pub fn mistakes(&self) -> &MistakeAggregator {
        &self.mistakes
    }

    pub fn remediation(&self) -> &RemediationPlanner {
        &self.remediation
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Clear session state and invalidate in-flight responses.
    ///
    /// Historical mistake data is per learner, not per session, and survives.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.started_at = Utc::now();
        self.tracker.reset();
        self.adjuster.reset();
        self.monitor.reset();
        tracing::debug!(
            session_id = self.session_id.as_deref().unwrap_or("-"),
            generation = self.generation,
            "session reset"
        );
    }

    /// Reset and continue under a new session id.
    pub fn restart(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
        self.reset();
    }

    /// Snapshot of the session for persistence or display.
    pub fn report(&self) -> SessionReport {
        SessionReport {
            id: uuid::Uuid::new_v4(),
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            created_at: Utc::now(),
            questions_answered: self.question_number(),
            accuracy: self.current_accuracy(),
            initial_difficulty: self.adjuster.initial(),
            final_difficulty: self.current_difficulty(),
            trend: self.difficulty_trend(),
            chunk_accuracies: trend::chunk_accuracies(self.tracker.records()),
            events: self.adjuster.events().to_vec(),
            suggestions: self.visible_suggestions(),
            break_reminder: self.monitor.break_reminder(),
            last_break_time: self.monitor.last_break_time(),
            total_mistakes: self.mistakes.total_mistakes(),
            top_remediation: self.remediation.top_items().into_iter().cloned().collect(),
        }
    }

    fn ensure_current(&self, token: &SessionToken) -> Result<(), EngineError> {
        if token.attempt == self.attempt
            && token.session_id == self.session_id
            && token.generation == self.generation
        {
            return Ok(());
        }
        let err = EngineError::StaleSession {
            session_id: token.session_id.clone().unwrap_or_default(),
            received: token.generation,
            current: self.generation,
        };
        tracing::debug!("dropping response: {err}");
        Err(err)
    }
}

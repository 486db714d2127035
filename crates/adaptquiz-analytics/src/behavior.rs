//! HTTP client for the behavior analytics service.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use adaptquiz_core::model::{BehaviorSnapshot, SessionRecommendations};
use adaptquiz_core::traits::{
    AdaptedConfigOptions, AdaptedConfigResponse, BehaviorAnalytics, MidQuizAdjustments,
};

use crate::http::ApiClient;

/// Behavior analytics over JSON/HTTP with bearer-token auth.
pub struct HttpBehaviorAnalytics {
    api: ApiClient,
}

#[derive(Deserialize, Default)]
struct RecommendationsEnvelope {
    #[serde(default)]
    recommendations: SessionRecommendations,
}

impl HttpBehaviorAnalytics {
    pub fn new(base_url: &str, auth_token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url, auth_token, timeout_secs)?,
        })
    }
}

#[async_trait]
impl BehaviorAnalytics for HttpBehaviorAnalytics {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, snapshot), fields(question = snapshot.question_number))]
    async fn get_mid_quiz_adjustments(
        &self,
        session_id: &str,
        snapshot: &BehaviorSnapshot,
    ) -> anyhow::Result<MidQuizAdjustments> {
        let request = self
            .api
            .post(self.api.url(&["api", "behavior", "sessions", session_id, "adjustments"]))
            .json(snapshot);
        self.api.send(request, "session").await
    }

    #[instrument(skip(self, options))]
    async fn get_adapted_quiz_config(
        &self,
        options: &AdaptedConfigOptions,
    ) -> anyhow::Result<AdaptedConfigResponse> {
        let request = self.api.post(self.api.url(&["api", "behavior", "adapted-config"])).json(options);
        self.api.send(request, "adapted config").await
    }

    #[instrument(skip(self))]
    async fn get_session_recommendations(&self) -> anyhow::Result<SessionRecommendations> {
        let request = self.api.get(self.api.url(&["api", "behavior", "recommendations"]));
        let envelope: RecommendationsEnvelope = self.api.send(request, "recommendations").await?;
        Ok(envelope.recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptquiz_core::error::AnalyticsError;
    use adaptquiz_core::model::{DifficultyLevel, Priority};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn snapshot() -> BehaviorSnapshot {
        BehaviorSnapshot {
            question_number: 5,
            current_accuracy: 60,
            average_time_ms: 4_200,
            current_difficulty: DifficultyLevel::Intermediate,
            idle_time_ms: 0,
            tab_switches: 3,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn mid_quiz_adjustments_posts_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/behavior/sessions/quiz-1/adjustments"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(serde_json::json!({
                "questionNumber": 5,
                "currentAccuracy": 60,
                "currentDifficulty": "intermediate",
                "tabSwitches": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "suggestions": [
                    {"type": "break_suggestion", "priority": "high", "message": "Take a break"}
                ],
                "metrics": {"fatigueLevel": 0.7},
                "adjustments": [{"type": "difficulty_reduction", "reason": "fatigue"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpBehaviorAnalytics::new(&server.uri(), Some("tok".into()), 5).unwrap();
        let resp = client
            .get_mid_quiz_adjustments("quiz-1", &snapshot())
            .await
            .unwrap();

        assert_eq!(resp.suggestions.len(), 1);
        assert_eq!(resp.suggestions[0].priority, Priority::High);
        assert_eq!(resp.adjustments[0].kind, "difficulty_reduction");
        assert_eq!(resp.metrics.fatigue_level, Some(0.7));
    }

    #[tokio::test]
    async fn adapted_config_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/behavior/adapted-config"))
            .and(body_partial_json(serde_json::json!({"questionCount": 20})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "config": {"difficultyBias": 0.5, "breakSuggestionInterval": 10}
            })))
            .mount(&server)
            .await;

        let client = HttpBehaviorAnalytics::new(&server.uri(), None, 5).unwrap();
        let resp = client
            .get_adapted_quiz_config(&AdaptedConfigOptions {
                question_count: Some(20),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(resp.config.difficulty_bias, Some(0.5));
        assert_eq!(resp.config.break_suggestion_interval, Some(10));
    }

    #[tokio::test]
    async fn recommendations_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/behavior/recommendations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "recommendations": {"recommendedDurationMinutes": 25, "bestTimeOfDay": "morning"}
            })))
            .mount(&server)
            .await;

        let client = HttpBehaviorAnalytics::new(&server.uri(), None, 5).unwrap();
        let recs = client.get_session_recommendations().await.unwrap();
        assert_eq!(recs.recommended_duration_minutes, Some(25));
        assert_eq!(recs.best_time_of_day.as_deref(), Some("morning"));
    }

    #[tokio::test]
    async fn session_id_is_a_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/behavior/sessions/a%2F..%2F..%2Fmistakes%2Fremediation-plan/adjustments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpBehaviorAnalytics::new(&server.uri(), None, 5).unwrap();
        let resp = client
            .get_mid_quiz_adjustments("a/../../mistakes/remediation-plan", &snapshot())
            .await
            .unwrap();
        assert!(resp.suggestions.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpBehaviorAnalytics::new(&server.uri(), None, 5).unwrap();
        let err = client
            .get_mid_quiz_adjustments("ghost", &snapshot())
            .await
            .unwrap_err();
        let typed = err.downcast_ref::<AnalyticsError>().unwrap();
        assert!(typed.is_permanent());
    }
}

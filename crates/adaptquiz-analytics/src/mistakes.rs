//! HTTP client for the mistake analytics service.

use async_trait::async_trait;
use tracing::instrument;

use adaptquiz_core::traits::{MistakeAnalysisResponse, MistakeAnalytics, RemediationPlanResponse};

use crate::http::ApiClient;

/// Mistake analytics over JSON/HTTP with bearer-token auth.
pub struct HttpMistakeAnalytics {
    api: ApiClient,
}

impl HttpMistakeAnalytics {
    pub fn new(base_url: &str, auth_token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url, auth_token, timeout_secs)?,
        })
    }
}

#[async_trait]
impl MistakeAnalytics for HttpMistakeAnalytics {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn get_mistake_analysis(&self, days: u32) -> anyhow::Result<MistakeAnalysisResponse> {
        let mut url = self.api.url(&["api", "mistakes", "analysis"]);
        url.query_pairs_mut().append_pair("days", &days.to_string());
        let request = self.api.get(url);
        self.api.send(request, "mistake analysis").await
    }

    #[instrument(skip(self))]
    async fn get_remediation_plan(&self) -> anyhow::Result<RemediationPlanResponse> {
        let request = self.api.get(self.api.url(&["api", "mistakes", "remediation-plan"]));
        self.api.send(request, "remediation plan").await
    }
}

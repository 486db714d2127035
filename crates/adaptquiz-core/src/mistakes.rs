//! Historical mistake analysis.
//!
//! The analytics service does all the aggregation; this component fetches
//! its distribution, keeps it verbatim, and exposes defaulted accessors.

use std::sync::Arc;

use crate::error::classify;
use crate::model::{FetchStatus, MistakeDistribution, MistakeTypeShare};
use crate::traits::MistakeAnalytics;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;

pub struct MistakeAggregator {
    service: Arc<dyn MistakeAnalytics>,
    analysis: Option<MistakeDistribution>,
    window_days: u32,
    status: FetchStatus,
}

impl MistakeAggregator {
    pub fn new(service: Arc<dyn MistakeAnalytics>) -> Self {
        Self {
            service,
            analysis: None,
            window_days: DEFAULT_WINDOW_DAYS,
            status: FetchStatus::Idle,
        }
    }

    /// Fetch the distribution for the last `window_days` days and store it.
    ///
    /// On failure the previous analysis is kept and `None` is returned.
    pub async fn fetch_mistake_analysis(&mut self, window_days: u32) -> Option<&MistakeDistribution> {
        match self.service.get_mistake_analysis(window_days).await {
            Ok(response) => Some(self.store(window_days, response.analysis)),
            Err(e) => {
                self.record_failure(&e);
                None
            }
        }
    }

    /// Store a distribution fetched for `window_days`.
    pub fn store(&mut self, window_days: u32, analysis: MistakeDistribution) -> &MistakeDistribution {
        tracing::debug!(
            window_days,
            total = analysis.total_mistakes.unwrap_or(0),
            "mistake analysis loaded"
        );
        self.window_days = window_days;
        self.status = FetchStatus::Ready;
        self.analysis.insert(analysis)
    }

    pub fn record_failure(&mut self, err: &anyhow::Error) {
        tracing::warn!(kind = classify(err), "mistake analysis fetch failed: {err:#}");
        self.status = FetchStatus::Failed(err.to_string());
    }

    pub fn service(&self) -> Arc<dyn MistakeAnalytics> {
        Arc::clone(&self.service)
    }

    pub fn analysis(&self) -> Option<&MistakeDistribution> {
        self.analysis.as_ref()
    }

    pub fn total_mistakes(&self) -> u64 {
        self.analysis
            .as_ref()
            .and_then(|a| a.total_mistakes)
            .unwrap_or(0)
    }

    /// First entry of the service's trend list, which it sorts most common first.
    pub fn most_common_mistake_type(&self) -> Option<&MistakeTypeShare> {
        self.analysis.as_ref()?.mistake_trend.first()
    }

    pub fn top_mistake_categories(&self) -> &[String] {
        self.analysis
            .as_ref()
            .map(|a| a.top_problem_categories.as_slice())
            .unwrap_or(&[])
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn clear(&mut self) {
        self.analysis = None;
        self.status = FetchStatus::Idle;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::model::{RemediationItem, RemediationPlan};
    use crate::traits::{MistakeAnalysisResponse, RemediationPlanResponse};

    /// Serves fixed data; `fail` flips every call into an error.
    #[derive(Default)]
    pub(crate) struct StaticMistakes {
        pub analysis: MistakeDistribution,
        pub plan: RemediationPlan,
        pub fail: Mutex<bool>,
        pub requested_days: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl MistakeAnalytics for StaticMistakes {
        fn name(&self) -> &str {
            "static"
        }

        async fn get_mistake_analysis(&self, days: u32) -> anyhow::Result<MistakeAnalysisResponse> {
            self.requested_days.lock().unwrap().push(days);
            if *self.fail.lock().unwrap() {
                anyhow::bail!("analytics offline");
            }
            Ok(MistakeAnalysisResponse {
                analysis: self.analysis.clone(),
            })
        }

        async fn get_remediation_plan(&self) -> anyhow::Result<RemediationPlanResponse> {
            if *self.fail.lock().unwrap() {
                anyhow::bail!("analytics offline");
            }
            Ok(RemediationPlanResponse {
                remediation_plan: self.plan.clone(),
            })
        }
    }

    pub(crate) fn sample_analysis() -> MistakeDistribution {
        MistakeDistribution {
            total_mistakes: Some(42),
            mistake_trend: vec![
                MistakeTypeShare {
                    kind: "conceptual".into(),
                    percentage: 55.0,
                },
                MistakeTypeShare {
                    kind: "careless".into(),
                    percentage: 45.0,
                },
            ],
            top_problem_categories: vec!["polity".into(), "economy".into()],
        }
    }

    pub(crate) fn sample_plan() -> RemediationPlan {
        let item = |category: &str, priority: f64| RemediationItem {
            category: category.into(),
            priority,
            recommended_sessions: 2,
        };
        RemediationPlan {
            items: vec![
                item("polity", 0.9),
                item("economy", 0.4),
                item("geography", 0.8),
                item("history", 0.95),
            ],
            estimated_time_to_mastery_hours: 14.0,
        }
    }

    #[tokio::test]
    async fn defaults_before_fetch() {
        let aggregator = MistakeAggregator::new(Arc::new(StaticMistakes::default()));
        assert_eq!(aggregator.total_mistakes(), 0);
        assert!(aggregator.most_common_mistake_type().is_none());
        assert!(aggregator.top_mistake_categories().is_empty());
        assert_eq!(aggregator.status(), &FetchStatus::Idle);
    }

    #[tokio::test]
    async fn stores_distribution_verbatim() {
        let service = Arc::new(StaticMistakes {
            analysis: sample_analysis(),
            ..Default::default()
        });
        let mut aggregator = MistakeAggregator::new(service.clone());
        let stored = aggregator.fetch_mistake_analysis(14).await.cloned();
        assert_eq!(stored, Some(sample_analysis()));
        assert_eq!(aggregator.total_mistakes(), 42);
        assert_eq!(aggregator.most_common_mistake_type().unwrap().kind, "conceptual");
        assert_eq!(aggregator.top_mistake_categories(), ["polity", "economy"]);
        assert_eq!(aggregator.window_days(), 14);
        assert_eq!(*service.requested_days.lock().unwrap(), vec![14]);
    }

    #[tokio::test]
    async fn empty_distribution_defaults() {
        let mut aggregator = MistakeAggregator::new(Arc::new(StaticMistakes::default()));
        aggregator.fetch_mistake_analysis(30).await;
        assert_eq!(aggregator.total_mistakes(), 0);
        assert!(aggregator.most_common_mistake_type().is_none());
        assert_eq!(aggregator.status(), &FetchStatus::Ready);
    }

    #[tokio::test]
    async fn failure_keeps_previous_analysis() {
        let service = Arc::new(StaticMistakes {
            analysis: sample_analysis(),
            ..Default::default()
        });
        let mut aggregator = MistakeAggregator::new(service.clone());
        aggregator.fetch_mistake_analysis(30).await;

        *service.fail.lock().unwrap() = true;
        assert!(aggregator.fetch_mistake_analysis(7).await.is_none());
        assert_eq!(aggregator.total_mistakes(), 42);
        assert_eq!(aggregator.window_days(), 30);
        assert!(aggregator.status().is_failed());
    }
}

//! Remediation study plan.

use std::sync::Arc;

use crate::error::classify;
use crate::model::{FetchStatus, RemediationItem, RemediationPlan};
use crate::policy::RemediationPolicy;
use crate::traits::MistakeAnalytics;

/// Fetches the learner's remediation plan and exposes its top items.
///
/// Items are never re-ranked locally; the service's order is what the
/// learner sees, cut to the policy limit.
pub struct RemediationPlanner {
    service: Arc<dyn MistakeAnalytics>,
    policy: RemediationPolicy,
    plan: Option<RemediationPlan>,
    status: FetchStatus,
}

impl RemediationPlanner {
    pub fn new(service: Arc<dyn MistakeAnalytics>, policy: RemediationPolicy) -> Self {
        Self {
            service,
            policy,
            plan: None,
            status: FetchStatus::Idle,
        }
    }

    /// Fetch and store the plan. On failure the previous plan is kept.
    pub async fn fetch_remediation_plan(&mut self) -> Option<&RemediationPlan> {
        match self.service.get_remediation_plan().await {
            Ok(response) => Some(self.store(response.remediation_plan)),
            Err(e) => {
                self.record_failure(&e);
                None
            }
        }
    }

    pub fn store(&mut self, plan: RemediationPlan) -> &RemediationPlan {
        tracing::debug!(
            items = plan.items.len(),
            hours = plan.estimated_time_to_mastery_hours,
            "remediation plan loaded"
        );
        self.status = FetchStatus::Ready;
        self.plan.insert(plan)
    }

    pub fn record_failure(&mut self, err: &anyhow::Error) {
        tracing::warn!(kind = classify(err), "remediation plan fetch failed: {err:#}");
        self.status = FetchStatus::Failed(err.to_string());
    }

    pub fn service(&self) -> Arc<dyn MistakeAnalytics> {
        Arc::clone(&self.service)
    }

    /// The full plan as returned by the service.
    pub fn plan(&self) -> Option<&RemediationPlan> {
        self.plan.as_ref()
    }

    /// Items shown to the learner: the first few in received order.
    pub fn top_items(&self) -> Vec<&RemediationItem> {
        self.plan
            .as_ref()
            .map(|p| self.policy.present(&p.items))
            .unwrap_or_default()
    }

    pub fn estimated_time_to_mastery_hours(&self) -> f64 {
        self.plan
            .as_ref()
            .map(|p| p.estimated_time_to_mastery_hours)
            .unwrap_or(0.0)
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn clear(&mut self) {
        self.plan = None;
        self.status = FetchStatus::Idle;
    }
}

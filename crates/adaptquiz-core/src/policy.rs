//! Presentation policies for suggestions and remediation items.
//!
//! Both policies keep the order the service returned and only cap the count.
//! Callers that want a different ordering switch the [`Ordering`].

use serde::{Deserialize, Serialize};

use crate::model::{RemediationItem, Suggestion};

/// How presented items are ordered before capping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ordering {
    /// Keep the order the collaborator returned.
    #[default]
    Received,
    /// Highest priority first; ties keep received order.
    PriorityDescending,
}

/// Which suggestions are shown to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionPolicy {
    pub limit: usize,
    #[serde(default)]
    pub ordering: Ordering,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self {
            limit: 2,
            ordering: Ordering::Received,
        }
    }
}

impl SuggestionPolicy {
    pub fn present<'a>(&self, suggestions: &'a [Suggestion]) -> Vec<&'a Suggestion> {
        let mut items: Vec<&Suggestion> = suggestions.iter().collect();
        if self.ordering == Ordering::PriorityDescending {
            items.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        items.truncate(self.limit);
        items
    }
}

/// Which remediation items are shown in the study plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationPolicy {
    pub limit: usize,
    #[serde(default)]
    pub ordering: Ordering,
}

impl Default for RemediationPolicy {
    fn default() -> Self {
        Self {
            limit: 3,
            ordering: Ordering::Received,
        }
    }
}

impl RemediationPolicy {
    pub fn present<'a>(&self, items: &'a [RemediationItem]) -> Vec<&'a RemediationItem> {
        let mut presented: Vec<&RemediationItem> = items.iter().collect();
        if self.ordering == Ordering::PriorityDescending {
            presented.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        }
        presented.truncate(self.limit);
        presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    fn suggestion(kind: &str, priority: Priority) -> Suggestion {
        Suggestion {
            kind: kind.into(),
            priority,
            message: String::new(),
            actionable: false,
        }
    }

    fn item(category: &str, priority: f64) -> RemediationItem {
        RemediationItem {
            category: category.into(),
            priority,
            recommended_sessions: 1,
        }
    }

    #[test]
    fn suggestions_capped_in_received_order() {
        let all = vec![
            suggestion("pace", Priority::Low),
            suggestion("focus", Priority::Medium),
            suggestion("break_suggestion", Priority::High),
        ];
        let shown = SuggestionPolicy::default().present(&all);
        let kinds: Vec<&str> = shown.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, ["pace", "focus"]);
    }

    #[test]
    fn suggestions_by_priority_when_requested() {
        let all = vec![
            suggestion("pace", Priority::Low),
            suggestion("focus", Priority::Medium),
            suggestion("break_suggestion", Priority::High),
        ];
        let policy = SuggestionPolicy {
            limit: 2,
            ordering: Ordering::PriorityDescending,
        };
        let kinds: Vec<&str> = policy.present(&all).iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, ["break_suggestion", "focus"]);
    }

    #[test]
    fn remediation_keeps_first_three() {
        let items = vec![
            item("a", 0.1),
            item("b", 0.9),
            item("c", 0.5),
            item("d", 1.0),
        ];
        let shown = RemediationPolicy::default().present(&items);
        let cats: Vec<&str> = shown.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(cats, ["a", "b", "c"]);
    }

    #[test]
    fn fewer_items_than_limit() {
        let items = vec![item("a", 0.3)];
        assert_eq!(RemediationPolicy::default().present(&items).len(), 1);
        assert!(SuggestionPolicy::default().present(&[]).is_empty());
    }
}

//! Keyed collection of live assessment sessions.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{AssessmentEngine, EngineConfig};
use crate::error::EngineError;
use crate::report::SessionReport;
use crate::traits::{BehaviorAnalytics, MistakeAnalytics};

/// Owns one [`AssessmentEngine`] per session id, all sharing the same
/// configuration and analytics clients.
pub struct SessionRegistry {
    config: EngineConfig,
    behavior: Arc<dyn BehaviorAnalytics>,
    mistakes: Arc<dyn MistakeAnalytics>,
    sessions: HashMap<String, AssessmentEngine>,
}

impl SessionRegistry {
    pub fn new(
        config: EngineConfig,
        behavior: Arc<dyn BehaviorAnalytics>,
        mistakes: Arc<dyn MistakeAnalytics>,
    ) -> Self {
        Self {
            config,
            behavior,
            mistakes,
            sessions: HashMap::new(),
        }
    }

    /// Start a session, replacing any previous one under the same id.
    pub fn start(&mut self, session_id: impl Into<String>) -> &mut AssessmentEngine {
        let session_id = session_id.into();
        let engine = AssessmentEngine::new(
            Some(session_id.clone()),
            self.config.clone(),
            Arc::clone(&self.behavior),
            Arc::clone(&self.mistakes),
        );
        match self.sessions.entry(session_id) {
            Entry::Occupied(mut slot) => {
                tracing::debug!(session_id = %slot.key(), "replaced existing session");
                slot.insert(engine);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(engine),
        }
    }

    pub fn get(&self, session_id: &str) -> Result<&AssessmentEngine, EngineError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| EngineError::UnknownSession(session_id.to_string()))
    }

    pub fn get_mut(&mut self, session_id: &str) -> Result<&mut AssessmentEngine, EngineError> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| EngineError::UnknownSession(session_id.to_string()))
    }

    /// Remove a session and return its final report.
    pub fn end(&mut self, session_id: &str) -> Option<SessionReport> {
        let engine = self.sessions.remove(session_id)?;
        Some(engine.report())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sessions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

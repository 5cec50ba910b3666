//! Request lifecycle for a single study session.
//!
//! The controller moves through `Idle -> Loading -> Success | Error` and back
//! again for every submission. At most one submission is in flight: a new one
//! is rejected with [`StudyError::Busy`] while loading, and outcomes that do
//! not belong to the current submission are dropped.

use crate::client::StudyFetcher;
use crate::error::StudyError;
use crate::history::HistoryStore;
use crate::storage::KeyValueStore;
use crate::study::{Mode, StudyData};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success(StudyData),
    Error(StudyError),
}

/// Plain discriminant of [`Phase`], for callers that only branch on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PhaseKind {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub topic: String,
    pub mode: Mode,
    pub phase: Phase,
}

impl SessionState {
    pub fn kind(&self) -> PhaseKind {
        match self.phase {
            Phase::Idle => PhaseKind::Idle,
            Phase::Loading => PhaseKind::Loading,
            Phase::Success(_) => PhaseKind::Success,
            Phase::Error(_) => PhaseKind::Error,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn result(&self) -> Option<&StudyData> {
        match &self.phase {
            Phase::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StudyError> {
        match &self.phase {
            Phase::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(StudyError::user_message)
    }
}

/// Ticket for an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: u64,
    pub topic: String,
    pub mode: Mode,
}

pub struct SessionController<F: StudyFetcher, S: KeyValueStore> {
    fetcher: F,
    history: HistoryStore<S>,
    state: SessionState,
    current: u64,
}

impl<F: StudyFetcher, S: KeyValueStore> SessionController<F, S> {
    pub fn new(fetcher: F, history: HistoryStore<S>) -> Self {
        Self {
            fetcher,
            history,
            state: SessionState::default(),
            current: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Validate and accept a submission, moving to `Loading`.
    ///
    /// An empty topic moves to `Error` without touching history. While a
    /// submission is loading, further ones are rejected and state is left
    /// untouched.
    pub fn begin(&mut self, topic: &str, mode: Mode) -> Result<Submission, StudyError> {
        if self.state.is_loading() {
            tracing::debug!(topic, "rejecting submission while another is loading");
            return Err(StudyError::Busy);
        }

        let trimmed = topic.trim();
        self.state.topic = trimmed.to_string();
        self.state.mode = mode;

        if trimmed.is_empty() {
            self.state.phase = Phase::Error(StudyError::Validation);
            return Err(StudyError::Validation);
        }

        self.current += 1;
        self.state.phase = Phase::Loading;
        tracing::info!(id = self.current, topic = trimmed, %mode, "submitting topic");

        Ok(Submission {
            id: self.current,
            topic: trimmed.to_string(),
            mode,
        })
    }

    /// Apply the outcome of `submission`. Returns false if it was stale.
    pub fn complete(
        &mut self,
        submission: &Submission,
        outcome: Result<StudyData, StudyError>,
    ) -> bool {
        if submission.id != self.current || !self.state.is_loading() {
            tracing::warn!(
                id = submission.id,
                current = self.current,
                "discarding stale study response"
            );
            return false;
        }

        match outcome {
            Ok(data) => {
                tracing::info!(id = submission.id, "study data received");
                self.history.record(&submission.topic, submission.mode);
                self.state.phase = Phase::Success(data);
            }
            Err(e) => {
                tracing::warn!(id = submission.id, error = ?e, "study request failed");
                self.state.phase = Phase::Error(e);
            }
        }
        true
    }

    /// Fetch for an accepted submission and apply the outcome.
    pub async fn resolve(&mut self, submission: &Submission) -> &SessionState {
        let outcome = self
            .fetcher
            .fetch(&submission.topic, submission.mode)
            .await;
        self.complete(submission, outcome);
        &self.state
    }

    pub async fn submit(&mut self, topic: &str, mode: Mode) -> &SessionState {
        match self.begin(topic, mode) {
            Ok(submission) => self.resolve(&submission).await,
            Err(_) => &self.state,
        }
    }

    /// Back to `Idle`. Does not touch history.
    pub fn reset(&mut self) {
        // bump the id so an abandoned in-flight response can never land
        self.current += 1;
        self.state = SessionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::study::{MathQuestion, QuizQuestion};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct ScriptedFetcher {
        responses: Arc<Mutex<VecDeque<Result<StudyData, StudyError>>>>,
        calls: Arc<Mutex<Vec<(String, Mode)>>>,
    }

    impl ScriptedFetcher {
        fn push(&self, r: Result<StudyData, StudyError>) {
            self.responses.lock().unwrap().push_back(r);
        }

        fn calls(&self) -> Vec<(String, Mode)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StudyFetcher for ScriptedFetcher {
        async fn fetch(&self, topic: &str, mode: Mode) -> Result<StudyData, StudyError> {
            self.calls.lock().unwrap().push((topic.to_string(), mode));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(StudyError::Unknown("no scripted response".into())))
        }
    }

    fn quantum_data() -> StudyData {
        StudyData::Default {
            summary: vec!["S1".into()],
            quiz: vec![QuizQuestion {
                question: "Q1".into(),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: 1,
            }],
            study_tip: "T1".into(),
        }
    }

    fn controller() -> (
        SessionController<ScriptedFetcher, MemoryStore>,
        ScriptedFetcher,
        MemoryStore,
    ) {
        let fetcher = ScriptedFetcher::default();
        let store = MemoryStore::new();
        let c = SessionController::new(fetcher.clone(), HistoryStore::load(store.clone()));
        (c, fetcher, store)
    }

    #[test]
    fn starts_idle() {
        let (c, _, _) = controller();
        assert_eq!(c.state().kind(), PhaseKind::Idle);
        assert!(c.state().result().is_none());
        assert!(c.state().error_message().is_none());
    }

    #[tokio::test]
    async fn blank_topic_never_fetches() {
        let (mut c, fetcher, _) = controller();
        for topic in ["", "   ", "\t\n"] {
            let state = c.submit(topic, Mode::Default).await;
            assert_eq!(state.kind(), PhaseKind::Error);
            assert_eq!(state.error_message().as_deref(), Some("Please enter a topic"));
        }
        assert!(fetcher.calls().is_empty());
        assert!(c.history().is_empty());
    }

    #[tokio::test]
    async fn quantum_physics_scenario() {
        let (mut c, fetcher, _) = controller();
        fetcher.push(Ok(quantum_data()));

        let state = c.submit("Quantum Physics", Mode::Default).await;
        assert_eq!(state.kind(), PhaseKind::Success);
        assert_eq!(state.result(), Some(&quantum_data()));
        assert_eq!(state.result().unwrap().summary(), &["S1".to_string()]);
        assert!(state.error().is_none());

        let entries = c.history().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].topic, "Quantum Physics");
        assert_eq!(entries[0].mode, Mode::Default);
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn topic_is_trimmed_before_fetch_and_history() {
        let (mut c, fetcher, _) = controller();
        fetcher.push(Ok(quantum_data()));
        c.submit("  Optics  ", Mode::Math).await;
        assert_eq!(fetcher.calls(), vec![("Optics".to_string(), Mode::Math)]);
        assert_eq!(c.history().entries()[0].topic, "Optics");
        assert_eq!(c.state().topic, "Optics");
    }

    #[tokio::test]
    async fn timeout_leaves_history_alone() {
        let (mut c, fetcher, _) = controller();
        fetcher.push(Err(StudyError::Timeout));
        let state = c.submit("Optics", Mode::Default).await;
        assert_eq!(state.kind(), PhaseKind::Error);
        assert!(state.error_message().unwrap().contains("timed out"));
        assert!(c.history().is_empty());
    }

    #[tokio::test]
    async fn success_after_error_clears_error() {
        let (mut c, fetcher, _) = controller();
        fetcher.push(Err(StudyError::Connection));
        fetcher.push(Ok(StudyData::Math {
            math_question: MathQuestion {
                question: "1+1".into(),
                answer: "2".into(),
                explanation: "count".into(),
            },
            study_tip: "tip".into(),
        }));

        c.submit("Arithmetic", Mode::Math).await;
        assert_matches!(c.state().error(), Some(StudyError::Connection));

        let state = c.submit("Arithmetic", Mode::Math).await;
        assert!(state.error().is_none());
        assert_eq!(state.result().unwrap().mode(), Mode::Math);
    }

    #[tokio::test]
    async fn repeated_topic_dedups_history() {
        let (mut c, fetcher, _) = controller();
        fetcher.push(Ok(quantum_data()));
        fetcher.push(Ok(quantum_data()));
        fetcher.push(Ok(quantum_data()));
        c.submit("Algebra", Mode::Default).await;
        c.submit("Geometry", Mode::Default).await;
        let before = c.history().entries()[1].timestamp;
        c.submit("Algebra", Mode::Default).await;

        let entries = c.history().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].topic, "Algebra");
        assert!(entries[0].timestamp >= before);
    }

    #[test]
    fn begin_while_loading_is_rejected() {
        let (mut c, _, _) = controller();
        let first = c.begin("Chemistry", Mode::Default).unwrap();
        assert_eq!(c.begin("Biology", Mode::Default), Err(StudyError::Busy));

        assert!(c.state().is_loading());
        assert_eq!(c.state().topic, "Chemistry");

        assert!(c.complete(&first, Ok(quantum_data())));
        assert_eq!(c.state().kind(), PhaseKind::Success);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let (mut c, _, _) = controller();
        let abandoned = c.begin("Chemistry", Mode::Default).unwrap();
        c.reset();
        let current = c.begin("Biology", Mode::Default).unwrap();
        assert!(current.id > abandoned.id);

        assert!(!c.complete(&abandoned, Ok(quantum_data())));
        assert!(c.state().is_loading());
        assert!(c.history().is_empty());

        assert!(c.complete(&current, Err(StudyError::Timeout)));
        assert_eq!(c.state().kind(), PhaseKind::Error);
    }

    #[test]
    fn completion_applies_only_once() {
        let (mut c, _, _) = controller();
        let s = c.begin("Chemistry", Mode::Default).unwrap();
        assert!(c.complete(&s, Ok(quantum_data())));
        assert!(!c.complete(&s, Err(StudyError::Timeout)));
        assert_eq!(c.state().kind(), PhaseKind::Success);
        assert_eq!(c.history().len(), 1);
    }

    #[tokio::test]
    async fn clear_history_persists() {
        let (mut c, fetcher, store) = controller();
        fetcher.push(Ok(quantum_data()));
        c.submit("Algebra", Mode::Default).await;
        c.clear_history();
        assert!(HistoryStore::load(store).is_empty());
    }
}

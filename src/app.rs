use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

use crate::client::StudyFetcher;
use crate::history::HistoryStore;
use crate::preferences::Preferences;
use crate::quiz::QuizProgress;
use crate::session::{SessionController, SessionState, Submission};
use crate::storage::KeyValueStore;
use crate::study::{Mode, StudyData};

const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Topic,
    History,
    Quiz,
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Submit,
    Quit,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    shown_at: Instant,
}

pub struct App<F: StudyFetcher, S: KeyValueStore> {
    pub controller: SessionController<F, S>,
    pub prefs: Preferences<S>,
    pub input: String,
    pub mode: Mode,
    pub focus: Focus,
    pub history_cursor: usize,
    pub quiz: QuizProgress,
    pub notice: Option<Notice>,
}

impl<F: StudyFetcher, S: KeyValueStore + Clone> App<F, S> {
    pub fn new(fetcher: F, store: S, mode: Mode) -> Self {
        let history = HistoryStore::load(store.clone());
        Self {
            controller: SessionController::new(fetcher, history),
            prefs: Preferences::load(store),
            input: String::new(),
            mode,
            focus: Focus::Topic,
            history_cursor: 0,
            quiz: QuizProgress::new(),
            notice: None,
        }
    }
}

impl<F: StudyFetcher, S: KeyValueStore> App<F, S> {
    pub fn state(&self) -> &SessionState {
        self.controller.state()
    }

    pub fn history(&self) -> &HistoryStore<S> {
        self.controller.history()
    }

    pub fn result(&self) -> Option<&StudyData> {
        self.controller.state().result()
    }

    /// Whether the form's submit button is enabled
    pub fn can_submit(&self) -> bool {
        !self.state().is_loading() && !self.input.trim().is_empty()
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    pub fn on_tick(&mut self) {
        if let Some(n) = &self.notice {
            if n.shown_at.elapsed() >= NOTICE_TTL {
                self.notice = None;
            }
        }
    }

    /// Start a submission of the current form. `None` if it was refused.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        let submission = self.controller.begin(&self.input, self.mode).ok()?;
        self.quiz = QuizProgress::new();
        Some(submission)
    }

    pub async fn finish_submit(&mut self, submission: &Submission) {
        self.controller.resolve(submission).await;
        if self.result().is_some() {
            self.focus = Focus::Quiz;
            self.history_cursor = 0;
        }
    }

    pub async fn submit(&mut self) {
        if let Some(submission) = self.begin_submit() {
            self.finish_submit(&submission).await;
        }
    }

    /// Put a past topic back into the form without submitting it.
    pub fn recall_history(&mut self, index: usize) {
        if let Some(entry) = self.history().get(index).cloned() {
            self.input = entry.topic;
            self.mode = entry.mode;
            self.focus = Focus::Topic;
        }
    }

    /// Empty the form and drop the current result
    pub fn reset(&mut self) {
        self.controller.reset();
        self.input.clear();
        self.quiz = QuizProgress::new();
        self.focus = Focus::Topic;
    }

    pub fn clear_history(&mut self) {
        self.controller.clear_history();
        self.history_cursor = 0;
        if self.focus == Focus::History {
            self.focus = Focus::Topic;
        }
        self.notify("History cleared");
    }

    fn cycle_focus(&mut self) {
        let has_history = !self.history().is_empty();
        let has_result = self.result().is_some();
        self.focus = match self.focus {
            Focus::Topic if has_history => Focus::History,
            Focus::Topic | Focus::History if has_result => Focus::Quiz,
            _ => Focus::Topic,
        };
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Char('c') if ctrl => return Action::Quit,
            KeyCode::Char('d') if ctrl => {
                let dark = self.prefs.toggle_dark_mode();
                self.notify(if dark { "Dark mode on" } else { "Dark mode off" });
                return Action::None;
            }
            KeyCode::Char('t') if ctrl => {
                if !self.state().is_loading() {
                    self.mode = self.mode.toggled();
                }
                return Action::None;
            }
            KeyCode::Char('l') if ctrl => {
                self.clear_history();
                return Action::None;
            }
            KeyCode::Char('r') if ctrl => {
                self.reset();
                return Action::None;
            }
            KeyCode::Tab => {
                self.cycle_focus();
                return Action::None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Topic => self.on_topic_key(key),
            Focus::History => self.on_history_key(key),
            Focus::Quiz => self.on_quiz_key(key),
        }
    }

    fn on_topic_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => return Action::Submit,
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
            }
            _ => {}
        }
        Action::None
    }

    fn on_history_key(&mut self, key: KeyEvent) -> Action {
        let len = self.history().len();
        match key.code {
            KeyCode::Left | KeyCode::Up => {
                self.history_cursor = self.history_cursor.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Down => {
                if self.history_cursor + 1 < len {
                    self.history_cursor += 1;
                }
            }
            KeyCode::Enter => self.recall_history(self.history_cursor),
            _ => {}
        }
        Action::None
    }

    fn on_quiz_key(&mut self, key: KeyEvent) -> Action {
        let Some(data) = self.controller.state().result() else {
            return Action::None;
        };
        let focus = self.quiz.focus;
        match key.code {
            KeyCode::Up => self.quiz.focus_prev(),
            KeyCode::Down => self.quiz.focus_next(data),
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.quiz.toggle_reveal(focus);
            }
            KeyCode::Char(c) => {
                let option = match c.to_ascii_lowercase() {
                    l @ 'a'..='z' => Some(l as usize - 'a' as usize),
                    n @ '1'..='9' => Some(n as usize - '1' as usize),
                    _ => None,
                };
                let options = data.quiz().get(focus).map(|q| q.options.len()).unwrap_or(0);
                if let Some(option) = option.filter(|o| *o < options) {
                    self.quiz.select(focus, option);
                }
            }
            _ => {}
        }
        Action::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudyError;
    use crate::session::PhaseKind;
    use crate::storage::MemoryStore;
    use crate::study::QuizQuestion;
    use async_trait::async_trait;

    struct FixedFetcher(Result<StudyData, StudyError>);

    #[async_trait]
    impl StudyFetcher for FixedFetcher {
        async fn fetch(&self, _topic: &str, _mode: Mode) -> Result<StudyData, StudyError> {
            self.0.clone()
        }
    }

    fn data() -> StudyData {
        StudyData::Default {
            summary: vec!["S1".into()],
            quiz: vec![
                QuizQuestion {
                    question: "Q1".into(),
                    options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                    correct_answer: 1,
                },
                QuizQuestion {
                    question: "Q2".into(),
                    options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                    correct_answer: 3,
                },
            ],
            study_tip: "T1".into(),
        }
    }

    fn app() -> App<FixedFetcher, MemoryStore> {
        App::new(FixedFetcher(Ok(data())), MemoryStore::new(), Mode::Default)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App<FixedFetcher, MemoryStore>, s: &str) {
        for c in s.chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn typing_edits_topic_and_enter_submits() {
        let mut app = app();
        type_str(&mut app, "Algebrq");
        app.on_key(key(KeyCode::Backspace));
        type_str(&mut app, "a");
        assert_eq!(app.input, "Algebra");
        assert!(app.can_submit());
        assert_eq!(app.on_key(key(KeyCode::Enter)), Action::Submit);
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        assert_eq!(app.on_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(app.on_key(ctrl('c')), Action::Quit);
    }

    #[test]
    fn ctrl_t_toggles_mode_and_ctrl_d_dark_mode() {
        let mut app = app();
        app.on_key(ctrl('t'));
        assert_eq!(app.mode, Mode::Math);
        assert!(app.input.is_empty());

        assert!(!app.prefs.dark_mode());
        app.on_key(ctrl('d'));
        assert!(app.prefs.dark_mode());
        assert_eq!(app.notice.as_ref().unwrap().text, "Dark mode on");
    }

    #[tokio::test]
    async fn submit_records_history_and_focuses_quiz() {
        let mut app = app();
        type_str(&mut app, "Quantum Physics");
        app.submit().await;
        assert_eq!(app.state().kind(), PhaseKind::Success);
        assert_eq!(app.focus, Focus::Quiz);
        assert_eq!(app.history().entries()[0].topic, "Quantum Physics");
    }

    #[tokio::test]
    async fn empty_submit_shows_validation_error() {
        let mut app = app();
        assert!(!app.can_submit());
        app.submit().await;
        assert_eq!(
            app.state().error_message().as_deref(),
            Some("Please enter a topic")
        );
        assert_eq!(app.focus, Focus::Topic);
    }

    #[tokio::test]
    async fn failed_submit_keeps_focus() {
        let mut app = App::new(
            FixedFetcher(Err(StudyError::Connection)),
            MemoryStore::new(),
            Mode::Default,
        );
        type_str(&mut app, "Optics");
        app.submit().await;
        assert_eq!(app.state().kind(), PhaseKind::Error);
        assert_eq!(app.focus, Focus::Topic);
        assert!(app.history().is_empty());
    }

    #[tokio::test]
    async fn quiz_keys_select_and_reveal() {
        let mut app = app();
        type_str(&mut app, "Quantum");
        app.submit().await;

        app.on_key(key(KeyCode::Char('b')));
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.quiz.selected(0), Some(1));
        assert!(app.quiz.is_revealed(0));

        app.on_key(key(KeyCode::Down));
        app.on_key(key(KeyCode::Char('2')));
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.quiz.selected(1), Some(1));
        assert_eq!(app.quiz.score(app.result().unwrap()), (1, 2));

        // out of range options are ignored
        app.on_key(key(KeyCode::Up));
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Char('z')));
        assert_eq!(app.quiz.selected(0), Some(1));
    }

    #[tokio::test]
    async fn recall_restores_older_entry_topic_and_mode() {
        let mut app = app();
        type_str(&mut app, "Algebra");
        app.on_key(ctrl('t'));
        app.submit().await;
        app.input = "Optics".into();
        app.mode = Mode::Default;
        app.submit().await;

        app.recall_history(1);
        assert_eq!(app.input, "Algebra");
        assert_eq!(app.mode, Mode::Math);

        app.recall_history(5);
        assert_eq!(app.input, "Algebra");
    }

    #[tokio::test]
    async fn rejected_submit_keeps_quiz_progress() {
        let mut app = app();
        type_str(&mut app, "Algebra");
        app.submit().await;
        app.quiz.select(0, 2);

        app.input = "Optics".into();
        let pending = app.begin_submit().unwrap();
        app.quiz.select(0, 1);
        assert!(app.begin_submit().is_none());
        assert_eq!(app.quiz.selected(0), Some(1));

        app.finish_submit(&pending).await;
        assert_eq!(app.state().kind(), PhaseKind::Success);
    }

    #[tokio::test]
    async fn history_recall_and_clear() {
        let mut app = app();
        type_str(&mut app, "Algebra");
        app.on_key(ctrl('t'));
        app.submit().await;
        app.input.clear();
        app.mode = Mode::Default;
        app.focus = Focus::Topic;

        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::History);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.input, "Algebra");
        assert_eq!(app.mode, Mode::Math);
        assert_eq!(app.focus, Focus::Topic);

        app.on_key(ctrl('l'));
        assert!(app.history().is_empty());
        assert_eq!(app.notice.as_ref().unwrap().text, "History cleared");
    }

    #[tokio::test]
    async fn ctrl_r_resets_form_but_keeps_history() {
        let mut app = app();
        type_str(&mut app, "Algebra");
        app.submit().await;
        app.on_key(ctrl('r'));
        assert!(app.input.is_empty());
        assert_eq!(app.state().kind(), PhaseKind::Idle);
        assert_eq!(app.focus, Focus::Topic);
        assert_eq!(app.history().len(), 1);
    }

    #[test]
    fn tab_without_history_or_result_stays_on_topic() {
        let mut app = app();
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Topic);
    }

    #[tokio::test]
    async fn new_submission_resets_quiz_progress() {
        let mut app = app();
        type_str(&mut app, "Quantum");
        app.submit().await;
        app.on_key(key(KeyCode::Char('a')));
        assert_eq!(app.quiz.selected(0), Some(0));
        app.submit().await;
        assert_eq!(app.quiz.selected(0), None);
    }
}

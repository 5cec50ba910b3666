use std::collections::{HashMap, HashSet};

use crate::study::StudyData;

/// What the learner has done with the quiz currently on screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizProgress {
    selected: HashMap<usize, usize>,
    revealed: HashSet<usize>,
    /// Question under the cursor
    pub focus: usize,
}

impl QuizProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick an option. Ignored once the answer for that question is shown.
    pub fn select(&mut self, question: usize, option: usize) -> bool {
        if self.revealed.contains(&question) {
            return false;
        }
        self.selected.insert(question, option);
        true
    }

    pub fn selected(&self, question: usize) -> Option<usize> {
        self.selected.get(&question).copied()
    }

    pub fn toggle_reveal(&mut self, question: usize) -> bool {
        if !self.revealed.remove(&question) {
            self.revealed.insert(question);
        }
        self.is_revealed(question)
    }

    pub fn is_revealed(&self, question: usize) -> bool {
        self.revealed.contains(&question)
    }

    /// (correct, revealed) over the revealed questions of `data`
    pub fn score(&self, data: &StudyData) -> (usize, usize) {
        let quiz = data.quiz();
        let revealed: Vec<usize> = self
            .revealed
            .iter()
            .copied()
            .filter(|q| *q < quiz.len())
            .collect();
        let correct = revealed
            .iter()
            .filter(|q| {
                self.selected(**q)
                    .map(|opt| quiz[**q].is_correct(opt))
                    .unwrap_or(false)
            })
            .count();
        (correct, revealed.len())
    }

    /// Number of focusable questions in `data`; math mode has a single one.
    pub fn question_count(data: &StudyData) -> usize {
        match data {
            StudyData::Default { quiz, .. } => quiz.len(),
            StudyData::Math { .. } => 1,
        }
    }

    pub fn focus_next(&mut self, data: &StudyData) {
        let count = Self::question_count(data);
        if count > 0 && self.focus + 1 < count {
            self.focus += 1;
        }
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.saturating_sub(1);
    }
}

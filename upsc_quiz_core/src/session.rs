//! Turn-by-turn state of one quiz attempt

use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{AnswerLetter, Question};
use crate::results::{ResultStore, SavedResult};

/// What the user picked for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAnswer {
    pub chosen: AnswerLetter,
    pub correct: AnswerLetter,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Ephemeral; only its summary is persisted, through [`QuizAttempt::save`].
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    topic: String,
    difficulty: String,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    answers: BTreeMap<usize, RecordedAnswer>,
    finished: bool,
}

impl QuizAttempt {
    pub fn new(topic: impl Into<String>, difficulty: impl Into<String>, questions: Vec<Question>) -> Self {
        let finished = questions.is_empty();
        Self {
            topic: topic.into(),
            difficulty: difficulty.into(),
            questions,
            current: 0,
            score: 0,
            answers: BTreeMap::new(),
            finished,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// `None` once the attempt is over.
    pub fn current(&self) -> Option<&Question> {
        if self.finished {
            return None;
        }
        self.questions.get(self.current)
    }

    /// Record an answer to the current question and move on. Does nothing
    /// after the attempt has finished.
    pub fn answer(&mut self, chosen: AnswerLetter) -> Option<RecordedAnswer> {
        let question = self.current()?;

        let recorded = RecordedAnswer {
            chosen,
            correct: question.correct_answer,
            is_correct: question.is_correct(chosen),
            explanation: question.explanation.clone(),
        };

        if recorded.is_correct {
            self.score += 1;
        }
        self.answers.insert(self.current, recorded.clone());

        self.current += 1;
        if self.current >= self.questions.len() {
            self.finished = true;
        }

        Some(recorded)
    }

    /// End the attempt early; unanswered questions count as wrong.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    pub fn answers(&self) -> &BTreeMap<usize, RecordedAnswer> {
        &self.answers
    }

    pub fn save(&self, store: &ResultStore, user_id: &str) -> Result<SavedResult> {
        store.save_result(user_id, &self.topic, &self.difficulty, self.score, self.total())
    }
}

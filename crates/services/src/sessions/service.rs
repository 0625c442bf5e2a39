use std::fmt;

use academy_core::model::{Lesson, ProgressKey, Question};
use academy_core::rules::quiz_reward;

use super::progress::QuizProgress;
use crate::error::QuizError;

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizPhase {
    #[default]
    Idle,
    InProgress,
    Finished,
}

/// Final result of a finished quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub lesson: ProgressKey,
    pub score: usize,
    pub total: usize,
}

impl QuizOutcome {
    /// Unfloored XP earned: `30 * score / total`.
    #[must_use]
    pub fn reward(&self) -> f64 {
        quiz_reward(self.score, self.total)
    }
}

/// What `advance` moved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep {
    /// The session moved on to the question at `index`.
    Next { index: usize },
    Finished(QuizOutcome),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Ephemeral quiz over one lesson's questions.
///
/// Steps through the questions in order: `answer` scores the current question
/// (once), `advance` moves the cursor and finishes the quiz after the last
/// question. Nothing here is persisted; rewards are paid by
/// `QuizLoopService`.
#[derive(Default)]
pub struct QuizSession {
    lesson: Option<ProgressKey>,
    questions: Vec<Question>,
    current: usize,
    score: usize,
    answered: bool,
    phase: QuizPhase,
}

impl QuizSession {
    /// A session with no quiz running.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a quiz over `lesson`, discarding any previous quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuizAvailable` if the lesson has no questions;
    /// the session is left untouched in that case.
    pub fn start(&mut self, key: ProgressKey, lesson: &Lesson) -> Result<(), QuizError> {
        if !lesson.has_quiz() {
            return Err(QuizError::NoQuizAvailable);
        }

        *self = Self {
            lesson: Some(key),
            questions: lesson.quiz().to_vec(),
            current: 0,
            score: 0,
            answered: false,
            phase: QuizPhase::InProgress,
        };
        Ok(())
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn lesson(&self) -> Option<&ProgressKey> {
        self.lesson.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    /// Total number of questions in this quiz.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Whether the current question has already been answered.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answered
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == QuizPhase::InProgress {
            self.questions.get(self.current)
        } else {
            None
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            phase: self.phase,
            index: self.current,
            total: self.total(),
            score: self.score,
        }
    }

    /// Answer the current question with the option at `option`.
    ///
    /// Returns whether the answer was correct. Does not advance.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` outside a running quiz,
    /// `QuizError::InvalidOption` for an index past the options and
    /// `QuizError::AlreadyAnswered` on a second answer to the same question.
    pub fn answer(&mut self, option: usize) -> Result<bool, QuizError> {
        let Some(question) = self.current_question() else {
            return Err(QuizError::NotInProgress);
        };
        if option >= question.options().len() {
            return Err(QuizError::InvalidOption {
                option,
                options: question.options().len(),
            });
        }
        if self.answered {
            return Err(QuizError::AlreadyAnswered);
        }

        let correct = question.is_correct(option);
        if correct {
            self.score += 1;
        }
        self.answered = true;
        Ok(correct)
    }

    /// Move to the next question, finishing the quiz after the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` outside a running quiz.
    pub fn advance(&mut self) -> Result<QuizStep, QuizError> {
        if self.phase != QuizPhase::InProgress {
            return Err(QuizError::NotInProgress);
        }

        self.current += 1;
        self.answered = false;
        if self.current < self.questions.len() {
            return Ok(QuizStep::Next {
                index: self.current,
            });
        }

        self.phase = QuizPhase::Finished;
        let lesson = self.lesson.clone().ok_or(QuizError::NotInProgress)?;
        Ok(QuizStep::Finished(QuizOutcome {
            lesson,
            score: self.score,
            total: self.questions.len(),
        }))
    }

    /// Abandon the quiz without a reward.
    pub fn end(&mut self) {
        *self = Self::new();
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("lesson", &self.lesson)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

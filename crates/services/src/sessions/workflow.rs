use std::sync::Arc;

use academy_core::model::{LessonId, ModuleId, ProgressKey, XpAward};

use super::service::{QuizOutcome, QuizSession, QuizStep};
use crate::error::QuizError;
use crate::events::{ProgressEvent, emit};
use crate::progress_service::ProgressService;

/// A finished quiz and the XP it paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizFinish {
    pub outcome: QuizOutcome,
    pub award: XpAward,
}

/// Orchestrates quiz start and pays the reward when a quiz finishes.
#[derive(Clone)]
pub struct QuizLoopService {
    progress: Arc<ProgressService>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(progress: Arc<ProgressService>) -> Self {
        Self { progress }
    }

    /// Start the quiz of the given lesson in `session`, replacing any quiz
    /// already running there.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownLesson` if the lesson is not in the
    /// curriculum and `QuizError::NoQuizAvailable` if it has no questions.
    pub fn start_quiz(
        &self,
        session: &mut QuizSession,
        module: &ModuleId,
        lesson: &LessonId,
    ) -> Result<(), QuizError> {
        let found = self
            .progress
            .curriculum()
            .lesson(module, lesson)
            .ok_or_else(|| QuizError::UnknownLesson {
                module: module.clone(),
                lesson: lesson.clone(),
            })?;
        session.start(ProgressKey::new(module.clone(), lesson.clone()), found)?;
        tracing::debug!(%module, %lesson, questions = session.total(), "quiz started");
        Ok(())
    }

    /// Advance the session; when the quiz finishes, award `30 * score / total` XP.
    ///
    /// Returns `None` while questions remain.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the session is not running or the reward cannot
    /// be persisted.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<Option<QuizFinish>, QuizError> {
        let QuizStep::Finished(outcome) = session.advance()? else {
            return Ok(None);
        };

        let award = self.progress.award_xp(outcome.reward()).await?;
        tracing::debug!(
            lesson = %outcome.lesson,
            score = outcome.score,
            total = outcome.total,
            "quiz finished"
        );
        emit(
            self.progress.sink(),
            ProgressEvent::QuizFinished {
                lesson: outcome.lesson.clone(),
                score: outcome.score,
                total: outcome.total,
                reward: award.gained,
            },
        );
        Ok(Some(QuizFinish { outcome, award }))
    }
}

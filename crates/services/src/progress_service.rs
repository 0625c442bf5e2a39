use std::sync::Arc;

use academy_core::model::{
    Curriculum, ModuleId, ProgressKey, ProgressState, QuestId, XpAward,
};
use academy_core::rules::LESSON_COMPLETION_XP;
use storage::repository::StateStore;

use crate::error::ProgressError;
use crate::events::{
    COMPLETION_PARTICLES, EventSink, LEVEL_UP_PARTICLES, ProgressEvent, SoundCue, emit,
};

/// Result of marking one lesson complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub lesson: ProgressKey,
    /// `false` when the lesson was already complete. XP is paid either way.
    pub first_time: bool,
    pub award: XpAward,
    pub unlocked: Option<QuestId>,
}

/// Result of a quest attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestAttempt {
    /// A lesson was completed on behalf of the quest.
    ///
    /// `reward` is `None` when the quest was unknown or already done.
    Completed {
        completion: CompletionOutcome,
        reward: Option<XpAward>,
    },
    /// Every lesson in the curriculum is already complete.
    NothingToDo,
}

/// Completion counts of one module, for list views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOverview {
    pub id: ModuleId,
    pub title: String,
    pub completed: usize,
    pub total: usize,
}

/// The progress and gamification engine.
///
/// Every operation reads the state through the store, applies one rule and
/// writes the whole record back before returning. Nested operations
/// (a completion awarding XP, a quest attempt completing a lesson) each do
/// their own read-modify-write.
#[derive(Clone)]
pub struct ProgressService {
    store: StateStore,
    curriculum: Arc<Curriculum>,
    sink: Arc<dyn EventSink>,
}

impl ProgressService {
    #[must_use]
    pub fn new(store: StateStore, curriculum: Arc<Curriculum>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            curriculum,
            sink,
        }
    }

    #[must_use]
    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub(crate) fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    /// Current state, for redraws.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the store cannot be read.
    pub async fn snapshot(&self) -> Result<ProgressState, ProgressError> {
        Ok(self.store.load().await?)
    }

    /// Per-module completion counts in curriculum order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the store cannot be read.
    pub async fn overview(&self) -> Result<Vec<ModuleOverview>, ProgressError> {
        let state = self.store.load().await?;
        Ok(self
            .curriculum
            .modules()
            .iter()
            .map(|module| {
                let (completed, total) = state.module_completion(module);
                ModuleOverview {
                    id: module.id().clone(),
                    title: module.title().to_string(),
                    completed,
                    total,
                }
            })
            .collect())
    }

    /// Add `floor(amount)` XP; celebrate if the level went up.
    ///
    /// Negative and non-finite amounts award nothing but still persist.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` on storage failures.
    pub async fn award_xp(&self, amount: f64) -> Result<XpAward, ProgressError> {
        let mut state = self.store.load().await?;
        let award = state.award_xp(amount);
        self.store.save(&state).await?;
        self.announce_award(award);
        Ok(award)
    }

    async fn add_xp(&self, points: u64) -> Result<XpAward, ProgressError> {
        let mut state = self.store.load().await?;
        let award = state.add_xp(points);
        self.store.save(&state).await?;
        self.announce_award(award);
        Ok(award)
    }

    fn announce_award(&self, award: XpAward) {
        tracing::debug!(gained = award.gained, total = award.total, "xp awarded");
        emit(
            self.sink.as_ref(),
            ProgressEvent::XpAwarded {
                gained: award.gained,
                total: award.total,
            },
        );
        if award.leveled_up() {
            tracing::info!(level = award.level, "level up");
            emit(self.sink.as_ref(), ProgressEvent::LevelUp { level: award.level });
            emit(
                self.sink.as_ref(),
                ProgressEvent::Celebrate {
                    particles: LEVEL_UP_PARTICLES,
                },
            );
            emit(self.sink.as_ref(), ProgressEvent::Cue(SoundCue::LevelUp));
        }
    }

    /// Mark a lesson complete, pay the completion XP and re-check quests.
    ///
    /// Repeated calls for the same lesson leave the progress map unchanged but
    /// pay the completion XP again. Unknown ids create a new entry.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnstorableLesson` for a key that would not
    /// read back as itself (blank ids, a module id containing `:`), and
    /// `ProgressError` on storage failures.
    pub async fn mark_complete(&self, lesson: ProgressKey) -> Result<CompletionOutcome, ProgressError> {
        if !lesson.is_persistable() {
            return Err(ProgressError::UnstorableLesson(lesson));
        }
        let mut state = self.store.load().await?;
        let first_time = state.mark_complete(lesson.clone());
        self.store.save(&state).await?;
        tracing::debug!(%lesson, first_time, "lesson marked complete");

        let award = self.add_xp(LESSON_COMPLETION_XP).await?;
        let unlocked = self.evaluate_quests().await?;

        emit(
            self.sink.as_ref(),
            ProgressEvent::LessonCompleted {
                lesson: lesson.clone(),
            },
        );
        emit(
            self.sink.as_ref(),
            ProgressEvent::Celebrate {
                particles: COMPLETION_PARTICLES,
            },
        );
        emit(self.sink.as_ref(), ProgressEvent::Cue(SoundCue::LessonComplete));

        Ok(CompletionOutcome {
            lesson,
            first_time,
            award,
            unlocked,
        })
    }

    /// Unlock quests whose conditions now hold; returns the new quest, if any.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` on storage failures.
    pub async fn evaluate_quests(&self) -> Result<Option<QuestId>, ProgressError> {
        let mut state = self.store.load().await?;
        let Some(id) = state.unlock_quests() else {
            return Ok(None);
        };
        self.store.save(&state).await?;

        let title = state
            .quest(&id)
            .map(|quest| quest.title().to_string())
            .unwrap_or_default();
        tracing::info!(quest = %id, "quest unlocked");
        emit(
            self.sink.as_ref(),
            ProgressEvent::QuestUnlocked {
                quest: id.clone(),
                title,
            },
        );
        Ok(Some(id))
    }

    /// Progress a quest by completing the first unfinished lesson.
    ///
    /// Completes that lesson (with its own XP), then marks the quest done and
    /// pays the quest reward on top. Does nothing when every lesson is done.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` on storage failures.
    pub async fn attempt_quest(&self, quest: &QuestId) -> Result<QuestAttempt, ProgressError> {
        let state = self.store.load().await?;
        let Some(target) = state.first_incomplete(&self.curriculum) else {
            tracing::debug!(%quest, "no incomplete lessons for quest");
            return Ok(QuestAttempt::NothingToDo);
        };

        let completion = self.mark_complete(target).await?;

        let mut state = self.store.load().await?;
        let Some(xp) = state.complete_quest(quest) else {
            tracing::debug!(%quest, "quest unknown or already done, no reward");
            return Ok(QuestAttempt::Completed {
                completion,
                reward: None,
            });
        };
        // Done flag and reward land in the same write.
        let award = state.add_xp(xp);
        self.store.save(&state).await?;

        tracing::info!(%quest, xp, "quest completed");
        emit(
            self.sink.as_ref(),
            ProgressEvent::QuestCompleted {
                quest: quest.clone(),
                reward: xp,
            },
        );
        emit(self.sink.as_ref(), ProgressEvent::Cue(SoundCue::QuestComplete));
        self.announce_award(award);

        Ok(QuestAttempt::Completed {
            completion,
            reward: Some(award),
        })
    }
}

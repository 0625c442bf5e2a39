//! Notifications and cosmetic signals published by the engine.
//!
//! The presentation layer installs an [`EventSink`] to show toasts, spawn
//! celebrations and play sounds. Sinks are fire-and-forget: a failing sink is
//! logged and otherwise ignored, it never fails an engine operation.

use std::sync::Mutex;

use academy_core::model::{ProgressKey, QuestId};
use thiserror::Error;

/// Particle count of the celebration fired on a level-up.
pub const LEVEL_UP_PARTICLES: u32 = 160;

/// Particle count of the celebration fired on a lesson completion.
pub const COMPLETION_PARTICLES: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    LevelUp,
    LessonComplete,
    QuestComplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    XpAwarded { gained: u64, total: u64 },
    LevelUp { level: u32 },
    LessonCompleted { lesson: ProgressKey },
    QuestUnlocked { quest: QuestId, title: String },
    QuestCompleted { quest: QuestId, reward: u64 },
    QuizFinished {
        lesson: ProgressKey,
        score: usize,
        total: usize,
        reward: u64,
    },
    Celebrate { particles: u32 },
    Cue(SoundCue),
}

/// A cosmetic side effect could not be played (e.g. audio is unavailable).
#[derive(Debug, Error)]
#[error("effect failed: {0}")]
pub struct EffectError(pub String);

pub trait EventSink: Send + Sync {
    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Returns `EffectError` when the effect cannot be played. Callers swallow it.
    fn publish(&self, event: &ProgressEvent) -> Result<(), EffectError>;
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn publish(&self, _event: &ProgressEvent) -> Result<(), EffectError> {
        Ok(())
    }
}

/// Sink that keeps every event, for tests and replay.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &ProgressEvent) -> Result<(), EffectError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|err| EffectError(err.to_string()))?;
        guard.push(event.clone());
        Ok(())
    }
}

pub(crate) fn emit(sink: &dyn EventSink, event: ProgressEvent) {
    if let Err(err) = sink.publish(&event) {
        tracing::debug!(?event, error = %err, "event sink failed, ignoring");
    }
}

#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod events;
pub mod progress_service;
pub mod sessions;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProgressError, QuizError};
pub use events::{EffectError, EventSink, NoopSink, ProgressEvent, RecordingSink, SoundCue};
pub use progress_service::{CompletionOutcome, ModuleOverview, ProgressService, QuestAttempt};
pub use sessions::{
    QuizFinish, QuizLoopService, QuizOutcome, QuizPhase, QuizProgress, QuizSession, QuizStep,
};

//! Shared error types for the services crate.

use thiserror::Error;

use academy_core::model::{LessonId, ModuleId, ProgressKey};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("lesson key {0} cannot be stored: ids must be non-empty and the module id must not contain ':'")]
    UnstorableLesson(ProgressKey),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no quiz available for this lesson")]
    NoQuizAvailable,
    #[error("unknown lesson {module}:{lesson}")]
    UnknownLesson { module: ModuleId, lesson: LessonId },
    #[error("quiz is not in progress")]
    NotInProgress,
    #[error("question already answered")]
    AlreadyAnswered,
    #[error("option {option} is out of range ({options} options)")]
    InvalidOption { option: usize, options: usize },
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

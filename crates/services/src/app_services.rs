use std::sync::Arc;

use academy_core::model::Curriculum;
use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::events::EventSink;
use crate::progress_service::ProgressService;
use crate::sessions::QuizLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    quiz_loop: Arc<QuizLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        curriculum: Arc<Curriculum>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, curriculum, sink))
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        curriculum: Arc<Curriculum>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let progress = Arc::new(ProgressService::new(
            storage.state_store(),
            curriculum,
            sink,
        ));
        let quiz_loop = Arc::new(QuizLoopService::new(Arc::clone(&progress)));
        Self {
            progress,
            quiz_loop,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }
}

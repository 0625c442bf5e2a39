mod curriculum;
mod ids;
mod quest;
mod state;

pub use curriculum::{CodeSample, Curriculum, CurriculumError, Lab, Lesson, Module, Question, Reading};
pub use ids::{LessonId, ModuleId, PROGRESS_KEY_SEPARATOR, ParseIdError, ProgressKey, QuestId};
pub use quest::{FIRST_LESSON_QUEST, FIVE_LESSONS_QUEST, Quest};
pub use state::{ProgressState, XpAward};

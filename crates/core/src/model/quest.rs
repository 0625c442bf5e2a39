use serde::{Deserialize, Serialize};

use crate::model::ids::QuestId;

/// Id of the starter quest every fresh state carries.
pub const FIRST_LESSON_QUEST: &str = "q-one";

/// Id of the quest unlocked after five completed lessons.
pub const FIVE_LESSONS_QUEST: &str = "q-five";

/// An optional objective with a one-time XP reward.
///
/// `done` only ever flips from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    id: QuestId,
    title: String,
    xp: u64,
    #[serde(default)]
    done: bool,
}

impl Quest {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, xp: u64) -> Self {
        Self {
            id: QuestId::new(id),
            title: title.into(),
            xp,
            done: false,
        }
    }

    /// The "complete 1 lesson" quest seeded into a default state.
    #[must_use]
    pub fn first_lesson() -> Self {
        Self::new(FIRST_LESSON_QUEST, "Complete 1 lesson", 50)
    }

    /// The quest appended once five lessons are complete.
    #[must_use]
    pub fn five_lessons() -> Self {
        Self::new(FIVE_LESSONS_QUEST, "Complete 5 lessons", 120)
    }

    #[must_use]
    pub fn id(&self) -> &QuestId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Reward paid when the quest is completed.
    #[must_use]
    pub fn xp(&self) -> u64 {
        self.xp
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Flip `done` to `true`. Returns `false` if it already was.
    pub(crate) fn complete(&mut self) -> bool {
        if self.done {
            return false;
        }
        self.done = true;
        true
    }
}

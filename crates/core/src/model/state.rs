use std::collections::BTreeMap;

use crate::model::curriculum::{Curriculum, Module};
use crate::model::ids::{ProgressKey, QuestId};
use crate::model::quest::{FIVE_LESSONS_QUEST, Quest};
use crate::rules::{FIVE_LESSONS_THRESHOLD, level_for_xp, whole_xp};

/// Outcome of a single XP award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
    pub gained: u64,
    pub total: u64,
    pub previous_level: u32,
    pub level: u32,
}

impl XpAward {
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}

/// Gamification state of one learner.
///
/// `level` is cached but never set directly: every mutation that touches
/// `xp` recomputes it, so `level == xp / 200 + 1` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    xp: u64,
    level: u32,
    progress: BTreeMap<ProgressKey, bool>,
    quests: Vec<Quest>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            progress: BTreeMap::new(),
            quests: vec![Quest::first_lesson()],
        }
    }
}

impl ProgressState {
    /// Rebuild a state from persisted parts. The level is derived from `xp`.
    #[must_use]
    pub fn from_parts(xp: u64, progress: BTreeMap<ProgressKey, bool>, quests: Vec<Quest>) -> Self {
        Self {
            xp,
            level: level_for_xp(xp),
            progress,
            quests,
        }
    }

    #[must_use]
    pub fn xp(&self) -> u64 {
        self.xp
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn progress(&self) -> &BTreeMap<ProgressKey, bool> {
        &self.progress
    }

    #[must_use]
    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    #[must_use]
    pub fn quest(&self, id: &QuestId) -> Option<&Quest> {
        self.quests.iter().find(|quest| quest.id() == id)
    }

    #[must_use]
    pub fn is_complete(&self, key: &ProgressKey) -> bool {
        self.progress.get(key).copied().unwrap_or(false)
    }

    /// Number of progress entries set to `true`.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.progress.values().filter(|done| **done).count()
    }

    /// XP still missing before the next level.
    #[must_use]
    pub fn xp_to_next_level(&self) -> u64 {
        let next = u64::from(self.level).saturating_mul(crate::rules::XP_PER_LEVEL);
        next.saturating_sub(self.xp)
    }

    /// Add `floor(amount)` XP and recompute the level.
    pub fn award_xp(&mut self, amount: f64) -> XpAward {
        self.add_xp(whole_xp(amount))
    }

    /// Add whole XP points and recompute the level.
    pub fn add_xp(&mut self, gained: u64) -> XpAward {
        let previous_level = self.level;
        self.xp = self.xp.saturating_add(gained);
        self.level = level_for_xp(self.xp);
        XpAward {
            gained,
            total: self.xp,
            previous_level,
            level: self.level,
        }
    }

    /// Set the entry for `key` to `true`.
    ///
    /// Returns whether the lesson was incomplete before the call.
    pub fn mark_complete(&mut self, key: ProgressKey) -> bool {
        let previous = self.progress.insert(key, true);
        previous != Some(true)
    }

    /// Apply the quest unlock rules; returns the id of a newly added quest.
    ///
    /// The only rule: five completed lessons append `q-five`, once.
    pub fn unlock_quests(&mut self) -> Option<QuestId> {
        if self.completed_count() < FIVE_LESSONS_THRESHOLD {
            return None;
        }
        let id = QuestId::new(FIVE_LESSONS_QUEST);
        if self.quest(&id).is_some() {
            return None;
        }
        self.quests.push(Quest::five_lessons());
        Some(id)
    }

    /// Mark the quest done and return its reward.
    ///
    /// Returns `None` if the quest is unknown or was already done.
    pub fn complete_quest(&mut self, id: &QuestId) -> Option<u64> {
        let quest = self.quests.iter_mut().find(|quest| quest.id() == id)?;
        quest.complete().then(|| quest.xp())
    }

    /// First lesson of the curriculum, in module then lesson order, that is
    /// not complete yet.
    #[must_use]
    pub fn first_incomplete(&self, curriculum: &Curriculum) -> Option<ProgressKey> {
        curriculum.lesson_keys().find(|key| !self.is_complete(key))
    }

    /// Completed and total lesson counts for one module.
    #[must_use]
    pub fn module_completion(&self, module: &Module) -> (usize, usize) {
        let completed = module
            .lessons()
            .iter()
            .filter(|lesson| {
                self.is_complete(&ProgressKey::new(module.id().clone(), lesson.id().clone()))
            })
            .count();
        (completed, module.lessons().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::curriculum::Lesson;
    use crate::model::ids::{LessonId, ModuleId};

    fn key(module: &str, lesson: &str) -> ProgressKey {
        ProgressKey::new(ModuleId::new(module), LessonId::new(lesson))
    }

    fn state_with_completed(count: usize) -> ProgressState {
        let mut state = ProgressState::default();
        for i in 0..count {
            state.mark_complete(key("m", &format!("l{i}")));
        }
        state
    }

    #[test]
    fn default_state_has_starter_quest() {
        let state = ProgressState::default();
        assert_eq!(state.xp(), 0);
        assert_eq!(state.level(), 1);
        assert!(state.progress().is_empty());
        assert_eq!(state.quests(), [Quest::first_lesson()]);
    }

    #[test]
    fn level_tracks_xp_across_awards() {
        let mut state = ProgressState::default();
        let mut last_level = state.level();
        for amount in [0.0, 50.0, 149.9, 0.5, 200.0, 17.0, 1_000.0] {
            let award = state.award_xp(amount);
            assert!(state.level() >= last_level);
            assert_eq!(u64::from(state.level()), state.xp() / 200 + 1);
            assert_eq!(award.total, state.xp());
            last_level = state.level();
        }
        assert_eq!(state.xp(), 50 + 149 + 200 + 17 + 1_000);
    }

    #[test]
    fn award_reports_level_up() {
        let mut state = ProgressState::from_parts(190, BTreeMap::new(), vec![]);
        let award = state.award_xp(10.0);
        assert!(award.leveled_up());
        assert_eq!(award.previous_level, 1);
        assert_eq!(award.level, 2);

        let award = state.award_xp(10.0);
        assert!(!award.leveled_up());
    }

    #[test]
    fn from_parts_recomputes_level() {
        let state = ProgressState::from_parts(450, BTreeMap::new(), vec![]);
        assert_eq!(state.level(), 3);
        assert_eq!(state.xp_to_next_level(), 150);
    }

    #[test]
    fn mark_complete_reports_first_completion_only() {
        let mut state = ProgressState::default();
        assert!(state.mark_complete(key("web", "sqli")));
        assert!(!state.mark_complete(key("web", "sqli")));
        assert_eq!(state.completed_count(), 1);
        assert!(state.is_complete(&key("web", "sqli")));
    }

    #[test]
    fn four_completions_do_not_unlock_five_lesson_quest() {
        let mut state = state_with_completed(4);
        assert_eq!(state.unlock_quests(), None);
        assert_eq!(state.quests().len(), 1);
    }

    #[test]
    fn five_completions_unlock_quest_exactly_once() {
        let mut state = state_with_completed(5);
        assert_eq!(state.unlock_quests(), Some(QuestId::new(FIVE_LESSONS_QUEST)));
        assert_eq!(state.unlock_quests(), None);

        let ids: Vec<&str> = state.quests().iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, ["q-one", "q-five"]);
        assert_eq!(state.quests()[1], Quest::five_lessons());
    }

    #[test]
    fn false_entries_do_not_count_toward_unlock() {
        let mut progress = BTreeMap::new();
        for i in 0..4 {
            progress.insert(key("m", &format!("l{i}")), true);
        }
        progress.insert(key("m", "stale"), false);
        let mut state = ProgressState::from_parts(0, progress, vec![]);
        assert_eq!(state.unlock_quests(), None);
    }

    #[test]
    fn complete_quest_pays_once() {
        let mut state = ProgressState::default();
        let id = QuestId::new("q-one");
        assert_eq!(state.complete_quest(&id), Some(50));
        assert_eq!(state.complete_quest(&id), None);
        assert_eq!(state.complete_quest(&QuestId::new("missing")), None);
        assert!(state.quest(&id).unwrap().is_done());
    }

    #[test]
    fn first_incomplete_walks_curriculum_order() {
        let curriculum = Curriculum::new(vec![
            Module::new("a", "A", "", vec![Lesson::new("a1", "A1"), Lesson::new("a2", "A2")]),
            Module::new("b", "B", "", vec![Lesson::new("b1", "B1")]),
        ])
        .unwrap();

        let mut state = ProgressState::default();
        state.mark_complete(key("a", "a1"));
        assert_eq!(state.first_incomplete(&curriculum), Some(key("a", "a2")));

        state.mark_complete(key("a", "a2"));
        state.mark_complete(key("b", "b1"));
        assert_eq!(state.first_incomplete(&curriculum), None);
        assert_eq!(state.module_completion(&curriculum.modules()[0]), (2, 2));
    }
}

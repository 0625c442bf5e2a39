use std::io::{self, Write};

use academy_core::model::{Lesson, Module, ProgressKey, ProgressState, Question};
use services::{EffectError, EventSink, ModuleOverview, ProgressEvent, QuizProgress, SoundCue};

/// Event sink that prints notifications to stdout and rings the terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    pub sound: bool,
}

impl EventSink for ConsoleSink {
    fn publish(&self, event: &ProgressEvent) -> Result<(), EffectError> {
        let mut out = io::stdout().lock();
        let result = match event {
            ProgressEvent::XpAwarded { .. } => Ok(()),
            ProgressEvent::LevelUp { level } => writeln!(out, "LEVEL UP! You are now level {level}."),
            ProgressEvent::LessonCompleted { lesson } => writeln!(out, "Lesson {lesson} complete."),
            ProgressEvent::QuestUnlocked { title, .. } => writeln!(out, "New quest unlocked: {title}"),
            ProgressEvent::QuestCompleted { quest, reward } => {
                writeln!(out, "Quest {quest} complete (+{reward} XP).")
            }
            ProgressEvent::QuizFinished {
                score,
                total,
                reward,
                ..
            } => writeln!(out, "Quiz finished: {score}/{total} (+{reward} XP)."),
            ProgressEvent::Celebrate { particles } => {
                writeln!(out, "{}", celebration(*particles))
            }
            ProgressEvent::Cue(cue) if self.sound => play_cue(*cue),
            ProgressEvent::Cue(_) => Ok(()),
        };
        result.map_err(|err| EffectError(err.to_string()))
    }
}

fn play_cue(cue: SoundCue) -> io::Result<()> {
    let rings = match cue {
        SoundCue::LessonComplete => 1,
        SoundCue::QuestComplete => 2,
        SoundCue::LevelUp => 3,
    };
    let mut err = io::stderr().lock();
    for _ in 0..rings {
        err.write_all(b"\x07")?;
    }
    err.flush()
}

/// One sparkle per twenty particles, at least one.
fn celebration(particles: u32) -> String {
    let sparks = usize::try_from((particles / 20).max(1)).unwrap_or(1);
    "* ".repeat(sparks).trim_end().to_string()
}

pub fn render_modules(out: &mut impl Write, overview: &[ModuleOverview]) -> io::Result<()> {
    for module in overview {
        writeln!(
            out,
            "{:<22} {:<40} {}/{}",
            module.id, module.title, module.completed, module.total
        )?;
    }
    Ok(())
}

pub fn render_lessons(out: &mut impl Write, module: &Module, state: &ProgressState) -> io::Result<()> {
    writeln!(out, "{}", module.title())?;
    if !module.description().is_empty() {
        writeln!(out, "{}", module.description())?;
    }
    if module.lessons().is_empty() {
        writeln!(out, "  (no lessons yet)")?;
    }
    for lesson in module.lessons() {
        let key = ProgressKey::new(module.id().clone(), lesson.id().clone());
        let mark = if state.is_complete(&key) { "x" } else { " " };
        let quiz = if lesson.has_quiz() { "  [quiz]" } else { "" };
        writeln!(out, "  [{mark}] {:<14} {}{quiz}", lesson.id(), lesson.title())?;
    }
    if !module.tools().is_empty() {
        writeln!(out, "Tools: {}", module.tools().join(", "))?;
    }
    Ok(())
}

pub fn render_lesson(out: &mut impl Write, lesson: &Lesson) -> io::Result<()> {
    writeln!(out, "{}", lesson.title())?;

    if !lesson.objectives().is_empty() {
        writeln!(out, "\nObjectives")?;
        for objective in lesson.objectives() {
            writeln!(out, "  - {objective}")?;
        }
    }

    if let Some(theory) = lesson.theory() {
        writeln!(out, "\nTheory")?;
        for line in theory.lines() {
            writeln!(out, "  {}", line.trim())?;
        }
    }

    for sample in lesson.code_samples() {
        writeln!(out, "\nCode ({})", sample.language)?;
        for line in sample.code.lines() {
            writeln!(out, "  {line}")?;
        }
    }

    for lab in lesson.labs() {
        writeln!(out, "\n{}", lab.title)?;
        for (n, step) in lab.steps.iter().enumerate() {
            writeln!(out, "  {}. {step}", n + 1)?;
        }
        if let Some(expected) = &lab.expected {
            writeln!(out, "  Expected: {expected}")?;
        }
    }

    if !lesson.reading().is_empty() {
        writeln!(out, "\nReading Material")?;
        for reading in lesson.reading() {
            writeln!(out, "  - {}: {}", reading.file, reading.link())?;
        }
    }

    if lesson.has_quiz() {
        writeln!(out, "\nQuiz: {} question(s)", lesson.quiz().len())?;
    }
    Ok(())
}

pub fn render_status(out: &mut impl Write, state: &ProgressState) -> io::Result<()> {
    writeln!(
        out,
        "Level {}  |  {} XP  |  {} XP to next level",
        state.level(),
        state.xp(),
        state.xp_to_next_level()
    )?;
    writeln!(out, "Lessons completed: {}", state.completed_count())?;
    writeln!(out, "Quests:")?;
    for quest in state.quests() {
        let mark = if quest.is_done() { "x" } else { " " };
        writeln!(
            out,
            "  [{mark}] {:<10} {} (+{} XP)",
            quest.id(),
            quest.title(),
            quest.xp()
        )?;
    }
    Ok(())
}

pub fn render_question(
    out: &mut impl Write,
    progress: QuizProgress,
    question: &Question,
) -> io::Result<()> {
    writeln!(
        out,
        "\nQuestion {}/{} (score {}): {}",
        progress.index + 1,
        progress.total,
        progress.score,
        question.prompt()
    )?;
    for (n, option) in question.options().iter().enumerate() {
        writeln!(out, "  {}) {option}", n + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::model::{Lab, LessonId, ModuleId, Reading};
    use services::QuizPhase;

    fn rendered(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn lesson_shows_deep_linked_reading() {
        let lesson = Lesson::new("cs-arch", "CPU, Registers & Memory Layout")
            .with_theory("\n   Registers hold state.\n   The stack grows down.\n")
            .with_labs(vec![Lab {
                title: "Lab: Inspect stack".into(),
                steps: vec!["Run gdb".into()],
                expected: Some("Find the offset".into()),
            }])
            .with_reading(vec![Reading {
                file: "Erickson".into(),
                path: "./erickson.pdf".into(),
                pages: None,
                start_page: Some(115),
            }]);

        let text = rendered(|out| render_lesson(out, &lesson));
        assert!(text.contains("  Registers hold state.\n  The stack grows down.\n"));
        assert!(text.contains("  1. Run gdb"));
        assert!(text.contains("Erickson: ./erickson.pdf#page=115"));
        assert!(!text.contains("Quiz:"));
    }

    #[test]
    fn lessons_mark_completed_entries() {
        let module = Module::new(
            "web",
            "4. Web Application Security",
            "OWASP",
            vec![Lesson::new("sqli", "SQLi"), Lesson::new("xss", "XSS")],
        );
        let mut state = ProgressState::default();
        state.mark_complete(ProgressKey::new(ModuleId::new("web"), LessonId::new("xss")));

        let text = rendered(|out| render_lessons(out, &module, &state));
        assert!(text.contains("[ ] sqli"));
        assert!(text.contains("[x] xss"));
    }

    #[test]
    fn status_lists_quests() {
        let mut state = ProgressState::default();
        state.award_xp(230.0);
        let text = rendered(|out| render_status(out, &state));
        assert!(text.starts_with("Level 2  |  230 XP  |  170 XP to next level"));
        assert!(text.contains("[ ] q-one"));
    }

    #[test]
    fn celebration_scales_with_particles() {
        assert_eq!(celebration(40), "* *");
        assert_eq!(celebration(5), "*");
    }

    #[test]
    fn question_shows_position_and_score() {
        let question = Question::new(
            "Which port does HTTPS use?",
            vec!["80".into(), "443".into()],
            1,
        );
        let progress = QuizProgress {
            phase: QuizPhase::InProgress,
            index: 2,
            total: 4,
            score: 1,
        };
        let text = rendered(|out| render_question(out, progress, &question));
        assert!(text.contains("Question 3/4 (score 1): Which port does HTTPS use?"));
        assert!(text.contains("  2) 443"));
    }
}

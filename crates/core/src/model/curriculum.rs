use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, ModuleId, PROGRESS_KEY_SEPARATOR, ProgressKey};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CurriculumError {
    #[error("curriculum is not valid JSON: {0}")]
    Parse(String),

    #[error("module id must not be empty")]
    EmptyModuleId,

    #[error("duplicate module id: {0}")]
    DuplicateModule(ModuleId),

    #[error("lesson id in module {module} must not be empty")]
    EmptyLessonId { module: ModuleId },

    #[error("duplicate lesson id {lesson} in module {module}")]
    DuplicateLesson { module: ModuleId, lesson: LessonId },

    #[error("id {0:?} must not contain ':'")]
    ReservedSeparator(String),

    #[error("question {index} of {module}:{lesson} has no options")]
    NoOptions {
        module: ModuleId,
        lesson: LessonId,
        index: usize,
    },

    #[error("question {index} of {module}:{lesson} answers option {answer} of {options}")]
    AnswerOutOfRange {
        module: ModuleId,
        lesson: LessonId,
        index: usize,
        answer: usize,
        options: usize,
    },
}

//
// ─── QUIZ QUESTIONS ────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "q")]
    prompt: String,
    options: Vec<String>,
    #[serde(rename = "a")]
    answer: usize,
}

impl Question {
    #[must_use]
    pub fn new(prompt: impl Into<String>, options: Vec<String>, answer: usize) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            answer,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Index of the correct option.
    #[must_use]
    pub fn answer(&self) -> usize {
        self.answer
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.answer
    }
}

//
// ─── LESSON CONTENT ────────────────────────────────────────────────────────────
//

/// Hands-on exercise attached to a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lab {
    pub title: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected: Option<String>,
}

/// Reference into a book, optionally deep-linked to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub file: String,
    pub path: String,
    #[serde(default)]
    pub pages: Option<String>,
    #[serde(default)]
    pub start_page: Option<u32>,
}

impl Reading {
    /// Path to open, with a `#page=N` fragment when a start page is known.
    #[must_use]
    pub fn link(&self) -> String {
        match self.start_page {
            Some(page) => format!("{}#page={page}", self.path),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSample {
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    id: LessonId,
    title: String,
    #[serde(default)]
    objectives: Vec<String>,
    #[serde(default)]
    theory: Option<String>,
    #[serde(default)]
    code_samples: Vec<CodeSample>,
    #[serde(default)]
    labs: Vec<Lab>,
    #[serde(default)]
    reading: Vec<Reading>,
    #[serde(default)]
    quiz: Vec<Question>,
}

impl Lesson {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: LessonId::new(id),
            title: title.into(),
            objectives: Vec::new(),
            theory: None,
            code_samples: Vec::new(),
            labs: Vec::new(),
            reading: Vec::new(),
            quiz: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_theory(mut self, theory: impl Into<String>) -> Self {
        self.theory = Some(theory.into());
        self
    }

    #[must_use]
    pub fn with_labs(mut self, labs: Vec<Lab>) -> Self {
        self.labs = labs;
        self
    }

    #[must_use]
    pub fn with_reading(mut self, reading: Vec<Reading>) -> Self {
        self.reading = reading;
        self
    }

    #[must_use]
    pub fn with_quiz(mut self, quiz: Vec<Question>) -> Self {
        self.quiz = quiz;
        self
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn objectives(&self) -> &[String] {
        &self.objectives
    }

    /// Theory text without surrounding whitespace; `None` when blank.
    #[must_use]
    pub fn theory(&self) -> Option<&str> {
        self.theory.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn code_samples(&self) -> &[CodeSample] {
        &self.code_samples
    }

    #[must_use]
    pub fn labs(&self) -> &[Lab] {
        &self.labs
    }

    #[must_use]
    pub fn reading(&self) -> &[Reading] {
        &self.reading
    }

    #[must_use]
    pub fn quiz(&self) -> &[Question] {
        &self.quiz
    }

    #[must_use]
    pub fn has_quiz(&self) -> bool {
        !self.quiz.is_empty()
    }
}

//
// ─── MODULES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    id: ModuleId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    lessons: Vec<Lesson>,
    #[serde(default)]
    tools: Vec<String>,
}

impl Module {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        lessons: Vec<Lesson>,
    ) -> Self {
        Self {
            id: ModuleId::new(id),
            title: title.into(),
            description: description.into(),
            lessons,
            tools: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    #[must_use]
    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.id() == id)
    }
}

//
// ─── CURRICULUM ────────────────────────────────────────────────────────────────
//

/// Validated, ordered list of modules.
///
/// Module order and lesson order are significant: quest attempts walk them
/// front to back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Curriculum {
    modules: Vec<Module>,
}

impl Curriculum {
    /// Validate modules into a curriculum.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError` on empty or duplicate ids, ids containing the
    /// progress-key separator, or quiz questions whose answer index does not
    /// point at one of their options.
    pub fn new(modules: Vec<Module>) -> Result<Self, CurriculumError> {
        let mut module_ids = HashSet::new();
        for module in &modules {
            validate_id(module.id.as_str()).map_err(|err| match err {
                IdProblem::Empty => CurriculumError::EmptyModuleId,
                IdProblem::Separator => {
                    CurriculumError::ReservedSeparator(module.id.as_str().to_string())
                }
            })?;
            if !module_ids.insert(module.id.clone()) {
                return Err(CurriculumError::DuplicateModule(module.id.clone()));
            }

            let mut lesson_ids = HashSet::new();
            for lesson in &module.lessons {
                validate_id(lesson.id.as_str()).map_err(|err| match err {
                    IdProblem::Empty => CurriculumError::EmptyLessonId {
                        module: module.id.clone(),
                    },
                    IdProblem::Separator => {
                        CurriculumError::ReservedSeparator(lesson.id.as_str().to_string())
                    }
                })?;
                if !lesson_ids.insert(lesson.id.clone()) {
                    return Err(CurriculumError::DuplicateLesson {
                        module: module.id.clone(),
                        lesson: lesson.id.clone(),
                    });
                }
                validate_quiz(module, lesson)?;
            }
        }

        Ok(Self { modules })
    }

    /// Parse and validate a curriculum from its JSON form (an array of modules).
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError::Parse` for malformed JSON and any validation
    /// error from [`Curriculum::new`].
    pub fn from_json(json: &str) -> Result<Self, CurriculumError> {
        let modules: Vec<Module> =
            serde_json::from_str(json).map_err(|err| CurriculumError::Parse(err.to_string()))?;
        Self::new(modules)
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|module| module.id() == id)
    }

    #[must_use]
    pub fn lesson(&self, module: &ModuleId, lesson: &LessonId) -> Option<&Lesson> {
        self.module(module).and_then(|m| m.lesson(lesson))
    }

    /// Every lesson key in module order, then lesson order within the module.
    pub fn lesson_keys(&self) -> impl Iterator<Item = ProgressKey> + '_ {
        self.modules.iter().flat_map(|module| {
            module
                .lessons
                .iter()
                .map(|lesson| ProgressKey::new(module.id.clone(), lesson.id.clone()))
        })
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }
}

enum IdProblem {
    Empty,
    Separator,
}

fn validate_id(id: &str) -> Result<(), IdProblem> {
    if id.trim().is_empty() {
        return Err(IdProblem::Empty);
    }
    if id.contains(PROGRESS_KEY_SEPARATOR) {
        return Err(IdProblem::Separator);
    }
    Ok(())
}

fn validate_quiz(module: &Module, lesson: &Lesson) -> Result<(), CurriculumError> {
    for (index, question) in lesson.quiz.iter().enumerate() {
        if question.options.is_empty() {
            return Err(CurriculumError::NoOptions {
                module: module.id.clone(),
                lesson: lesson.id.clone(),
                index,
            });
        }
        if question.answer >= question.options.len() {
            return Err(CurriculumError::AnswerOutOfRange {
                module: module.id.clone(),
                lesson: lesson.id.clone(),
                index,
                answer: question.answer,
                options: question.options.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: usize) -> Question {
        Question::new(
            "Which mitigation makes executing code in writable pages fail?",
            vec!["ASLR".into(), "DEP/NX".into(), "Canaries".into()],
            answer,
        )
    }

    #[test]
    fn parses_source_shaped_json() {
        let json = r#"[
            {
                "id": "foundations",
                "title": "1. Computer Science Foundations",
                "description": "Fundamentals",
                "lessons": [
                    {
                        "id": "cs-os",
                        "title": "Operating Systems Internals",
                        "theory": "\n   Syscalls.\n  ",
                        "codeSamples": [{ "language": "C", "code": "int main(){}" }],
                        "labs": [{ "title": "Lab", "steps": ["one"], "expected": "done" }],
                        "reading": [{ "file": "Shellcoder", "path": "./sc.pdf", "startPage": 42 }],
                        "quiz": [{ "q": "Pick", "options": ["a", "b"], "a": 1 }]
                    }
                ],
                "tools": ["gdb"]
            },
            { "id": "soft", "title": "15. Soft Skills", "description": "", "lessons": [] }
        ]"#;

        let curriculum = Curriculum::from_json(json).unwrap();
        assert_eq!(curriculum.modules().len(), 2);
        assert_eq!(curriculum.lesson_count(), 1);

        let lesson = curriculum
            .lesson(&ModuleId::new("foundations"), &LessonId::new("cs-os"))
            .unwrap();
        assert_eq!(lesson.theory(), Some("Syscalls."));
        assert_eq!(lesson.reading()[0].link(), "./sc.pdf#page=42");
        assert!(lesson.quiz()[0].is_correct(1));
        assert_eq!(curriculum.modules()[0].tools(), ["gdb".to_string()]);
    }

    #[test]
    fn reading_link_without_page_is_plain_path() {
        let reading = Reading {
            file: "Weidman".into(),
            path: "./weidman.pdf".into(),
            pages: None,
            start_page: None,
        };
        assert_eq!(reading.link(), "./weidman.pdf");
    }

    #[test]
    fn lesson_keys_follow_module_then_lesson_order() {
        let curriculum = Curriculum::new(vec![
            Module::new(
                "a",
                "A",
                "",
                vec![Lesson::new("a1", "A1"), Lesson::new("a2", "A2")],
            ),
            Module::new("b", "B", "", vec![Lesson::new("b1", "B1")]),
        ])
        .unwrap();

        let keys: Vec<String> = curriculum.lesson_keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["a:a1", "a:a2", "b:b1"]);
    }

    #[test]
    fn rejects_duplicate_module() {
        let err = Curriculum::new(vec![
            Module::new("web", "Web", "", vec![]),
            Module::new("web", "Web again", "", vec![]),
        ])
        .unwrap_err();
        assert_eq!(err, CurriculumError::DuplicateModule(ModuleId::new("web")));
    }

    #[test]
    fn rejects_duplicate_lesson_within_module() {
        let err = Curriculum::new(vec![Module::new(
            "web",
            "Web",
            "",
            vec![Lesson::new("xss", "XSS"), Lesson::new("xss", "XSS 2")],
        )])
        .unwrap_err();
        assert!(matches!(err, CurriculumError::DuplicateLesson { .. }));
    }

    #[test]
    fn same_lesson_id_in_different_modules_is_allowed() {
        let result = Curriculum::new(vec![
            Module::new("a", "A", "", vec![Lesson::new("intro", "Intro")]),
            Module::new("b", "B", "", vec![Lesson::new("intro", "Intro")]),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_ids_with_separator_or_blank() {
        let err = Curriculum::new(vec![Module::new("a:b", "A", "", vec![])]).unwrap_err();
        assert_eq!(err, CurriculumError::ReservedSeparator("a:b".into()));

        let err = Curriculum::new(vec![Module::new("  ", "A", "", vec![])]).unwrap_err();
        assert_eq!(err, CurriculumError::EmptyModuleId);

        let err =
            Curriculum::new(vec![Module::new("a", "A", "", vec![Lesson::new("", "L")])]).unwrap_err();
        assert!(matches!(err, CurriculumError::EmptyLessonId { .. }));
    }

    #[test]
    fn rejects_answer_outside_options() {
        let lesson = Lesson::new("cs-os", "OS").with_quiz(vec![question(1), question(3)]);
        let err =
            Curriculum::new(vec![Module::new("foundations", "F", "", vec![lesson])]).unwrap_err();
        assert!(matches!(
            err,
            CurriculumError::AnswerOutOfRange {
                index: 1,
                answer: 3,
                options: 3,
                ..
            }
        ));
    }

    #[test]
    fn rejects_question_without_options() {
        let lesson = Lesson::new("cs-os", "OS").with_quiz(vec![Question::new("?", vec![], 0)]);
        let err =
            Curriculum::new(vec![Module::new("foundations", "F", "", vec![lesson])]).unwrap_err();
        assert!(matches!(err, CurriculumError::NoOptions { index: 0, .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Curriculum::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CurriculumError::Parse(_)));
    }
}

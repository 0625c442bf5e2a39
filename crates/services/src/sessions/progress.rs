use super::service::QuizPhase;

/// Position and score of a running quiz, as shown next to each question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub phase: QuizPhase,
    /// Zero-based index of the current question.
    pub index: usize,
    pub total: usize,
    pub score: usize,
}

mod progress;
mod service;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use progress::QuizProgress;
pub use service::{QuizOutcome, QuizPhase, QuizSession, QuizStep};
pub use workflow::{QuizFinish, QuizLoopService};

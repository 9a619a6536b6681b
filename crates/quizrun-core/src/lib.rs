//! quizrun-core: Timed quiz sessions.
//!
//! This crate defines the quiz data model, the countdown timer, the answer
//! store, the scoring pass, and the `QuizRunner` state machine that ties them
//! together. Catalog backends and the CLI build on top of it.

pub mod answers;
pub mod error;
pub mod model;
pub mod parser;
pub mod record;
pub mod runner;
pub mod scoring;
pub mod timer;
pub mod traits;

pub use answers::{AnswerSnapshot, AnswerStore};
pub use error::{CatalogError, DefinitionProblem, QuizError};
pub use model::{Question, QuestionKind, QuizDefinition, ScoreResult, TakerContext};
pub use runner::{CompletionTrigger, QuizRunner, RunnerUpdate, Session, SessionState};
pub use scoring::{grade, score, QuestionOutcome};
pub use timer::{ManualTimer, SessionId, SessionTimer, TimerEvent, TimerEventKind, TokioTimer};

//! Error types for quiz sessions and catalog access.
//!
//! `CatalogError` lives here rather than in `quizrun-catalog` so callers can
//! match on the cause of a `DataUnavailable` without string matching.

use std::fmt;

use thiserror::Error;

use crate::runner::SessionState;

/// Ways the quiz data service can fail to deliver.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The service could not be reached at all.
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The service answered with an error status.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The service answered, but the payload could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A local store (file sink, quiz directory) could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Why a quiz definition was rejected before a session could start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionProblem {
    NoQuestions,
    EmptyOptions { question: usize },
    NegativeTimeLimit(i64),
    TimeLimitTooLong(i64),
}

impl fmt::Display for DefinitionProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionProblem::NoQuestions => write!(f, "quiz has no questions"),
            DefinitionProblem::EmptyOptions { question } => write!(
                f,
                "multiple-choice question {} has no options",
                question + 1
            ),
            DefinitionProblem::NegativeTimeLimit(secs) => {
                write!(f, "time limit must not be negative (got {secs}s)")
            }
            DefinitionProblem::TimeLimitTooLong(secs) => {
                write!(f, "time limit of {secs}s exceeds {}s", u32::MAX)
            }
        }
    }
}

/// Errors surfaced by the quiz core.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Quiz data could not be fetched; the caller decides whether to re-fetch.
    #[error("quiz data unavailable: {0}")]
    DataUnavailable(#[from] CatalogError),

    /// The definition violates an invariant a session depends on.
    #[error("invalid quiz definition '{quiz_id}': {problem}")]
    InvalidQuizDefinition {
        quiz_id: String,
        problem: DefinitionProblem,
    },

    /// The operation does not apply in the runner's current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
}

impl QuizError {
    /// Returns `true` if re-fetching may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QuizError::DataUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_messages_use_one_based_question_numbers() {
        let err = QuizError::InvalidQuizDefinition {
            quiz_id: "q1".into(),
            problem: DefinitionProblem::EmptyOptions { question: 0 },
        };
        assert_eq!(
            err.to_string(),
            "invalid quiz definition 'q1': multiple-choice question 1 has no options"
        );
    }

    #[test]
    fn only_data_errors_are_recoverable() {
        let data = QuizError::from(CatalogError::Timeout(30));
        assert!(data.is_recoverable());
        assert!(data.to_string().contains("timed out after 30s"));

        let invalid = QuizError::InvalidQuizDefinition {
            quiz_id: "q".into(),
            problem: DefinitionProblem::NoQuestions,
        };
        assert!(!invalid.is_recoverable());
    }
}

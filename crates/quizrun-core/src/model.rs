//! Core data model types for quizrun.
//!
//! These are the decoded domain objects a session runs against: quiz
//! definitions, their questions, the taker's context, and the score of a
//! finished attempt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DefinitionProblem, QuizError};

/// A quiz as supplied by the data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDefinition {
    /// Opaque identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Display description.
    #[serde(default)]
    pub description: String,
    /// Total wall-clock budget for a session, in seconds.
    pub time_limit_secs: i64,
    /// Ordered questions; navigation and scoring both index by position.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Classes this quiz is offered to. Empty means every class.
    #[serde(default)]
    pub class_ids: Vec<String>,
}

impl QuizDefinition {
    pub fn total_count(&self) -> usize {
        self.questions.len()
    }

    /// Check the invariants a session depends on.
    ///
    /// A definition that fails here must never reach `InProgress`.
    pub fn validate(&self) -> Result<(), QuizError> {
        self.problem().map_or(Ok(()), |problem| Err(self.invalid(problem)))
    }

    /// The first invariant violation, if any.
    pub fn problem(&self) -> Option<DefinitionProblem> {
        if let Err(problem) = self.time_limit() {
            return Some(problem);
        }
        if self.questions.is_empty() {
            return Some(DefinitionProblem::NoQuestions);
        }
        self.questions
            .iter()
            .position(|q| q.kind == QuestionKind::MultipleChoice && q.options.is_empty())
            .map(|question| DefinitionProblem::EmptyOptions { question })
    }

    /// The time limit as a countdown length, if it fits one.
    pub fn time_limit(&self) -> Result<u32, DefinitionProblem> {
        u32::try_from(self.time_limit_secs).map_err(|_| {
            if self.time_limit_secs < 0 {
                DefinitionProblem::NegativeTimeLimit(self.time_limit_secs)
            } else {
                DefinitionProblem::TimeLimitTooLong(self.time_limit_secs)
            }
        })
    }

    /// Like `time_limit`, as the error `select_quiz` reports.
    pub fn checked_time_limit(&self) -> Result<u32, QuizError> {
        self.time_limit().map_err(|problem| self.invalid(problem))
    }

    fn invalid(&self, problem: DefinitionProblem) -> QuizError {
        QuizError::InvalidQuizDefinition {
            quiz_id: self.id.clone(),
            problem,
        }
    }

    /// Whether the taker's class may see this quiz.
    pub fn is_available_to(&self, ctx: &TakerContext) -> bool {
        self.class_ids.is_empty() || self.class_ids.iter().any(|c| c == &ctx.class_id)
    }
}

/// A single prompt within a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// The prompt shown to the taker.
    pub text: String,
    pub kind: QuestionKind,
    /// Choices, only meaningful for multiple-choice questions.
    #[serde(default)]
    pub options: Vec<String>,
    /// Compared against the taker's answer by exact string equality.
    pub correct_answer: String,
}

impl Question {
    pub fn multiple_choice(text: &str, options: &[&str], correct_answer: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: QuestionKind::MultipleChoice,
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct_answer.to_string(),
        }
    }

    pub fn free_text(text: &str, correct_answer: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: QuestionKind::FreeText,
            options: Vec::new(),
            correct_answer: correct_answer.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    FreeText,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple_choice"),
            QuestionKind::FreeText => write!(f, "free_text"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "multiple_choice" | "multiplechoice" | "mcq" => Ok(QuestionKind::MultipleChoice),
            "free_text" | "freetext" | "text" => Ok(QuestionKind::FreeText),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// Who is taking quizzes, passed explicitly to catalogs and runners.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TakerContext {
    pub taker_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub class_id: String,
}

impl TakerContext {
    pub fn new(taker_id: impl Into<String>, class_id: impl Into<String>) -> Self {
        Self {
            taker_id: taker_id.into(),
            display_name: None,
            class_id: class_id.into(),
        }
    }
}

/// Outcome of scoring one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub correct_count: u32,
    pub total_count: u32,
    /// `round(100 * correct / total)`, or 0 when there are no questions.
    pub percentage: u32,
}

impl ScoreResult {
    pub fn new(correct_count: u32, total_count: u32) -> Self {
        debug_assert!(correct_count <= total_count);
        let percentage = if total_count == 0 {
            0
        } else {
            // Half-up rounding without floats.
            (200 * correct_count + total_count) / (2 * total_count)
        };
        Self {
            correct_count,
            total_count,
            percentage,
        }
    }
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}%)",
            self.correct_count, self.total_count, self.percentage
        )
    }
}

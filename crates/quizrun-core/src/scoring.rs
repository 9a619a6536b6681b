//! The scoring pass.
//!
//! Comparison is exact string equality: no trimming, no case folding.
//! Unanswered questions count as incorrect.

use serde::{Deserialize, Serialize};

use crate::answers::AnswerSnapshot;
use crate::model::{QuizDefinition, ScoreResult};

/// How a single question fared in an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub index: usize,
    pub given: Option<String>,
    pub expected: String,
    pub correct: bool,
}

/// Grade every question of `quiz` against `answers`, in question order.
pub fn grade(quiz: &QuizDefinition, answers: &AnswerSnapshot) -> Vec<QuestionOutcome> {
    quiz.questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let given = answers.get(index);
            QuestionOutcome {
                index,
                given: given.map(str::to_string),
                expected: question.correct_answer.clone(),
                correct: given == Some(question.correct_answer.as_str()),
            }
        })
        .collect()
}

/// Score an attempt. Pure and deterministic.
pub fn score(quiz: &QuizDefinition, answers: &AnswerSnapshot) -> ScoreResult {
    let correct = quiz
        .questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(*i) == Some(q.correct_answer.as_str()))
        .count();
    ScoreResult::new(correct as u32, quiz.total_count() as u32)
}

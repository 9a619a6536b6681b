//! TOML quiz file parser.
//!
//! Loads quiz definitions from TOML files and directories, and checks them
//! for problems before they are offered to takers.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Question, QuestionKind, QuizDefinition};

/// Intermediate TOML structure for parsing quiz files.
#[derive(Debug, Deserialize)]
struct TomlQuizFile {
    quiz: TomlQuizHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuizHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_time_limit")]
    time_limit_secs: i64,
    #[serde(default)]
    class_ids: Vec<String>,
}

fn default_time_limit() -> i64 {
    600
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    text: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    correct_answer: String,
}

/// Parse a single TOML file into a `QuizDefinition`.
pub fn parse_quiz_file(path: &Path) -> Result<QuizDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;

    parse_quiz_str(&content, path)
}

/// Parse a TOML string into a `QuizDefinition`.
pub fn parse_quiz_str(content: &str, source_path: &Path) -> Result<QuizDefinition> {
    let parsed: TomlQuizFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            // Questions with options default to multiple choice.
            let kind = match q.kind {
                Some(k) => k.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?,
                None if q.options.is_empty() => QuestionKind::FreeText,
                None => QuestionKind::MultipleChoice,
            };
            Ok(Question {
                text: q.text,
                kind,
                options: q.options,
                correct_answer: q.correct_answer,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuizDefinition {
        id: parsed.quiz.id,
        title: parsed.quiz.title,
        description: parsed.quiz.description,
        time_limit_secs: parsed.quiz.time_limit_secs,
        questions,
        class_ids: parsed.quiz.class_ids,
    })
}

/// Recursively load all `.toml` quiz files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_quiz_directory(dir: &Path) -> Result<Vec<QuizDefinition>> {
    let mut quizzes = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            quizzes.extend(load_quiz_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_quiz_file(&path) {
                Ok(quiz) => quizzes.push(quiz),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(quizzes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The quiz cannot be started.
    Error,
    /// The quiz can run, but probably not as intended.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// An issue found while validating a quiz.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Zero-based question index, if the issue concerns one question.
    pub question: Option<usize>,
    pub message: String,
}

impl ValidationIssue {
    fn warning(question: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            question: Some(question),
            message: message.into(),
        }
    }
}

/// Validate a quiz for common issues.
///
/// Problems that would make `QuizRunner::select_quiz` reject the quiz are
/// reported as errors; everything else is a warning.
pub fn validate_quiz(quiz: &QuizDefinition) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if quiz.time_limit_secs < 0 {
        issues.push(ValidationIssue {
            severity: Severity::Error,
            question: None,
            message: format!("time_limit_secs is negative ({})", quiz.time_limit_secs),
        });
    } else if quiz.time_limit_secs > i64::from(u32::MAX) {
        issues.push(ValidationIssue {
            severity: Severity::Error,
            question: None,
            message: format!("time_limit_secs is too long ({})", quiz.time_limit_secs),
        });
    } else if quiz.time_limit_secs == 0 {
        issues.push(ValidationIssue {
            severity: Severity::Warning,
            question: None,
            message: "time_limit_secs is 0; sessions expire immediately".into(),
        });
    }

    if quiz.questions.is_empty() {
        issues.push(ValidationIssue {
            severity: Severity::Error,
            question: None,
            message: "quiz has no questions".into(),
        });
    }

    for (i, q) in quiz.questions.iter().enumerate() {
        if q.text.trim().is_empty() {
            issues.push(ValidationIssue::warning(i, "question text is empty"));
        }

        match q.kind {
            QuestionKind::MultipleChoice => {
                if q.options.is_empty() {
                    issues.push(ValidationIssue {
                        severity: Severity::Error,
                        question: Some(i),
                        message: "multiple-choice question has no options".into(),
                    });
                    continue;
                }
                if !q.options.contains(&q.correct_answer) {
                    issues.push(ValidationIssue::warning(
                        i,
                        format!(
                            "correct_answer {:?} is not one of the options",
                            q.correct_answer
                        ),
                    ));
                }
                let mut seen = HashSet::new();
                for option in &q.options {
                    if !seen.insert(option) {
                        issues.push(ValidationIssue::warning(
                            i,
                            format!("duplicate option {option:?}"),
                        ));
                    }
                }
            }
            QuestionKind::FreeText => {
                if !q.options.is_empty() {
                    issues.push(ValidationIssue::warning(
                        i,
                        "free-text question has options; they will not be shown",
                    ));
                }
            }
        }
    }

    issues
}

/// Warn about quiz ids used by more than one file.
pub fn duplicate_ids(quizzes: &[QuizDefinition]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for quiz in quizzes {
        if !seen.insert(quiz.id.as_str()) && !dupes.contains(&quiz.id) {
            dupes.push(quiz.id.clone());
        }
    }
    dupes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[quiz]
id = "fractions-1"
title = "Fractions"
description = "Halves and quarters"
time_limit_secs = 120
class_ids = ["5A", "5B"]

[[questions]]
text = "What is 1/2 + 1/4?"
kind = "multiple_choice"
options = ["3/4", "2/6", "1/8"]
correct_answer = "3/4"

[[questions]]
text = "Write one half as a decimal."
kind = "free_text"
correct_answer = "0.5"
"#;

    #[test]
    fn parse_valid_toml() {
        let quiz = parse_quiz_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(quiz.id, "fractions-1");
        assert_eq!(quiz.time_limit_secs, 120);
        assert_eq!(quiz.class_ids, vec!["5A", "5B"]);
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(quiz.questions[1].kind, QuestionKind::FreeText);
        assert!(validate_quiz(&quiz).is_empty());
    }

    #[test]
    fn kind_is_inferred_from_options() {
        let toml = r#"
[quiz]
id = "minimal"
title = "Minimal"

[[questions]]
text = "Pick one"
options = ["x", "y"]
correct_answer = "x"

[[questions]]
text = "Type it"
correct_answer = "z"
"#;
        let quiz = parse_quiz_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(quiz.time_limit_secs, 600);
        assert_eq!(quiz.questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(quiz.questions[1].kind, QuestionKind::FreeText);
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let toml = r#"
[quiz]
id = "bad"
title = "Bad"

[[questions]]
text = "?"
kind = "essay"
correct_answer = "z"
"#;
        let err = parse_quiz_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown question kind"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_quiz_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_errors_and_warnings() {
        let toml = r#"
[quiz]
id = "issues"
title = "Issues"
time_limit_secs = -1

[[questions]]
text = "Pick"
kind = "multiple_choice"
correct_answer = "a"

[[questions]]
text = "Pick again"
options = ["a", "a", "b"]
correct_answer = "c"
"#;
        let quiz = parse_quiz_str(toml, &PathBuf::from("issues.toml")).unwrap();
        let issues = validate_quiz(&quiz);

        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|i| i.message.contains("negative")));
        assert!(errors.iter().any(|i| i.question == Some(0)));

        assert!(issues
            .iter()
            .any(|i| i.message.contains("not one of the options")));
        assert!(issues.iter().any(|i| i.message.contains("duplicate option")));
    }

    #[test]
    fn validate_matches_runner_rejection() {
        let toml = r#"
[quiz]
id = "empty"
title = "Empty"
"#;
        let quiz = parse_quiz_str(toml, &PathBuf::from("empty.toml")).unwrap();
        assert!(quiz.validate().is_err());
        assert!(validate_quiz(&quiz)
            .iter()
            .any(|i| i.severity == Severity::Error));
    }

    #[test]
    fn validate_rejects_oversized_time_limit() {
        let toml = r#"
[quiz]
id = "marathon"
title = "Marathon"
time_limit_secs = 4294967306

[[questions]]
text = "Still there?"
correct_answer = "yes"
"#;
        let quiz = parse_quiz_str(toml, &PathBuf::from("marathon.toml")).unwrap();
        assert!(quiz.validate().is_err());
        assert!(validate_quiz(&quiz)
            .iter()
            .any(|i| i.severity == Severity::Error && i.message.contains("too long")));
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "nope = [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("term2");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            nested.join("copy.toml"),
            VALID_TOML.replace("fractions-1", "fractions-2"),
        )
        .unwrap();

        let quizzes = load_quiz_directory(dir.path()).unwrap();
        let ids: Vec<_> = quizzes.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["fractions-1", "fractions-2"]);
    }

    #[test]
    fn load_directory_requires_directory() {
        assert!(load_quiz_directory(Path::new("does-not-exist")).is_err());
    }

    #[test]
    fn duplicate_ids_are_reported_once() {
        let quiz = parse_quiz_str(VALID_TOML, &PathBuf::from("a.toml")).unwrap();
        let dupes = duplicate_ids(&[quiz.clone(), quiz.clone(), quiz]);
        assert_eq!(dupes, vec!["fractions-1"]);
    }
}

//! The `quizrun validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizrun_core::parser::{self, Severity};

pub fn execute(quiz_set_path: PathBuf) -> Result<()> {
    let quizzes = if quiz_set_path.is_dir() {
        parser::load_quiz_directory(&quiz_set_path)?
    } else {
        vec![parser::parse_quiz_file(&quiz_set_path)?]
    };

    let mut errors = 0;
    let mut warnings = 0;

    for quiz in &quizzes {
        println!(
            "Quiz: {} [{}] ({} questions, {}s)",
            quiz.title,
            quiz.id,
            quiz.total_count(),
            quiz.time_limit_secs
        );

        for issue in parser::validate_quiz(quiz) {
            let prefix = issue
                .question
                .map(|q| format!("  [Q{}]", q + 1))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} {}: {}", issue.severity, issue.message);
            match issue.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
            }
        }
    }

    for id in parser::duplicate_ids(&quizzes) {
        println!("  WARNING: quiz id '{id}' is used more than once");
        warnings += 1;
    }

    if errors > 0 {
        anyhow::bail!("{errors} error(s), {warnings} warning(s) found");
    }
    if warnings == 0 {
        println!("All quizzes valid.");
    } else {
        println!("\n{warnings} warning(s) found.");
    }

    Ok(())
}

//! The `quizrun review` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizrun_core::record::AttemptRecord;

pub fn execute(attempt_path: PathBuf) -> Result<()> {
    let attempt = AttemptRecord::load_json(&attempt_path)?;

    println!("{}", attempt.summary_line());
    println!(
        "Taken {} (class {})",
        attempt.completed_at.format("%Y-%m-%d %H:%M"),
        if attempt.class_id.is_empty() { "-" } else { attempt.class_id.as_str() }
    );

    let mut table = Table::new();
    table.set_header(vec!["#", "Your answer", "Expected", "Result"]);
    for outcome in &attempt.responses {
        let result = match (&outcome.given, outcome.correct) {
            (None, _) => "unanswered",
            (Some(_), true) => "correct",
            (Some(_), false) => "wrong",
        };
        table.add_row(vec![
            Cell::new(outcome.index + 1),
            Cell::new(outcome.given.as_deref().unwrap_or("-")),
            Cell::new(&outcome.expected),
            Cell::new(result),
        ]);
    }
    println!("\n{table}");

    Ok(())
}

//! The `quizrun init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("quizrun.toml").exists() {
        println!("quizrun.toml already exists, skipping.");
    } else {
        std::fs::write("quizrun.toml", SAMPLE_CONFIG)?;
        println!("Created quizrun.toml");
    }

    std::fs::create_dir_all("quizzes")?;
    let example_path = Path::new("quizzes/example.toml");
    if example_path.exists() {
        println!("quizzes/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUIZ)?;
        println!("Created quizzes/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizrun.toml with your taker id and class");
    println!("  2. Run: quizrun validate --quiz-set quizzes");
    println!("  3. Run: quizrun take --quiz example");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizrun configuration

default_catalog = "local"
output_dir = "./quizrun-results"
request_timeout_secs = 30

[taker]
id = "anonymous"
class_id = ""

[catalogs.local]
type = "directory"
path = "quizzes"

# [catalogs.school]
# type = "http"
# base_url = "https://school.example/api"
# api_token = "${QUIZRUN_API_TOKEN}"
"#;

const EXAMPLE_QUIZ: &str = r#"[quiz]
id = "example"
title = "Example Quiz"
description = "A short quiz to try quizrun"
time_limit_secs = 300

[[questions]]
text = "What is 7 x 6?"
options = ["36", "42", "48"]
correct_answer = "42"

[[questions]]
text = "Which planet is closest to the sun?"
options = ["Venus", "Mercury", "Mars"]
correct_answer = "Mercury"

[[questions]]
text = "Write the number 3 in words."
correct_answer = "three"
"#;

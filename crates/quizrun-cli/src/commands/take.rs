//! The `quizrun take` command.
//!
//! Runs one timed session in the terminal. Input lines and countdown events
//! are multiplexed on a single task, so the runner only ever sees one of
//! them at a time.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use quizrun_catalog::config::{create_catalog, create_sink, load_config_from, CatalogConfig};
use quizrun_catalog::sink::JsonFileSink;
use quizrun_core::model::{Question, QuestionKind};
use quizrun_core::runner::{QuizRunner, RunnerUpdate};
use quizrun_core::timer::TokioTimer;
use quizrun_core::traits::ScoreSink;

pub struct TakeArgs {
    pub quiz: String,
    pub class: Option<String>,
    pub catalog: Option<String>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub no_upload: bool,
}

/// One line of taker input, read against the question on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TakerCommand {
    Next,
    Previous,
    Submit,
    Quit,
    /// Zero-based question index.
    GoTo(usize),
    Answer(String),
    Show,
    Invalid(String),
}

impl TakerCommand {
    fn parse(line: &str, question: &Question) -> Self {
        let line = line.trim();
        if let Some(literal) = line.strip_prefix('=') {
            return TakerCommand::Answer(literal.trim().to_string());
        }

        match line {
            "" => return TakerCommand::Show,
            "next" | "n" => return TakerCommand::Next,
            "prev" | "p" => return TakerCommand::Previous,
            "submit" | "s" => return TakerCommand::Submit,
            "quit" | "q" => return TakerCommand::Quit,
            _ => {}
        }

        if let Some(target) = line.strip_prefix("goto ") {
            let target = target.trim();
            return match target.parse::<usize>() {
                Ok(k) if k >= 1 => TakerCommand::GoTo(k - 1),
                _ => TakerCommand::Invalid(format!("not a question number: {target}")),
            };
        }

        if question.kind == QuestionKind::MultipleChoice {
            let picked = line
                .parse::<usize>()
                .ok()
                .and_then(|k| k.checked_sub(1))
                .and_then(|i| question.options.get(i));
            if let Some(option) = picked {
                return TakerCommand::Answer(option.clone());
            }
        }

        TakerCommand::Answer(line.to_string())
    }
}

pub async fn execute(args: TakeArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let (catalog_name, catalog_config) = config.catalog(args.catalog.as_deref())?;
    let catalog = create_catalog(catalog_config, config.request_timeout())?;

    let mut ctx = config.taker.context();
    if let Some(class) = args.class {
        ctx.class_id = class;
    }

    let quiz = catalog
        .find_quiz(&ctx, &args.quiz)
        .await
        .with_context(|| format!("could not load quizzes from catalog '{catalog_name}'"))?
        .with_context(|| format!("quiz '{}' not found in catalog '{catalog_name}'", args.quiz))?;

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut runner = QuizRunner::new(ctx, Box::new(TokioTimer::new()), events_tx);

    let session = runner.select_quiz(quiz)?;
    println!("{}", session.quiz().title);
    if !session.quiz().description.is_empty() {
        println!("{}", session.quiz().description);
    }
    println!(
        "{} questions, {}s. Type an option number or an answer; \
         next, prev, goto <k>, submit, quit. Start with '=' to answer literally.",
        session.total_count(),
        session.remaining_secs()
    );
    show_question(&runner);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = events.recv() => match runner.handle_timer_event(event) {
                RunnerUpdate::Ticked(remaining) => {
                    if matches!(remaining, 60 | 30 | 10) || remaining <= 5 {
                        println!("  {remaining}s remaining");
                    }
                }
                RunnerUpdate::Completed(_) => {
                    println!("\nTime is up!");
                    break;
                }
                RunnerUpdate::Ignored => {}
            },
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    // End of input hands in whatever was answered.
                    runner.submit();
                    break;
                };
                let Some(question) = runner.current_question() else {
                    break;
                };
                match TakerCommand::parse(&line, question) {
                    TakerCommand::Next => {
                        if !runner.next() {
                            println!("Already at the last question.");
                        }
                    }
                    TakerCommand::Previous => {
                        if !runner.previous() {
                            println!("Already at the first question.");
                        }
                    }
                    TakerCommand::GoTo(index) => {
                        let total = runner.session().map_or(0, |s| s.total_count());
                        if index >= total {
                            println!("No question {}; this quiz has {total}.", index + 1);
                        } else {
                            runner.go_to(index);
                        }
                    }
                    TakerCommand::Answer(value) => {
                        runner.answer(value)?;
                        if !runner.next() {
                            println!("That was the last question. Type 'submit' when ready.");
                        }
                    }
                    TakerCommand::Submit => {
                        runner.submit();
                        break;
                    }
                    TakerCommand::Quit => {
                        runner.abandon()?;
                        println!("Quiz abandoned. Nothing was recorded.");
                        return Ok(());
                    }
                    TakerCommand::Invalid(message) => println!("{message}"),
                    TakerCommand::Show => {}
                }
                show_question(&runner);
            }
        }
    }

    let attempt = runner
        .attempt_record()
        .context("quiz ended without a result")?;
    println!("\nScore: {}", attempt.result);
    println!("{}", attempt.summary_line());

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    let local = JsonFileSink::new(output.clone());
    local
        .record(&attempt)
        .await
        .context("failed to save attempt")?;
    println!("Attempt saved to: {}", local.path_for(&attempt).display());

    if !args.no_upload && matches!(catalog_config, CatalogConfig::Http { .. }) {
        let sink = create_sink(catalog_config, &output, config.request_timeout())?;
        match sink.record(&attempt).await {
            Ok(()) => println!("Result sent to '{catalog_name}'."),
            Err(e) => {
                tracing::warn!(catalog = catalog_name, "upload failed: {e}");
                eprintln!("Could not send the result to '{catalog_name}': {e}");
                eprintln!("The attempt is saved locally.");
            }
        }
    }

    Ok(())
}

fn show_question(runner: &QuizRunner) {
    let Some(session) = runner.session() else {
        return;
    };
    let index = session.current_index();
    let question = session.current_question();

    println!(
        "\nQuestion {}/{} ({}s left)",
        index + 1,
        session.total_count(),
        session.remaining_secs()
    );
    println!("{}", question.text);
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
    if let Some(answer) = session.answers().get(index) {
        println!("Current answer: {answer}");
    }
}

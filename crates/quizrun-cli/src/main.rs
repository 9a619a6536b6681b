//! quizrun CLI: take timed quizzes from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "quizrun", version, about = "Timed quiz runner for the classroom")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List quizzes available to the taker
    List {
        /// Class to list quizzes for (overrides the configured class)
        #[arg(long)]
        class: Option<String>,

        /// Catalog name from the config file
        #[arg(long)]
        catalog: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Take a quiz
    Take {
        /// Quiz id
        #[arg(long)]
        quiz: String,

        /// Class to take the quiz as (overrides the configured class)
        #[arg(long)]
        class: Option<String>,

        /// Catalog name from the config file
        #[arg(long)]
        catalog: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory attempt records are written to
        #[arg(long)]
        output: Option<PathBuf>,

        /// Keep the result local instead of sending it to the data service
        #[arg(long)]
        no_upload: bool,
    },

    /// Validate quiz TOML files
    Validate {
        /// Path to a quiz file or directory
        #[arg(long)]
        quiz_set: PathBuf,
    },

    /// Show a saved attempt question by question
    Review {
        /// Attempt JSON written by `quizrun take`
        #[arg(long)]
        attempt: PathBuf,
    },

    /// Create starter config and example quiz
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quizrun=warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List {
            class,
            catalog,
            config,
        } => commands::list::execute(class, catalog, config).await,
        Commands::Take {
            quiz,
            class,
            catalog,
            config,
            output,
            no_upload,
        } => {
            commands::take::execute(commands::take::TakeArgs {
                quiz,
                class,
                catalog,
                config,
                output,
                no_upload,
            })
            .await
        }
        Commands::Validate { quiz_set } => commands::validate::execute(quiz_set),
        Commands::Review { attempt } => commands::review::execute(attempt),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

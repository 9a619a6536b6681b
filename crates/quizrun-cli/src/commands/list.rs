//! The `quizrun list` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizrun_catalog::config::{create_catalog, load_config_from};

pub async fn execute(
    class: Option<String>,
    catalog_name: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let (name, catalog_config) = config.catalog(catalog_name.as_deref())?;
    let catalog = create_catalog(catalog_config, config.request_timeout())?;

    let mut ctx = config.taker.context();
    if let Some(class) = class {
        ctx.class_id = class;
    }

    let quizzes = catalog
        .list_quizzes(&ctx)
        .await
        .with_context(|| format!("could not load quizzes from catalog '{name}'"))?;

    if quizzes.is_empty() {
        println!("No quizzes available in catalog '{name}'.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Questions", "Time limit", "Classes"]);
    for quiz in &quizzes {
        let classes = if quiz.class_ids.is_empty() {
            "all".to_string()
        } else {
            quiz.class_ids.join(", ")
        };
        table.add_row(vec![
            Cell::new(&quiz.id),
            Cell::new(&quiz.title),
            Cell::new(quiz.total_count()),
            Cell::new(format!("{}s", quiz.time_limit_secs)),
            Cell::new(classes),
        ]);
    }
    println!("{table}");

    Ok(())
}

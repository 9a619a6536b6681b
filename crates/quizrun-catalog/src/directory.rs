//! Local directory of TOML quiz files.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::instrument;

use quizrun_core::error::{CatalogError, QuizError};
use quizrun_core::model::{QuizDefinition, TakerContext};
use quizrun_core::parser;
use quizrun_core::traits::QuizCatalog;

/// Serves every `*.toml` quiz under a directory tree.
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl QuizCatalog for DirectoryCatalog {
    fn name(&self) -> &str {
        "directory"
    }

    #[instrument(skip(self, ctx), fields(root = %self.root.display()))]
    async fn list_quizzes(&self, ctx: &TakerContext) -> Result<Vec<QuizDefinition>, QuizError> {
        let root = self.root.clone();
        let quizzes = tokio::task::spawn_blocking(move || parser::load_quiz_directory(&root))
            .await
            .map_err(|e| CatalogError::Storage(format!("quiz loader panicked: {e}")))?
            .map_err(|e| CatalogError::Storage(format!("{e:#}")))?;

        Ok(quizzes
            .into_iter()
            .filter(|q| q.is_available_to(ctx))
            .collect())
    }
}

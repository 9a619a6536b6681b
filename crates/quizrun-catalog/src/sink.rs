//! Score sink that keeps attempts as JSON files.

use std::path::PathBuf;

use async_trait::async_trait;

use quizrun_core::error::{CatalogError, QuizError};
use quizrun_core::record::AttemptRecord;
use quizrun_core::traits::ScoreSink;

/// Writes each attempt to `<dir>/attempt-<quiz>-<timestamp>.json`.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the given attempt is written to.
    pub fn path_for(&self, attempt: &AttemptRecord) -> PathBuf {
        self.dir.join(attempt.file_name())
    }
}

#[async_trait]
impl ScoreSink for JsonFileSink {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn record(&self, attempt: &AttemptRecord) -> Result<(), QuizError> {
        let path = self.path_for(attempt);
        let attempt = attempt.clone();
        tokio::task::spawn_blocking(move || attempt.save_json(&path))
            .await
            .map_err(|e| CatalogError::Storage(format!("attempt writer panicked: {e}")))?
            .map_err(|e| CatalogError::Storage(format!("{e:#}")))?;
        Ok(())
    }
}

//! Collaborator traits at the edge of the quiz core.
//!
//! Implemented by the `quizrun-catalog` crate: a catalog supplies quiz
//! definitions, a sink accepts finished attempts.

use async_trait::async_trait;

use crate::error::QuizError;
use crate::model::{QuizDefinition, TakerContext};
use crate::record::AttemptRecord;

/// Source of quiz definitions for a taker.
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// Quizzes available to `ctx`.
    ///
    /// Fails with `QuizError::DataUnavailable` if the backing service cannot
    /// deliver. No retry is attempted here.
    async fn list_quizzes(&self, ctx: &TakerContext) -> Result<Vec<QuizDefinition>, QuizError>;

    /// Look up one quiz by id among those available to `ctx`.
    async fn find_quiz(
        &self,
        ctx: &TakerContext,
        quiz_id: &str,
    ) -> Result<Option<QuizDefinition>, QuizError> {
        Ok(self
            .list_quizzes(ctx)
            .await?
            .into_iter()
            .find(|q| q.id == quiz_id))
    }
}

/// Destination for finished attempts.
#[async_trait]
pub trait ScoreSink: Send + Sync {
    fn name(&self) -> &str;

    async fn record(&self, attempt: &AttemptRecord) -> Result<(), QuizError>;
}

//! Mock catalog for testing.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use quizrun_core::error::{CatalogError, QuizError};
use quizrun_core::model::{QuizDefinition, TakerContext};
use quizrun_core::record::AttemptRecord;
use quizrun_core::traits::{QuizCatalog, ScoreSink};

/// In-memory catalog and sink for exercising callers without a data service.
///
/// Can be switched into a failing mode to simulate an unreachable service.
pub struct MockCatalog {
    quizzes: Vec<QuizDefinition>,
    failing: AtomicBool,
    call_count: AtomicU32,
    recorded: Mutex<Vec<AttemptRecord>>,
}

impl MockCatalog {
    pub fn new(quizzes: Vec<QuizDefinition>) -> Self {
        Self {
            quizzes,
            failing: AtomicBool::new(false),
            call_count: AtomicU32::new(0),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// A catalog whose every call fails with `DataUnavailable`.
    pub fn unavailable() -> Self {
        let mock = Self::new(Vec::new());
        mock.set_failing(true);
        mock
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Number of `list_quizzes` calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Attempts handed to this sink so far.
    pub fn recorded(&self) -> Vec<AttemptRecord> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check(&self) -> Result<(), QuizError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(CatalogError::Unreachable("mock catalog is offline".into()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl QuizCatalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_quizzes(&self, ctx: &TakerContext) -> Result<Vec<QuizDefinition>, QuizError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.check()?;
        Ok(self
            .quizzes
            .iter()
            .filter(|q| q.is_available_to(ctx))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ScoreSink for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn record(&self, attempt: &AttemptRecord) -> Result<(), QuizError> {
        self.check()?;
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(attempt.clone());
        Ok(())
    }
}

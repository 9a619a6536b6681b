//! Finished-attempt records with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ScoreResult, TakerContext};
use crate::runner::{CompletionTrigger, Session, SessionState};
use crate::scoring::{self, QuestionOutcome};

/// The read-only record of one completed attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Unique record identifier.
    pub id: Uuid,
    pub session_id: Uuid,
    pub quiz_id: String,
    pub quiz_title: String,
    pub taker_id: String,
    pub class_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub trigger: CompletionTrigger,
    pub time_limit_secs: i64,
    /// Seconds left on the clock when the attempt ended.
    pub remaining_secs: u32,
    pub result: ScoreResult,
    /// Per-question outcomes, in question order.
    pub responses: Vec<QuestionOutcome>,
}

impl AttemptRecord {
    /// Build a record from a completed session; `None` otherwise.
    pub fn from_session(session: &Session, taker: &TakerContext) -> Option<Self> {
        if session.state() != SessionState::Completed {
            return None;
        }
        let quiz = session.quiz();
        Some(Self {
            id: Uuid::new_v4(),
            session_id: session.id(),
            quiz_id: quiz.id.clone(),
            quiz_title: quiz.title.clone(),
            taker_id: taker.taker_id.clone(),
            class_id: taker.class_id.clone(),
            started_at: session.started_at(),
            completed_at: session.completed_at()?,
            trigger: session.completion()?,
            time_limit_secs: quiz.time_limit_secs,
            remaining_secs: session.remaining_secs(),
            result: session.result()?,
            responses: scoring::grade(quiz, &session.answers().snapshot()),
        })
    }

    /// Seconds spent on the attempt, by the session clock.
    pub fn elapsed_secs(&self) -> i64 {
        (self.time_limit_secs - i64::from(self.remaining_secs)).max(0)
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{}: {} by {} ({}, {}s used)",
            self.quiz_title,
            self.result,
            self.taker_id,
            self.trigger,
            self.elapsed_secs()
        )
    }

    /// Save the record as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize attempt")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write attempt to {}", path.display()))?;
        Ok(())
    }

    /// Load a record from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read attempt from {}", path.display()))?;
        let record: AttemptRecord =
            serde_json::from_str(&content).context("failed to parse attempt JSON")?;
        Ok(record)
    }

    /// File name used when writing this record into an output directory.
    pub fn file_name(&self) -> String {
        format!(
            "attempt-{}-{}.json",
            sanitize(&self.quiz_id),
            self.completed_at.format("%Y-%m-%dT%H%M%S")
        )
    }
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

//! REST data-service backend.
//!
//! `GET {base}/quizzes?classId=..` lists quizzes; `POST {base}/quiz-results`
//! accepts finished attempts. Payloads use the service's camelCase shape.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quizrun_core::error::{CatalogError, QuizError};
use quizrun_core::model::{Question, QuestionKind, QuizDefinition, TakerContext};
use quizrun_core::record::AttemptRecord;
use quizrun_core::runner::CompletionTrigger;
use quizrun_core::traits::{QuizCatalog, ScoreSink};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Quiz catalog and score sink backed by the school data service.
pub struct HttpCatalog {
    base_url: String,
    api_token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.is_empty()),
            timeout_secs: timeout.as_secs(),
            client,
        })
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, CatalogError> {
        reqwest::Url::parse(&format!("{}/{path}", self.base_url))
            .map_err(|e| CatalogError::Unreachable(format!("invalid base URL {}: {e}", self.base_url)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> CatalogError {
        if e.is_timeout() {
            CatalogError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            CatalogError::Unreachable(format!(
                "data service not reachable at {}",
                self.base_url
            ))
        } else {
            CatalogError::Unreachable(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<WireError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(CatalogError::ApiError { status, message });
        }
        Ok(response)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireQuizList {
    Bare(Vec<WireQuiz>),
    Wrapped { quizzes: Vec<WireQuiz> },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuiz {
    id: WireId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    time_limit_seconds: i64,
    #[serde(default)]
    questions: Vec<WireQuestion>,
    #[serde(default)]
    class_ids: Vec<WireId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    text: String,
    kind: WireKind,
    #[serde(default)]
    options: Option<Vec<String>>,
    correct_answer: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum WireKind {
    MultipleChoice,
    FreeText,
}

impl From<WireQuiz> for QuizDefinition {
    fn from(w: WireQuiz) -> Self {
        QuizDefinition {
            id: w.id.into(),
            title: w.title,
            description: w.description.unwrap_or_default(),
            time_limit_secs: w.time_limit_seconds,
            questions: w
                .questions
                .into_iter()
                .map(|q| Question {
                    text: q.text,
                    kind: match q.kind {
                        WireKind::MultipleChoice => QuestionKind::MultipleChoice,
                        WireKind::FreeText => QuestionKind::FreeText,
                    },
                    options: q.options.unwrap_or_default(),
                    correct_answer: q.correct_answer,
                })
                .collect(),
            class_ids: w.class_ids.into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireResult<'a> {
    quiz_id: &'a str,
    taker_id: &'a str,
    class_id: &'a str,
    correct_count: u32,
    total_count: u32,
    percentage: u32,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    auto_submitted: bool,
    answers: Vec<Option<&'a str>>,
}

#[derive(Deserialize)]
struct WireError {
    message: String,
}

#[async_trait]
impl QuizCatalog for HttpCatalog {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, ctx), fields(class_id = %ctx.class_id))]
    async fn list_quizzes(&self, ctx: &TakerContext) -> Result<Vec<QuizDefinition>, QuizError> {
        let mut url = self.url("quizzes")?;
        url.query_pairs_mut().append_pair("classId", &ctx.class_id);

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = Self::check_status(response).await?;

        let list: WireQuizList = response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(format!("failed to parse quiz list: {e}")))?;
        let wire = match list {
            WireQuizList::Bare(quizzes) | WireQuizList::Wrapped { quizzes } => quizzes,
        };

        let quizzes: Vec<QuizDefinition> = wire
            .into_iter()
            .map(QuizDefinition::from)
            .filter(|q| q.is_available_to(ctx))
            .collect();
        tracing::debug!(count = quizzes.len(), "fetched quiz list");
        Ok(quizzes)
    }
}

#[async_trait]
impl ScoreSink for HttpCatalog {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, attempt), fields(quiz_id = %attempt.quiz_id))]
    async fn record(&self, attempt: &AttemptRecord) -> Result<(), QuizError> {
        let body = WireResult {
            quiz_id: &attempt.quiz_id,
            taker_id: &attempt.taker_id,
            class_id: &attempt.class_id,
            correct_count: attempt.result.correct_count,
            total_count: attempt.result.total_count,
            percentage: attempt.result.percentage,
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
            auto_submitted: attempt.trigger == CompletionTrigger::Expired,
            answers: attempt.responses.iter().map(|r| r.given.as_deref()).collect(),
        };

        let response = self
            .authorize(self.client.post(self.url("quiz-results")?))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check_status(response).await?;
        tracing::info!(percentage = attempt.result.percentage, "score recorded");
        Ok(())
    }
}

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::history::HistoryEntry;
use crate::models::{Ack, Question, QuestionSet, SessionLog};

/// Interview API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Failed to read upload file: {0}")]
    Io(#[from] std::io::Error),
}

/// Operations the session core consumes from the interview backend
#[async_trait]
pub trait InterviewApi: Send + Sync {
    /// Random selection of 3 planning + 2 immediate questions
    async fn fetch_random_question_set(&self) -> Result<QuestionSet, ApiError>;

    /// Persist a completed session
    async fn submit_session_log(
        &self,
        duration_seconds: i64,
        details: &SessionLog,
    ) -> Result<Ack, ApiError>;

    /// Past sessions, newest first
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    /// Every question in the bank, all categories
    async fn fetch_questions(&self) -> Result<Vec<Question>, ApiError>;

    async fn create_question(
        &self,
        category: &str,
        title: &str,
        content: &str,
    ) -> Result<Ack, ApiError>;

    /// Import a spreadsheet of questions (column A = title, B = content)
    async fn bulk_import_questions(&self, category: &str, file: &Path) -> Result<Ack, ApiError>;
}

#[derive(Debug, Serialize)]
struct SubmitHistoryRequest<'a> {
    duration: i64,
    details: &'a SessionLog,
}

/// REST client for the interview backend
#[derive(Debug, Clone)]
pub struct HttpInterviewApi {
    base_url: String,
    client: Client,
}

impl HttpInterviewApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.client.request(method, &url)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            match status {
                StatusCode::NOT_FOUND => Err(ApiError::NotFound(body)),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(ApiError::BadRequest(body))
                }
                _ => Err(ApiError::Server(format!("{}: {}", status, body))),
            }
        }
    }
}

#[async_trait]
impl InterviewApi for HttpInterviewApi {
    async fn fetch_random_question_set(&self) -> Result<QuestionSet, ApiError> {
        let response = self
            .request(reqwest::Method::GET, "/api/simulation/random_set")
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn submit_session_log(
        &self,
        duration_seconds: i64,
        details: &SessionLog,
    ) -> Result<Ack, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/api/history")
            .json(&SubmitHistoryRequest {
                duration: duration_seconds,
                details,
            })
            .send()
            .await?;
        let ack = self.handle_response(response).await?;
        info!("Submitted session log ({}s)", duration_seconds);
        Ok(ack)
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let response = self
            .request(reqwest::Method::GET, "/api/history")
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn fetch_questions(&self) -> Result<Vec<Question>, ApiError> {
        let response = self
            .request(reqwest::Method::GET, "/api/questions")
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn create_question(
        &self,
        category: &str,
        title: &str,
        content: &str,
    ) -> Result<Ack, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/api/questions")
            .query(&[("category", category), ("title", title), ("content", content)])
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn bulk_import_questions(&self, category: &str, file: &Path) -> Result<Ack, ApiError> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "questions.xlsx".to_string());

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .request(reqwest::Method::POST, "/api/upload_excel")
            .query(&[("category", category)])
            .multipart(form)
            .send()
            .await?;
        let ack: Ack = self.handle_response(response).await?;
        info!(
            "Imported {} questions into {}",
            ack.count.unwrap_or(0),
            category
        );
        Ok(ack)
    }
}

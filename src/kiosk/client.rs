use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::models::{Meeting, Module, ProgressRequest, QuizResult};

#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn fetch_module(&self, module_id: i64) -> Result<Module, AppError>;
    async fn fetch_meeting(&self, meeting_id: i64) -> Result<Meeting, AppError>;
    async fn submit_progress(
        &self,
        student_id: &str,
        progress: &ProgressRequest,
    ) -> Result<QuizResult, AppError>;
}

pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(body));
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!("API error {}: {}", status, body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::Upstream(format!("Failed to parse API response: {}", e)))
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn fetch_module(&self, module_id: i64) -> Result<Module, AppError> {
        let url = format!("{}/api/modules/{}", self.base_url, module_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("GET {} failed: {}", url, e)))?;
        Self::parse(response).await
    }

    async fn fetch_meeting(&self, meeting_id: i64) -> Result<Meeting, AppError> {
        let url = format!("{}/api/meetings/{}", self.base_url, meeting_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("GET {} failed: {}", url, e)))?;
        Self::parse(response).await
    }

    async fn submit_progress(
        &self,
        student_id: &str,
        progress: &ProgressRequest,
    ) -> Result<QuizResult, AppError> {
        let url = format!("{}/api/students/{}/progress", self.base_url, student_id);
        let body = ProgressRequest {
            student_id: Some(student_id.to_string()),
            ..progress.clone()
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("POST {} failed: {}", url, e)))?;
        Self::parse(response).await
    }
}

/// Serves a fixed module and meeting and accepts every submission without
/// storing it.
#[derive(Default)]
pub struct NoopApiClient {
    pub module: Option<Module>,
    pub meeting: Option<Meeting>,
}

#[async_trait]
impl ApiClient for NoopApiClient {
    async fn fetch_module(&self, module_id: i64) -> Result<Module, AppError> {
        self.module
            .clone()
            .filter(|m| m.id == module_id)
            .ok_or_else(|| AppError::NotFound("Module".to_string()))
    }

    async fn fetch_meeting(&self, meeting_id: i64) -> Result<Meeting, AppError> {
        self.meeting
            .clone()
            .filter(|m| m.id == meeting_id)
            .ok_or_else(|| AppError::NotFound("Meeting".to_string()))
    }

    async fn submit_progress(
        &self,
        student_id: &str,
        progress: &ProgressRequest,
    ) -> Result<QuizResult, AppError> {
        Ok(QuizResult {
            id: String::new(),
            student_id: student_id.to_string(),
            meeting_id: Some(progress.meeting_id),
            module_id: progress.module_id,
            raw_points: Some(progress.raw_points),
            total_questions: Some(progress.total_questions),
            score: progress.score,
            stars: progress.stars,
            completed_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

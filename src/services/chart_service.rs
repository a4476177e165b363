//! Chart generation service client

use crate::core::models::{ChartOutcome, ChartRequest};
use crate::services::error::{ServiceError, ServiceResult};
use reqwest::Client;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ChartService {
    http: Client,
    url: String,
    api_key: Option<String>,
    session_token: Option<String>,
}

impl ChartService {
    pub fn new(
        http: Client,
        url: impl Into<String>,
        api_key: Option<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            api_key,
            session_token,
        }
    }

    /// POST the prompt and decode `{status, data: {chart_id, url}}`
    pub async fn generate(&self, request: &ChartRequest) -> ServiceResult<ChartOutcome> {
        if self.url.trim().is_empty() {
            return Err(ServiceError::NotConfigured("chart service URL"));
        }

        let mut req = self
            .http
            .post(self.url.trim())
            .header("accept", "application/json")
            .json(request);
        if let Some(token) = self.session_token.as_deref().filter(|t| !t.is_empty()) {
            req = req.header("session", token);
        }
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            req = req.header("X-API-Key", key);
        }
        let res = req.send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }
        let body: Value = res
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(format!("chart response body: {e}")))?;
        ChartOutcome::from_response(&body).map_err(ServiceError::Malformed)
    }
}

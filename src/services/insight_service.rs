use crate::core::models::{InsightRequest, InsightResponse};
use crate::services::error::{ServiceError, ServiceResult};
use reqwest::Client;

/// Client for the chart insight generation endpoint. No request timeout is
/// set; a hung call keeps the modal loading until it is closed.
#[derive(Debug, Clone)]
pub struct InsightService {
    http: Client,
    url: String,
    api_key: Option<String>,
}

impl InsightService {
    pub fn new(http: Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key,
        }
    }

    /// Returns the generated markdown
    pub async fn generate(&self, request: &InsightRequest) -> ServiceResult<String> {
        if self.url.trim().is_empty() {
            return Err(ServiceError::NotConfigured("insight service URL"));
        }

        let mut req = self.http.post(self.url.trim()).json(request);
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            req = req.header("X-API-Key", key);
        }
        let res = req.send().await?;

        if !res.status().is_success() {
            return Err(ServiceError::Status(res.status().as_u16()));
        }
        let parsed: InsightResponse = res
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(format!("insight response body: {e}")))?;
        Ok(parsed.data)
    }
}

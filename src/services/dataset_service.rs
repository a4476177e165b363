//! Dataset search against the dashboard REST API
//!
//! Issues `GET /api/v1/dataset/?q=<rison>` and decodes one page of datasets.

use crate::core::models::{DatasetPage, DatasetQuery};
use crate::core::rison;
use crate::services::error::{ServiceError, ServiceResult};
use reqwest::{Client, Url};
use serde_json::Value;

const DATASET_ENDPOINT: &str = "/api/v1/dataset/";

/// Client for the paginated dataset search endpoint
#[derive(Debug, Clone)]
pub struct DatasetService {
    http: Client,
    base_url: String,
    session_token: Option<String>,
}

impl DatasetService {
    pub fn new(http: Client, base_url: impl Into<String>, session_token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session_token,
        }
    }

    /// Build the full search URL with the rison-encoded `q` parameter
    pub fn search_url(&self, query: &DatasetQuery) -> ServiceResult<Url> {
        let base = self.base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(ServiceError::NotConfigured("dashboard API URL"));
        }
        let mut url = Url::parse(&format!("{base}{DATASET_ENDPOINT}"))
            .map_err(|_| ServiceError::NotConfigured("dashboard API URL"))?;
        url.query_pairs_mut()
            .append_pair("q", &rison::encode(&query.to_json()));
        Ok(url)
    }

    /// Fetch one page of datasets whose table name contains `query.search`
    pub async fn search(&self, query: &DatasetQuery) -> ServiceResult<DatasetPage> {
        let url = self.search_url(query)?;
        tracing::debug!(%url, "searching datasets");

        let mut req = self.http.get(url).header("accept", "application/json");
        if let Some(token) = self.session_token.as_deref().filter(|t| !t.is_empty()) {
            req = req.header("Cookie", format!("session={token}"));
        }
        let res = req.send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }
        let body: Value = res
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(format!("dataset search body: {e}")))?;
        DatasetPage::from_response(&body).map_err(ServiceError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_carries_rison_query() {
        let service = DatasetService::new(Client::new(), "https://dash.example/", None);
        let url = service.search_url(&DatasetQuery::new("sales", 1, 20)).unwrap();
        assert_eq!(url.path(), "/api/v1/dataset/");

        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "q");
        assert!(value.contains("filters:!((col:table_name,opr:ct,value:sales))"));
        assert!(value.contains("order_column:table_name,order_direction:asc"));
        assert!(value.contains("page:1,page_size:20"));
    }

    #[test]
    fn test_search_url_requires_base() {
        let service = DatasetService::new(Client::new(), "  ", None);
        assert!(matches!(
            service.search_url(&DatasetQuery::new("", 0, 20)),
            Err(ServiceError::NotConfigured(_))
        ));
    }
}

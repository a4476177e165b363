use async_trait::async_trait;
use reqwest::Client;

use crate::config::ServiceConfig;
use crate::core::models::{ChartOutcome, ChartRequest, DatasetPage, DatasetQuery, InsightRequest};
use crate::services::chart_service::ChartService;
use crate::services::dataset_service::DatasetService;
use crate::services::error::ServiceResult;
use crate::services::insight_service::InsightService;

/// The remote collaborators the widgets talk to
#[async_trait]
pub trait Backend: Send + Sync {
    async fn search_datasets(&self, query: &DatasetQuery) -> ServiceResult<DatasetPage>;

    async fn generate_chart(&self, request: &ChartRequest) -> ServiceResult<ChartOutcome>;

    async fn generate_insight(&self, request: &InsightRequest) -> ServiceResult<String>;
}

/// Backend over HTTP, sharing one connection pool between the three services
#[derive(Debug, Clone)]
pub struct HttpBackend {
    pub datasets: DatasetService,
    pub charts: ChartService,
    pub insights: InsightService,
}

impl HttpBackend {
    pub fn from_config(cfg: &ServiceConfig) -> color_eyre::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {e}"))?;

        Ok(Self {
            datasets: DatasetService::new(
                http.clone(),
                cfg.dashboard_api_url.clone(),
                cfg.session_token.clone(),
            ),
            charts: ChartService::new(
                http.clone(),
                cfg.chart_service_url.clone(),
                cfg.api_key.clone(),
                cfg.session_token.clone(),
            ),
            insights: InsightService::new(http, cfg.insight_service_url.clone(), cfg.api_key.clone()),
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn search_datasets(&self, query: &DatasetQuery) -> ServiceResult<DatasetPage> {
        self.datasets.search(query).await
    }

    async fn generate_chart(&self, request: &ChartRequest) -> ServiceResult<ChartOutcome> {
        self.charts.generate(request).await
    }

    async fn generate_insight(&self, request: &InsightRequest) -> ServiceResult<String> {
        self.insights.generate(request).await
    }
}

pub mod backend;
pub mod chart_service;
pub mod dataset_service;
pub mod error;
pub mod insight_service;

pub use backend::{Backend, HttpBackend};
pub use chart_service::ChartService;
pub use dataset_service::DatasetService;
pub use error::{ServiceError, ServiceResult};
pub use insight_service::InsightService;

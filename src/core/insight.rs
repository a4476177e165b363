//! Chart insight modal state machine.
//!
//! Every open issues a fresh request tagged with a [`RequestId`]. Only the
//! completion that matches the currently loading request is applied, so a
//! late answer for an earlier open, or one arriving after close, is dropped.

use crate::core::models::{ChartMetadata, InsightRequest};
use crate::core::types::RequestId;
use crate::services::error::ServiceResult;

pub const LOADING_TEXT: &str = "Loading...";

/// User-facing texts, configurable so they can be localized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightTexts {
    pub error: String,
    pub empty: String,
}

impl Default for InsightTexts {
    fn default() -> Self {
        Self {
            error: "An error occurred while fetching the insight.".to_string(),
            empty: "No insight available.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InsightState {
    #[default]
    Closed,
    Loading {
        request_id: RequestId,
        chart_title: String,
    },
    Ready {
        chart_title: String,
        markdown: String,
    },
    Failed {
        chart_title: String,
        message: String,
    },
}

impl InsightState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn chart_title(&self) -> Option<&str> {
        match self {
            Self::Closed => None,
            Self::Loading { chart_title, .. }
            | Self::Ready { chart_title, .. }
            | Self::Failed { chart_title, .. } => Some(chart_title),
        }
    }

    /// Text to show in the modal body
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Closed => None,
            Self::Loading { .. } => Some(LOADING_TEXT),
            Self::Ready { markdown, .. } => Some(markdown),
            Self::Failed { message, .. } => Some(message),
        }
    }
}

#[derive(Debug)]
pub enum InsightEvent {
    Open(ChartMetadata),
    Close,
    Completed {
        request_id: RequestId,
        result: ServiceResult<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsightEffect {
    FetchInsight {
        request_id: RequestId,
        request: InsightRequest,
    },
}

pub fn reduce(
    state: &mut InsightState,
    event: InsightEvent,
    texts: &InsightTexts,
) -> Option<InsightEffect> {
    match event {
        InsightEvent::Open(chart) => {
            let request_id = RequestId::new();
            tracing::debug!(%request_id, slice_id = chart.slice_id, "insight requested");
            *state = InsightState::Loading {
                request_id,
                chart_title: chart.title.clone(),
            };
            Some(InsightEffect::FetchInsight {
                request_id,
                request: InsightRequest::from_chart(&chart),
            })
        }
        InsightEvent::Close => {
            *state = InsightState::Closed;
            None
        }
        InsightEvent::Completed { request_id, result } => {
            let chart_title = match state {
                InsightState::Loading {
                    request_id: current,
                    chart_title,
                } if *current == request_id => std::mem::take(chart_title),
                _ => {
                    tracing::debug!(%request_id, "dropping stale insight response");
                    return None;
                }
            };
            *state = match result {
                Ok(text) if text.trim().is_empty() => InsightState::Ready {
                    chart_title,
                    markdown: texts.empty.clone(),
                },
                Ok(markdown) => InsightState::Ready {
                    chart_title,
                    markdown,
                },
                Err(err) => {
                    tracing::error!(%request_id, kind = err.kind(), "insight generation failed: {err}");
                    InsightState::Failed {
                        chart_title,
                        message: texts.error.clone(),
                    }
                }
            };
            None
        }
    }
}

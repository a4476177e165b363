#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_match)]
#![allow(clippy::collapsible_else_if)]

pub mod config;
pub mod core;
pub mod logging;
pub mod services;
pub mod tui;

// Re-export commonly used types
pub use config::Config;
pub use core::{ChartMetadata, ChatState, DatasetKey, InsightState, RequestId};
pub use services::{Backend, HttpBackend, ServiceError};
pub use tui::{Action, ActionCategory, App, AppEvent};

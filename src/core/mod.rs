pub mod chat;
pub mod insight;
pub mod models;
pub mod rison;
pub mod types;

pub use chat::{ChatContext, ChatEffect, ChatEvent, ChatState};
pub use insight::{InsightEffect, InsightEvent, InsightState, InsightTexts};
pub use models::*;
pub use types::*;

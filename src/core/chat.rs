//! Dataset chat state machine.
//!
//! All transitions go through [`reduce`]. The reducer never performs IO: a
//! send produces a [`ChatEffect`] that the caller executes, and the outcome
//! comes back later as [`ChatEvent::ChartGenerated`].

use std::collections::HashSet;

use crate::core::models::{ChartOutcome, ChartRequest};
use crate::core::types::{ChatPhase, DatasetKey, Message, RequestId};
use crate::services::error::ServiceResult;

pub const SELECT_DATASET_PROMPT: &str = "Please select a dataset first.";
pub const CHART_FAILED_MESSAGE: &str =
    "Failed to create chart. Your dataset may be insufficient to build the chart. Please try again later.";

/// Values every chart request carries besides the dataset and prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatContext {
    pub dashboard_id: Option<i64>,
    pub dashboard_base_url: String,
}

#[derive(Debug)]
pub enum ChatEvent {
    DatasetSelected(DatasetKey),
    InputChanged(String),
    Send,
    ChartGenerated {
        request_id: RequestId,
        result: ServiceResult<ChartOutcome>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEffect {
    GenerateChart {
        request_id: RequestId,
        request: ChartRequest,
    },
}

#[derive(Debug, Clone)]
pub struct ChatState {
    messages: Vec<Message>,
    input: String,
    dataset: Option<DatasetKey>,
    in_flight: HashSet<RequestId>,
    last_chart_url: Option<String>,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            messages: vec![Message::bot(SELECT_DATASET_PROMPT)],
            input: String::new(),
            dataset: None,
            in_flight: HashSet::new(),
            last_chart_url: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn dataset(&self) -> Option<&DatasetKey> {
        self.dataset.as_ref()
    }

    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }

    pub fn last_chart_url(&self) -> Option<&str> {
        self.last_chart_url.as_deref()
    }

    pub fn phase(&self) -> ChatPhase {
        if !self.in_flight.is_empty() {
            ChatPhase::AwaitingResponse
        } else if self.dataset.is_some() {
            ChatPhase::DatasetSelected
        } else {
            ChatPhase::NoDatasetSelected
        }
    }

    /// Whether a send would pass the guard right now
    pub fn can_send(&self) -> bool {
        self.dataset.is_some() && !self.input.trim().is_empty()
    }
}

/// Apply one event to the chat state
pub fn reduce(state: &mut ChatState, event: ChatEvent, ctx: &ChatContext) -> Option<ChatEffect> {
    match event {
        ChatEvent::DatasetSelected(key) => {
            tracing::info!(dataset_id = key.id, table = %key.table_name, "dataset selected");
            state.messages.push(Message::bot(format!(
                "You selected {}. How can I assist you?",
                key.table_name
            )));
            state.dataset = Some(key);
            None
        }
        ChatEvent::InputChanged(text) => {
            state.input = text;
            None
        }
        ChatEvent::Send => {
            let Some(dataset) = state.dataset.as_ref() else {
                tracing::debug!("send ignored: no dataset selected");
                return None;
            };
            if state.input.trim().is_empty() {
                tracing::debug!("send ignored: empty input");
                return None;
            }
            let prompt = std::mem::take(&mut state.input);
            let request = ChartRequest {
                dataset_id: dataset.id,
                dashboard_id: ctx.dashboard_id,
                bliv_dashboard_base_url: ctx.dashboard_base_url.clone(),
                prompt: prompt.clone(),
            };
            state.messages.push(Message::user(prompt));
            let request_id = RequestId::new();
            state.in_flight.insert(request_id);
            tracing::debug!(%request_id, dataset_id = request.dataset_id, "chart generation requested");
            Some(ChatEffect::GenerateChart {
                request_id,
                request,
            })
        }
        ChatEvent::ChartGenerated { request_id, result } => {
            if !state.in_flight.remove(&request_id) {
                tracing::debug!(%request_id, "chart response for an untracked request");
            }
            let text = match result {
                Ok(ChartOutcome::Created { chart_id, url }) => {
                    tracing::info!(%request_id, %chart_id, "chart created");
                    let text = format!("Chart created successfully!\nChart ID: {chart_id}\nURL: {url}");
                    state.last_chart_url = Some(url);
                    text
                }
                Ok(ChartOutcome::Rejected { status }) => {
                    tracing::warn!(%request_id, %status, "chart service did not report success");
                    CHART_FAILED_MESSAGE.to_string()
                }
                Err(err) => {
                    tracing::error!(%request_id, kind = err.kind(), "chart generation failed: {err}");
                    CHART_FAILED_MESSAGE.to_string()
                }
            };
            state.messages.push(Message::bot(text));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Sender;
    use crate::services::error::ServiceError;
    use pretty_assertions::assert_eq;

    fn ctx() -> ChatContext {
        ChatContext {
            dashboard_id: Some(3),
            dashboard_base_url: "https://dash.example".to_string(),
        }
    }

    fn selected(table: &str, id: i64) -> ChatState {
        let mut state = ChatState::new();
        reduce(&mut state, ChatEvent::DatasetSelected(DatasetKey::new(id, table)), &ctx());
        state
    }

    fn send(state: &mut ChatState, text: &str) -> Option<ChatEffect> {
        reduce(state, ChatEvent::InputChanged(text.to_string()), &ctx());
        reduce(state, ChatEvent::Send, &ctx())
    }

    fn request_id(effect: Option<ChatEffect>) -> RequestId {
        match effect {
            Some(ChatEffect::GenerateChart { request_id, .. }) => request_id,
            None => panic!("expected a chart request"),
        }
    }

    #[test]
    fn test_initial_state() {
        let state = ChatState::new();
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].sender, Sender::Bot);
        assert_eq!(state.messages()[0].text, SELECT_DATASET_PROMPT);
        assert_eq!(state.phase(), ChatPhase::NoDatasetSelected);
    }

    #[test]
    fn test_selection_acknowledges_and_latest_wins() {
        let mut state = selected("orders", 4);
        assert_eq!(state.messages().last().unwrap().text, "You selected orders. How can I assist you?");
        reduce(&mut state, ChatEvent::DatasetSelected(DatasetKey::new(9, "regions")), &ctx());
        reduce(&mut state, ChatEvent::DatasetSelected(DatasetKey::new(2, "customers")), &ctx());
        assert_eq!(state.dataset(), Some(&DatasetKey::new(2, "customers")));
        assert_eq!(state.phase(), ChatPhase::DatasetSelected);
        assert_eq!(state.messages().len(), 4);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut state = selected("orders", 4);
        let before = state.messages().len();
        assert!(send(&mut state, "").is_none());
        assert!(send(&mut state, "   \t ").is_none());
        assert_eq!(state.messages().len(), before);
        assert_eq!(state.pending_requests(), 0);
    }

    #[test]
    fn test_send_without_dataset_is_ignored() {
        let mut state = ChatState::new();
        assert!(send(&mut state, "plot revenue").is_none());
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.input(), "plot revenue");
    }

    #[test]
    fn test_send_builds_request_and_clears_input() {
        let mut state = selected("orders", 4);
        let effect = send(&mut state, "revenue by month");
        assert_eq!(state.input(), "");
        assert_eq!(state.phase(), ChatPhase::AwaitingResponse);
        let last = state.messages().last().unwrap();
        assert_eq!(last.sender, Sender::User);
        assert_eq!(last.text, "revenue by month");
        match effect {
            Some(ChatEffect::GenerateChart { request, .. }) => {
                assert_eq!(
                    request,
                    ChartRequest {
                        dataset_id: 4,
                        dashboard_id: Some(3),
                        bliv_dashboard_base_url: "https://dash.example".to_string(),
                        prompt: "revenue by month".to_string(),
                    }
                );
            }
            None => panic!("expected a chart request"),
        }
    }

    #[test]
    fn test_success_appends_one_message() {
        let mut state = selected("orders", 4);
        let id = request_id(send(&mut state, "bar chart"));
        let before = state.messages().len();
        reduce(
            &mut state,
            ChatEvent::ChartGenerated {
                request_id: id,
                result: Ok(ChartOutcome::Created { chart_id: "42".into(), url: "http://x".into() }),
            },
            &ctx(),
        );
        assert_eq!(state.messages().len(), before + 1);
        let text = &state.messages().last().unwrap().text;
        assert!(text.contains("42"));
        assert!(text.contains("http://x"));
        assert_eq!(state.last_chart_url(), Some("http://x"));
        assert_eq!(state.phase(), ChatPhase::DatasetSelected);
    }

    fn transport_error() -> ServiceError {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        ServiceError::from(err)
    }

    #[test]
    fn test_transport_failure_appends_generic_message_once() {
        let mut state = selected("orders", 4);
        let id = request_id(send(&mut state, "line chart"));
        let before = state.messages().len();
        let err = transport_error();
        assert_eq!(err.kind(), "transport");
        reduce(
            &mut state,
            ChatEvent::ChartGenerated { request_id: id, result: Err(err) },
            &ctx(),
        );
        assert_eq!(state.messages().len(), before + 1);
        assert_eq!(state.messages().last().unwrap().text, CHART_FAILED_MESSAGE);
        assert_eq!(state.phase(), ChatPhase::DatasetSelected);
    }

    #[test]
    fn test_failures_append_exactly_one_generic_message() {
        let mut state = selected("orders", 4);
        let failures: Vec<ServiceResult<ChartOutcome>> = vec![
            Ok(ChartOutcome::Rejected { status: "error".into() }),
            Err(ServiceError::Malformed("not json".into())),
            Err(ServiceError::Status(500)),
            Err(transport_error()),
        ];
        for result in failures {
            let id = request_id(send(&mut state, "pie chart"));
            let before = state.messages().len();
            reduce(&mut state, ChatEvent::ChartGenerated { request_id: id, result }, &ctx());
            assert_eq!(state.messages().len(), before + 1);
            assert_eq!(state.messages().last().unwrap().text, CHART_FAILED_MESSAGE);
        }
        assert_eq!(state.pending_requests(), 0);
    }

    #[test]
    fn test_overlapping_requests_append_in_completion_order() {
        let mut state = selected("orders", 4);
        let first = request_id(send(&mut state, "first"));
        let second = request_id(send(&mut state, "second"));
        assert_ne!(first, second);
        assert_eq!(state.pending_requests(), 2);

        reduce(
            &mut state,
            ChatEvent::ChartGenerated {
                request_id: second,
                result: Ok(ChartOutcome::Created { chart_id: "2".into(), url: "http://two".into() }),
            },
            &ctx(),
        );
        assert_eq!(state.phase(), ChatPhase::AwaitingResponse);
        reduce(
            &mut state,
            ChatEvent::ChartGenerated {
                request_id: first,
                result: Ok(ChartOutcome::Created { chart_id: "1".into(), url: "http://one".into() }),
            },
            &ctx(),
        );
        let n = state.messages().len();
        assert!(state.messages()[n - 2].text.contains("http://two"));
        assert!(state.messages()[n - 1].text.contains("http://one"));
        assert_eq!(state.last_chart_url(), Some("http://one"));
    }
}

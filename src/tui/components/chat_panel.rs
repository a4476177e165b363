use color_eyre::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::chat::{self, ChatContext, ChatEffect, ChatEvent, ChatState};
use crate::core::{ChartOutcome, ChatPhase, DatasetKey, Message, RequestId, Sender};
use crate::services::ServiceResult;
use crate::tui::components::text_field::TextField;
use crate::tui::{Action, Component, Focusable, Theme};

/// Conversation history plus the prompt box
pub struct ChatPanel {
    state: ChatState,
    ctx: ChatContext,
    input: TextField,
    /// Lines scrolled up from the bottom; 0 follows new messages
    scroll_back: u16,
    focused: bool,
}

impl ChatPanel {
    pub fn new(ctx: ChatContext) -> Self {
        Self {
            state: ChatState::new(),
            ctx,
            input: TextField::new(),
            scroll_back: 0,
            focused: false,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    fn dispatch(&mut self, event: ChatEvent) -> Option<ChatEffect> {
        let effect = chat::reduce(&mut self.state, event, &self.ctx);
        if self.input.value() != self.state.input() {
            self.input.set(self.state.input());
        }
        effect
    }

    pub fn select_dataset(&mut self, key: DatasetKey) {
        self.scroll_back = 0;
        self.dispatch(ChatEvent::DatasetSelected(key));
    }

    /// Submit the prompt box; returns the request to run if the send was accepted
    pub fn send(&mut self) -> Option<ChatEffect> {
        let effect = self.dispatch(ChatEvent::Send);
        if effect.is_some() {
            self.scroll_back = 0;
        }
        effect
    }

    pub fn apply_chart(&mut self, request_id: RequestId, result: ServiceResult<ChartOutcome>) {
        self.scroll_back = 0;
        self.dispatch(ChatEvent::ChartGenerated { request_id, result });
    }

    fn sync_input(&mut self) {
        self.dispatch(ChatEvent::InputChanged(self.input.value().to_string()));
    }

    fn history_lines(&self, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        let body_width = width.saturating_sub(2).max(1) as usize;
        let mut lines = Vec::new();
        for message in self.state.messages() {
            lines.push(message_header(message, theme));
            for paragraph in message.text.split('\n') {
                if paragraph.is_empty() {
                    lines.push(Line::from(""));
                    continue;
                }
                for wrapped in textwrap::wrap(paragraph, body_width) {
                    lines.push(Line::from(Span::styled(
                        format!("  {wrapped}"),
                        theme.normal_style(),
                    )));
                }
            }
            lines.push(Line::from(""));
        }
        lines
    }

    fn hint(&self, theme: &Theme) -> Span<'static> {
        match self.state.phase() {
            ChatPhase::NoDatasetSelected => {
                Span::styled("Pick a dataset on the left first", theme.muted_style())
            }
            ChatPhase::AwaitingResponse => Span::styled(
                format!("Generating chart ({} pending)...", self.state.pending_requests()),
                theme.info_style(),
            ),
            ChatPhase::DatasetSelected => match self.state.dataset() {
                Some(key) => Span::styled(
                    format!("Dataset: {}  Enter to send", key.table_name),
                    theme.muted_style(),
                ),
                None => Span::raw(""),
            },
        }
    }
}

fn message_header(message: &Message, theme: &Theme) -> Line<'static> {
    let (who, style) = match message.sender {
        Sender::User => ("You", theme.user_style()),
        Sender::Bot => ("Assistant", theme.bot_style()),
    };
    Line::from(vec![
        Span::styled(who, style),
        Span::styled(
            format!("  {}", message.sent_at.with_timezone(&chrono::Local).format("%H:%M")),
            theme.muted_style(),
        ),
    ])
}

impl Component for ChatPanel {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::MoveUp => self.scroll_back = self.scroll_back.saturating_add(1),
            Action::MoveDown => self.scroll_back = self.scroll_back.saturating_sub(1),
            Action::PageUp => self.scroll_back = self.scroll_back.saturating_add(10),
            Action::PageDown => self.scroll_back = self.scroll_back.saturating_sub(10),
            _ => {
                let (handled, changed) = self.input.apply(action);
                if changed {
                    self.sync_input();
                }
                return Ok(handled);
            }
        }
        Ok(true)
    }

    fn handle_char(&mut self, c: char) -> bool {
        self.input.insert_char(c);
        self.sync_input();
        true
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled("Chat", theme.header_style()))
            .border_style(theme.pane_border_style(self.focused));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let lines = self.history_lines(chunks[0].width, theme);
        let overflow = (lines.len() as u16).saturating_sub(chunks[0].height);
        self.scroll_back = self.scroll_back.min(overflow);
        let history = Paragraph::new(lines).scroll((overflow - self.scroll_back, 0));
        frame.render_widget(history, chunks[0]);

        frame.render_widget(Paragraph::new(Line::from(self.hint(theme))), chunks[1]);

        let prompt = self.input.to_line("> ", theme.normal_style(), self.focused);
        frame.render_widget(Paragraph::new(prompt), chunks[2]);
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::PageUp,
            Action::PageDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::Home,
            Action::End,
            Action::Backspace,
            Action::Delete,
            Action::Confirm,
        ]
    }

    fn name(&self) -> &str {
        "ChatPanel"
    }
}

impl Focusable for ChatPanel {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

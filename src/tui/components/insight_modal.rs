use color_eyre::Result;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::core::insight::{self, InsightEffect, InsightEvent, InsightState, InsightTexts};
use crate::core::{ChartMetadata, RequestId};
use crate::services::ServiceResult;
use crate::tui::{markdown, Action, Component, Theme};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Overlay showing the generated insight for one chart
pub struct InsightModal {
    state: InsightState,
    texts: InsightTexts,
    scroll: u16,
    tick: usize,
}

impl InsightModal {
    pub fn new(texts: InsightTexts) -> Self {
        Self {
            state: InsightState::Closed,
            texts,
            scroll: 0,
            tick: 0,
        }
    }

    pub fn state(&self) -> &InsightState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn open(&mut self, chart: ChartMetadata) -> Option<InsightEffect> {
        self.scroll = 0;
        insight::reduce(&mut self.state, InsightEvent::Open(chart), &self.texts)
    }

    pub fn close(&mut self) {
        insight::reduce(&mut self.state, InsightEvent::Close, &self.texts);
    }

    pub fn apply(&mut self, request_id: RequestId, result: ServiceResult<String>) {
        insight::reduce(
            &mut self.state,
            InsightEvent::Completed { request_id, result },
            &self.texts,
        );
    }

    fn body_lines(&self, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        match &self.state {
            InsightState::Closed => Vec::new(),
            InsightState::Loading { .. } => vec![Line::from(Span::styled(
                format!("{} {}", SPINNER[self.tick % SPINNER.len()], insight::LOADING_TEXT),
                theme.info_style(),
            ))],
            InsightState::Ready { markdown: text, .. } => markdown::render(text, width, theme),
            InsightState::Failed { message, .. } => {
                vec![Line::from(Span::styled(message.clone(), theme.error_style()))]
            }
        }
    }
}

impl Component for InsightModal {
    /// While open the modal swallows every action so nothing reaches the panes
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        if !self.is_open() {
            return Ok(false);
        }
        match action {
            Action::Cancel | Action::OpenInsight => self.close(),
            Action::MoveUp => self.scroll = self.scroll.saturating_sub(1),
            Action::MoveDown => self.scroll = self.scroll.saturating_add(1),
            Action::PageUp => self.scroll = self.scroll.saturating_sub(10),
            Action::PageDown => self.scroll = self.scroll.saturating_add(10),
            Action::Home => self.scroll = 0,
            _ => {}
        }
        Ok(true)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let Some(title) = self.state.chart_title() else {
            return;
        };
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(Span::styled(format!(" Insight: {title} "), theme.header_style()))
            .title_bottom(Line::from(Span::styled(" Esc to close ", theme.muted_style())))
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(theme.focused_border_style())
            .style(theme.normal_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = self.body_lines(inner.width, theme);
        let max_scroll = (lines.len() as u16).saturating_sub(inner.height);
        self.scroll = self.scroll.min(max_scroll);
        let body = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(body, inner);
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::Cancel,
            Action::MoveUp,
            Action::MoveDown,
            Action::PageUp,
            Action::PageDown,
            Action::Home,
        ]
    }

    fn name(&self) -> &str {
        "InsightModal"
    }

    fn update(&mut self) -> Result<()> {
        if self.state.is_loading() {
            self.tick = self.tick.wrapping_add(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use pretty_assertions::assert_eq;
    use ratatui::{backend::TestBackend, Terminal};

    fn chart() -> ChartMetadata {
        serde_json::from_value(serde_json::json!({
            "title": "Revenue", "viz_type": "bar", "rows": [{"m": "Jan", "v": 3}]
        }))
        .unwrap()
    }

    fn request_id(effect: Option<InsightEffect>) -> RequestId {
        match effect {
            Some(InsightEffect::FetchInsight { request_id, .. }) => request_id,
            None => panic!("expected an insight request"),
        }
    }

    fn screen(modal: &mut InsightModal) -> String {
        let mut terminal = Terminal::new(TestBackend::new(50, 10)).unwrap();
        terminal
            .draw(|f| modal.render(f, f.area(), &Theme::default()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_closed_modal_ignores_actions() {
        let mut modal = InsightModal::new(InsightTexts::default());
        assert!(!modal.handle_action(Action::Cancel).unwrap());
    }

    #[test]
    fn test_open_render_ready_and_close() {
        let mut modal = InsightModal::new(InsightTexts::default());
        let id = request_id(modal.open(chart()));
        assert!(screen(&mut modal).contains("Loading..."));

        modal.apply(id, Ok("## Trend\nRevenue **grew**".to_string()));
        let text = screen(&mut modal);
        assert!(text.contains("Insight: Revenue"));
        assert!(text.contains("Trend"));
        assert!(text.contains("Revenue grew"));

        assert!(modal.handle_action(Action::Cancel).unwrap());
        assert!(!modal.is_open());
    }

    #[test]
    fn test_failure_shows_configured_text() {
        let texts = InsightTexts {
            error: "Gagal memuat insight.".to_string(),
            empty: "Tidak ada data.".to_string(),
        };
        let mut modal = InsightModal::new(texts);
        let id = request_id(modal.open(chart()));
        modal.apply(id, Err(ServiceError::Status(500)));
        assert!(screen(&mut modal).contains("Gagal memuat insight."));
    }

    #[test]
    fn test_late_result_after_close_is_dropped() {
        let mut modal = InsightModal::new(InsightTexts::default());
        let id = request_id(modal.open(chart()));
        modal.close();
        modal.apply(id, Ok("late".to_string()));
        assert_eq!(modal.state(), &InsightState::Closed);
    }

    #[test]
    fn test_spinner_advances_only_while_loading() {
        let mut modal = InsightModal::new(InsightTexts::default());
        modal.update().unwrap();
        assert_eq!(modal.tick, 0);
        modal.open(chart());
        modal.update().unwrap();
        assert_eq!(modal.tick, 1);
    }
}

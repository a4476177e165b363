use std::path::Path;

use color_eyre::{eyre::WrapErr, Result};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use serde::Deserialize;

use crate::core::ChartMetadata;
use crate::tui::{Action, Component, Focusable, Theme};

#[derive(Deserialize)]
#[serde(untagged)]
enum ChartsFile {
    List(Vec<ChartMetadata>),
    Wrapped { charts: Vec<ChartMetadata> },
}

/// Read chart metadata from a JSON file: either an array of charts or
/// an object with a `charts` array
pub fn load_charts(path: &Path) -> Result<Vec<ChartMetadata>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read charts file {}", path.display()))?;
    let parsed: ChartsFile = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Invalid charts file {}", path.display()))?;
    let charts = match parsed {
        ChartsFile::List(charts) | ChartsFile::Wrapped { charts } => charts,
    };
    tracing::info!(count = charts.len(), path = %path.display(), "charts loaded");
    Ok(charts)
}

/// Chart headers from the dashboard; each one can open an insight
pub struct ChartList {
    charts: Vec<ChartMetadata>,
    list_state: ListState,
    focused: bool,
}

impl ChartList {
    pub fn new(charts: Vec<ChartMetadata>) -> Self {
        let mut list_state = ListState::default();
        if !charts.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            charts,
            list_state,
            focused: false,
        }
    }

    pub fn selected(&self) -> Option<&ChartMetadata> {
        self.charts.get(self.list_state.selected()?)
    }

    fn select(&mut self, idx: usize) {
        if let Some(last) = self.charts.len().checked_sub(1) {
            self.list_state.select(Some(idx.min(last)));
        }
    }
}

impl Component for ChartList {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        let current = self.list_state.selected().unwrap_or(0);
        match action {
            Action::MoveUp => self.select(current.saturating_sub(1)),
            Action::MoveDown => self.select(current + 1),
            Action::PageUp | Action::Home => self.select(0),
            Action::PageDown | Action::End => self.select(usize::MAX),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled("Charts", theme.header_style()))
            .border_style(theme.pane_border_style(self.focused));

        if self.charts.is_empty() {
            let hint = Paragraph::new("No charts loaded. Start with --charts <file.json>")
                .style(theme.muted_style())
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(hint, area);
            return;
        }

        let items: Vec<ListItem> = self
            .charts
            .iter()
            .map(|chart| {
                ListItem::new(Line::from(vec![
                    Span::styled(chart.title.clone(), theme.normal_style()),
                    Span::styled(format!("  [{}]", chart.viz_type), theme.muted_style()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(theme.selected_style())
            .highlight_symbol("ⓘ ");
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::PageUp,
            Action::PageDown,
            Action::Home,
            Action::End,
            Action::OpenInsight,
            Action::Confirm,
        ]
    }

    fn name(&self) -> &str {
        "ChartList"
    }
}

impl Focusable for ChartList {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn chart(title: &str) -> ChartMetadata {
        serde_json::from_value(serde_json::json!({"title": title, "viz_type": "line"})).unwrap()
    }

    #[test]
    fn test_navigation_clamps() {
        let mut list = ChartList::new(vec![chart("a"), chart("b")]);
        assert_eq!(list.selected().unwrap().title, "a");
        list.handle_action(Action::MoveDown).unwrap();
        list.handle_action(Action::MoveDown).unwrap();
        assert_eq!(list.selected().unwrap().title, "b");
        list.handle_action(Action::Home).unwrap();
        assert_eq!(list.selected().unwrap().title, "a");
        assert!(!list.handle_action(Action::Backspace).unwrap());
    }

    #[test]
    fn test_empty_list_has_no_selection() {
        let mut list = ChartList::new(Vec::new());
        list.handle_action(Action::MoveDown).unwrap();
        assert!(list.selected().is_none());
    }

    #[test]
    fn test_load_charts_accepts_both_shapes() {
        let mut array = tempfile::NamedTempFile::new().unwrap();
        write!(array, r#"[{{"title": "Sales", "viz_type": "pie"}}]"#).unwrap();
        let charts = load_charts(array.path()).unwrap();
        assert_eq!(charts[0].title, "Sales");

        let mut wrapped = tempfile::NamedTempFile::new().unwrap();
        write!(
            wrapped,
            r#"{{"charts": [{{"title": "Trend", "viz_type": "echarts_timeseries_line", "x_axis": "month"}}]}}"#
        )
        .unwrap();
        let charts = load_charts(wrapped.path()).unwrap();
        assert_eq!(charts[0].x_axis.as_deref(), Some("month"));
    }

    #[test]
    fn test_load_charts_reports_bad_json() {
        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "not json").unwrap();
        let err = load_charts(bad.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid charts file"));
    }
}

use std::collections::BTreeMap;

use color_eyre::Result;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::{Action, ActionCategory, Component, KeyBindings, Theme};

/// Key reference grouped by action category
pub struct HelpOverlay {
    lines: Vec<(ActionCategory, String, &'static str)>,
    scroll: u16,
}

impl HelpOverlay {
    pub fn new(bindings: &KeyBindings) -> Self {
        let mut lines = Vec::new();
        for action in Action::all() {
            let keys = bindings.get_keys_for_action(action);
            let keys = if keys.is_empty() {
                "(unbound)".to_string()
            } else {
                keys.join(", ")
            };
            lines.push((action.category(), keys, action.description()));
        }
        Self { lines, scroll: 0 }
    }

    fn text(&self, theme: &Theme) -> Vec<Line<'static>> {
        let mut grouped: BTreeMap<ActionCategory, Vec<(&str, &str)>> = BTreeMap::new();
        for (category, keys, description) in &self.lines {
            grouped
                .entry(*category)
                .or_default()
                .push((keys.as_str(), *description));
        }

        let mut out = Vec::new();
        for (category, entries) in grouped {
            out.push(Line::from(Span::styled(category.to_string(), theme.header_style())));
            for (keys, description) in entries {
                out.push(Line::from(vec![
                    Span::styled(format!("  {keys:<22}"), theme.info_style()),
                    Span::styled(description.to_string(), theme.normal_style()),
                ]));
            }
            out.push(Line::from(""));
        }
        out.push(Line::from(Span::styled(
            "Typing goes to the focused search or prompt box; single-key bindings apply elsewhere.",
            theme.muted_style(),
        )));
        out
    }
}

impl Component for HelpOverlay {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::MoveUp => self.scroll = self.scroll.saturating_sub(1),
            Action::MoveDown => self.scroll = self.scroll.saturating_add(1),
            Action::PageUp => self.scroll = self.scroll.saturating_sub(10),
            Action::PageDown => self.scroll = self.scroll.saturating_add(10),
            Action::Home => self.scroll = 0,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(Clear, area);
        let block = Block::default()
            .title(Span::styled(" Keys ", theme.header_style()))
            .title_bottom(Line::from(Span::styled(" F1 or Esc to close ", theme.muted_style())))
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(theme.focused_border_style())
            .style(theme.normal_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let text = self.text(theme);
        let max_scroll = (text.len() as u16).saturating_sub(inner.height);
        self.scroll = self.scroll.min(max_scroll);
        frame.render_widget(Paragraph::new(text).scroll((self.scroll, 0)), inner);
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::PageUp,
            Action::PageDown,
            Action::Home,
            Action::ToggleHelp,
            Action::Cancel,
        ]
    }

    fn name(&self) -> &str {
        "HelpOverlay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_every_action_with_its_keys() {
        let help = HelpOverlay::new(&KeyBindings::default());
        assert_eq!(help.lines.len(), Action::all().len());
        let copy = help
            .lines
            .iter()
            .find(|(_, _, d)| *d == Action::CopyChartUrl.description())
            .unwrap();
        assert_eq!(copy.1, "Ctrl+y");
    }

    #[test]
    fn test_groups_by_category() {
        let help = HelpOverlay::new(&KeyBindings::default());
        let text = help.text(&Theme::default());
        let headings: Vec<String> = text
            .iter()
            .filter(|l| l.spans.len() == 1 && !l.spans[0].content.is_empty())
            .map(|l| l.spans[0].content.to_string())
            .collect();
        assert_eq!(
            &headings[..5],
            &["Navigation", "Editing", "Chart Insight", "Application", "Clipboard"]
        );
    }
}

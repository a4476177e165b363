use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::Action;

/// Single-line editable text with a cursor, counted in chars
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
    cursor: usize,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Replace the whole value and put the cursor at the end
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Returns true if the value changed
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
        true
    }

    /// Returns true if the value changed
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.value.chars().count() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
        true
    }

    /// Apply an editing or cursor action. Returns (handled, changed).
    pub fn apply(&mut self, action: Action) -> (bool, bool) {
        let len = self.value.chars().count();
        match action {
            Action::Backspace => (true, self.backspace()),
            Action::Delete => (true, self.delete()),
            Action::MoveLeft => {
                self.cursor = self.cursor.saturating_sub(1);
                (true, false)
            }
            Action::MoveRight => {
                self.cursor = (self.cursor + 1).min(len);
                (true, false)
            }
            Action::Home => {
                self.cursor = 0;
                (true, false)
            }
            Action::End => {
                self.cursor = len;
                (true, false)
            }
            _ => (false, false),
        }
    }

    /// Render as a line; the cursor cell is highlighted when focused
    pub fn to_line(&self, prompt: &str, style: Style, focused: bool) -> Line<'static> {
        let mut spans = vec![Span::styled(prompt.to_string(), style.add_modifier(Modifier::BOLD))];
        if !focused {
            spans.push(Span::styled(self.value.clone(), style));
            return Line::from(spans);
        }

        let split = self.byte_index(self.cursor);
        let (before, rest) = self.value.split_at(split);
        let mut rest_chars = rest.chars();
        let under_cursor = rest_chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
        let after: String = rest_chars.collect();

        spans.push(Span::styled(before.to_string(), style));
        spans.push(Span::styled(under_cursor, style.add_modifier(Modifier::REVERSED)));
        spans.push(Span::styled(after, style));
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_and_backspace() {
        let mut field = TextField::new();
        for c in "sales".chars() {
            field.insert_char(c);
        }
        assert_eq!(field.value(), "sales");
        assert_eq!(field.cursor(), 5);

        assert!(field.backspace());
        assert_eq!(field.value(), "sale");
    }

    #[test]
    fn test_editing_in_the_middle_with_multibyte_chars() {
        let mut field = TextField::new();
        field.set("héllo");
        field.apply(Action::Home);
        field.apply(Action::MoveRight);
        field.apply(Action::MoveRight);
        assert_eq!(field.apply(Action::Backspace), (true, true));
        assert_eq!(field.value(), "hllo");
        field.insert_char('é');
        assert_eq!(field.value(), "héllo");
        assert_eq!(field.apply(Action::Delete), (true, true));
        assert_eq!(field.value(), "hélo");
    }

    #[test]
    fn test_bounds() {
        let mut field = TextField::new();
        assert!(!field.backspace());
        assert!(!field.delete());
        field.set("ab");
        field.apply(Action::MoveRight);
        assert_eq!(field.cursor(), 2);
        assert_eq!(field.apply(Action::Confirm), (false, false));
    }

    #[test]
    fn test_to_line_marks_cursor() {
        let mut field = TextField::new();
        field.set("ab");
        field.apply(Action::MoveLeft);
        let line = field.to_line("> ", Style::default(), true);
        let text: Vec<String> = line.spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(text, vec!["> ", "a", "b", ""]);
        assert!(line.spans[2].style.add_modifier.contains(Modifier::REVERSED));
    }
}

use serde::{Deserialize, Serialize};
use strum::Display;

/// Everything a key can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    // Navigation
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageUp,
    PageDown,
    Home,
    End,
    FocusNext,
    FocusPrev,

    // Editing
    Backspace,
    Delete,

    // Insight
    OpenInsight,

    // Application
    ToggleHelp,
    Quit,
    Confirm,
    Cancel,

    // Clipboard
    CopyChartUrl,
}

impl Action {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Action::MoveUp => "Move selection up / scroll up",
            Action::MoveDown => "Move selection down / scroll down",
            Action::MoveLeft => "Move cursor left",
            Action::MoveRight => "Move cursor right",
            Action::PageUp => "Page up",
            Action::PageDown => "Page down (loads more datasets at the end of the list)",
            Action::Home => "Go to start",
            Action::End => "Go to end",
            Action::FocusNext => "Focus next pane",
            Action::FocusPrev => "Focus previous pane",
            Action::Backspace => "Delete character before cursor",
            Action::Delete => "Delete character under cursor",
            Action::OpenInsight => "Explain the selected chart",
            Action::ToggleHelp => "Toggle help screen",
            Action::Quit => "Quit application",
            Action::Confirm => "Select dataset / send prompt / open insight",
            Action::Cancel => "Close modal or help",
            Action::CopyChartUrl => "Copy last chart URL",
        }
    }

    /// Get category for grouping in help screen
    pub fn category(&self) -> ActionCategory {
        match self {
            Action::MoveUp
            | Action::MoveDown
            | Action::MoveLeft
            | Action::MoveRight
            | Action::PageUp
            | Action::PageDown
            | Action::Home
            | Action::End
            | Action::FocusNext
            | Action::FocusPrev => ActionCategory::Navigation,

            Action::Backspace | Action::Delete => ActionCategory::Editing,

            Action::OpenInsight => ActionCategory::Insight,

            Action::ToggleHelp | Action::Quit | Action::Confirm | Action::Cancel => {
                ActionCategory::Application
            }

            Action::CopyChartUrl => ActionCategory::Clipboard,
        }
    }

    /// Get all possible actions (for validation)
    pub fn all() -> Vec<Action> {
        vec![
            Action::MoveUp,
            Action::MoveDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::PageUp,
            Action::PageDown,
            Action::Home,
            Action::End,
            Action::FocusNext,
            Action::FocusPrev,
            Action::Backspace,
            Action::Delete,
            Action::OpenInsight,
            Action::ToggleHelp,
            Action::Quit,
            Action::Confirm,
            Action::Cancel,
            Action::CopyChartUrl,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum ActionCategory {
    Navigation,
    Editing,
    #[strum(to_string = "Chart Insight")]
    Insight,
    Application,
    Clipboard,
}

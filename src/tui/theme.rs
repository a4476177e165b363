use ratatui::style::{Color, Modifier, Style};

/// Color scheme for the terminal UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // General UI colors
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub border: Color,
    pub border_focused: Color,

    // Lists
    pub header_fg: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,

    // Conversation
    pub user_fg: Color,
    pub bot_fg: Color,

    // Markdown
    pub heading_fg: Color,
    pub code_fg: Color,

    // Status/feedback colors
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "Default Dark".to_string(),
            background: Color::Reset,
            foreground: Color::Gray,
            muted: Color::DarkGray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            header_fg: Color::Cyan,
            selected_fg: Color::Black,
            selected_bg: Color::Cyan,
            user_fg: Color::LightBlue,
            bot_fg: Color::LightGreen,
            heading_fg: Color::Yellow,
            code_fg: Color::Magenta,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Blue,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            background: Color::White,
            foreground: Color::Black,
            muted: Color::Gray,
            border: Color::Gray,
            border_focused: Color::Blue,
            header_fg: Color::Blue,
            selected_fg: Color::White,
            selected_bg: Color::Blue,
            user_fg: Color::Blue,
            bot_fg: Color::Rgb(0, 120, 0),
            heading_fg: Color::Rgb(160, 90, 0),
            code_fg: Color::Rgb(150, 0, 150),
            success: Color::Green,
            error: Color::Red,
            warning: Color::Rgb(200, 150, 0), // Darker yellow for light bg
            info: Color::Blue,
        }
    }

    /// Theme from the config name; unknown names fall back to dark
    pub fn by_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "light" => Self::light(),
            "dark" | "default" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, using dark");
                Self::dark()
            }
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(self.selected_fg)
            .bg(self.selected_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn focused_border_style(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    pub fn pane_border_style(&self, focused: bool) -> Style {
        if focused {
            self.focused_border_style()
        } else {
            self.border_style()
        }
    }

    pub fn user_style(&self) -> Style {
        Style::default().fg(self.user_fg).add_modifier(Modifier::BOLD)
    }

    pub fn bot_style(&self) -> Style {
        Style::default().fg(self.bot_fg).add_modifier(Modifier::BOLD)
    }

    pub fn heading_style(&self) -> Style {
        Style::default()
            .fg(self.heading_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn code_style(&self) -> Style {
        Style::default().fg(self.code_fg)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }
}

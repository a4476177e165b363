use std::sync::Arc;

use color_eyre::{eyre::WrapErr, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::Config;
use crate::core::{
    ChartMetadata, ChartOutcome, ChatEffect, DatasetKey, DatasetPage, InsightEffect, RequestId,
};
use crate::services::{Backend, ServiceResult};
use crate::tui::components::{
    ChartList, ChatPanel, DatasetPicker, DatasetSearch, HelpOverlay, InsightModal,
};
use crate::tui::{Action, Component, Focusable, KeyBindings, Theme};

/// Which pane receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Datasets,
    Chat,
    Charts,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Datasets => Focus::Chat,
            Focus::Chat => Focus::Charts,
            Focus::Charts => Focus::Datasets,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Datasets => Focus::Charts,
            Focus::Chat => Focus::Datasets,
            Focus::Charts => Focus::Chat,
        }
    }
}

/// Completion of a background service call
#[derive(Debug)]
pub enum AppEvent {
    DatasetsLoaded {
        request_id: RequestId,
        result: ServiceResult<DatasetPage>,
    },
    ChartGenerated {
        request_id: RequestId,
        result: ServiceResult<ChartOutcome>,
    },
    InsightGenerated {
        request_id: RequestId,
        result: ServiceResult<String>,
    },
}

#[derive(Debug, Clone)]
struct Status {
    text: String,
    is_error: bool,
}

/// Application state
///
/// Owns the widgets, routes keys to the focused one and runs their service
/// calls as tokio tasks. Results come back through `events` and are applied
/// by [`App::handle_app_event`] on the UI thread.
pub struct App {
    backend: Arc<dyn Backend>,
    events: UnboundedSender<AppEvent>,

    picker: DatasetPicker,
    chat: ChatPanel,
    charts: ChartList,
    insight: InsightModal,
    help: HelpOverlay,
    show_help: bool,

    focus: Focus,
    keybindings: KeyBindings,
    theme: Theme,
    status: Option<Status>,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: &Config,
        backend: Arc<dyn Backend>,
        charts: Vec<ChartMetadata>,
        events: UnboundedSender<AppEvent>,
    ) -> Result<Self> {
        let keybindings = match &config.ui.keybindings {
            Some(path) => KeyBindings::load_from_file(path)
                .wrap_err_with(|| format!("Failed to load keybindings from {}", path.display()))?,
            None => KeyBindings::default(),
        };
        for warning in keybindings.validate() {
            tracing::warn!("keybindings: {warning}");
        }

        let mut app = Self {
            backend,
            events,
            picker: DatasetPicker::new(config.ui.page_size),
            chat: ChatPanel::new(config.chat_context()),
            charts: ChartList::new(charts),
            insight: InsightModal::new(config.insight_texts()),
            help: HelpOverlay::new(&keybindings),
            show_help: false,
            focus: Focus::Datasets,
            keybindings,
            theme: Theme::by_name(&config.ui.theme),
            status: None,
            should_quit: false,
        };
        app.set_focus(Focus::Datasets);
        Ok(app)
    }

    /// Kick off the initial dataset listing
    pub fn start(&mut self) {
        let search = self.picker.refresh();
        self.spawn_search(search);
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn picker(&self) -> &DatasetPicker {
        &self.picker
    }

    pub fn chat(&self) -> &ChatPanel {
        &self.chat
    }

    pub fn insight(&self) -> &InsightModal {
        &self.insight
    }

    pub fn is_help_visible(&self) -> bool {
        self.show_help
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.picker.set_focused(focus == Focus::Datasets);
        self.chat.set_focused(focus == Focus::Chat);
        self.charts.set_focused(focus == Focus::Charts);
    }

    fn focused_mut(&mut self) -> &mut dyn Component {
        match self.focus {
            Focus::Datasets => &mut self.picker,
            Focus::Chat => &mut self.chat,
            Focus::Charts => &mut self.charts,
        }
    }

    /// Scope the chat to `key` and move focus to the prompt
    pub fn select_dataset(&mut self, key: DatasetKey) {
        tracing::info!(dataset = %key, "dataset selected");
        self.chat.select_dataset(key);
        self.set_focus(Focus::Chat);
    }

    /// Handle a key event
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        // Only handle key press events, ignore release/repeat
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        // Plain characters go to a text field first so typing never fires bindings
        if !self.insight.is_open() && !self.show_help {
            if let KeyCode::Char(c) = key.code {
                if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    && self.focused_mut().handle_char(c)
                {
                    self.flush_picker_request();
                    return Ok(());
                }
            }
        }

        if let Some(action) = self.keybindings.get_action(&key) {
            tracing::trace!(?action, "key mapped");
            self.handle_action(action)?;
        }
        Ok(())
    }

    /// Handle an action
    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        // Global actions
        match action {
            Action::Quit => {
                self.should_quit = true;
                return Ok(());
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                return Ok(());
            }
            Action::CopyChartUrl => {
                self.copy_chart_url();
                return Ok(());
            }
            _ => {}
        }

        if self.show_help {
            if action == Action::Cancel {
                self.show_help = false;
            } else {
                self.help.handle_action(action)?;
            }
            return Ok(());
        }

        if self.insight.is_open() {
            self.insight.handle_action(action)?;
            return Ok(());
        }

        match action {
            Action::FocusNext => self.set_focus(self.focus.next()),
            Action::FocusPrev => self.set_focus(self.focus.prev()),
            Action::Cancel => self.status = None,
            Action::Confirm => match self.focus {
                Focus::Datasets => {
                    if let Some(key) = self.picker.confirm() {
                        self.select_dataset(key);
                    }
                }
                Focus::Chat => {
                    if let Some(effect) = self.chat.send() {
                        self.spawn_chart(effect);
                    }
                }
                Focus::Charts => self.open_insight(),
            },
            Action::OpenInsight if self.focus == Focus::Charts => self.open_insight(),
            _ => {
                self.focused_mut().handle_action(action)?;
                self.flush_picker_request();
            }
        }
        Ok(())
    }

    /// Apply a background completion
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::DatasetsLoaded { request_id, result } => {
                self.picker.apply(request_id, result);
            }
            AppEvent::ChartGenerated { request_id, result } => {
                self.chat.apply_chart(request_id, result);
            }
            AppEvent::InsightGenerated { request_id, result } => {
                self.insight.apply(request_id, result);
            }
        }
    }

    /// Update app state (called on every tick)
    pub fn update(&mut self) -> Result<()> {
        self.insight.update()
    }

    fn open_insight(&mut self) {
        let Some(chart) = self.charts.selected().cloned() else {
            return;
        };
        if let Some(InsightEffect::FetchInsight {
            request_id,
            request,
        }) = self.insight.open(chart)
        {
            let backend = Arc::clone(&self.backend);
            let events = self.events.clone();
            tokio::spawn(async move {
                let result = backend.generate_insight(&request).await;
                deliver(&events, AppEvent::InsightGenerated { request_id, result });
            });
        }
    }

    fn flush_picker_request(&mut self) {
        if let Some(search) = self.picker.take_request() {
            self.spawn_search(search);
        }
    }

    fn spawn_search(&self, search: DatasetSearch) {
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.search_datasets(&search.query).await;
            deliver(
                &events,
                AppEvent::DatasetsLoaded {
                    request_id: search.request_id,
                    result,
                },
            );
        });
    }

    fn spawn_chart(&self, effect: ChatEffect) {
        let ChatEffect::GenerateChart {
            request_id,
            request,
        } = effect;
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.generate_chart(&request).await;
            deliver(&events, AppEvent::ChartGenerated { request_id, result });
        });
    }

    fn copy_chart_url(&mut self) {
        let Some(url) = self.chat.state().last_chart_url().map(str::to_string) else {
            self.set_status("No chart URL to copy yet", false);
            return;
        };
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(url.clone())) {
            Ok(()) => self.set_status(format!("Copied {url}"), false),
            Err(e) => {
                tracing::error!("Failed to copy to clipboard: {e}");
                self.set_status(format!("Clipboard unavailable: {e}"), true);
            }
        }
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(Status {
            text: text.into(),
            is_error,
        });
    }

    /// Render the app
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(45),
                Constraint::Percentage(25),
            ])
            .split(rows[0]);

        self.picker.render(frame, panes[0], &self.theme);
        self.chat.render(frame, panes[1], &self.theme);
        self.charts.render(frame, panes[2], &self.theme);
        self.render_status_bar(frame, rows[1]);

        if self.insight.is_open() {
            self.insight
                .render(frame, Self::centered_rect(70, 70, area), &self.theme);
        }
        if self.show_help {
            self.help
                .render(frame, Self::centered_rect(60, 80, area), &self.theme);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.status {
            Some(Status { text, is_error }) => {
                let style = if *is_error {
                    self.theme.error_style()
                } else {
                    self.theme.success_style()
                };
                Line::from(Span::styled(text.clone(), style))
            }
            None => {
                let hint = match self.focus {
                    Focus::Datasets => "Type to search  ↑↓ select  Enter choose",
                    Focus::Chat => "Type a prompt  Enter send  ↑↓ scroll",
                    Focus::Charts => "↑↓ select  Enter/i explain chart",
                };
                Line::from(vec![
                    Span::styled(hint, self.theme.muted_style()),
                    Span::styled("  Tab switch pane  F1 help  Ctrl+q quit", self.theme.muted_style()),
                ])
            }
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Helper to create centered rectangle
    fn centered_rect(percent_w: u16, percent_h: u16, area: Rect) -> Rect {
        let width = (u32::from(area.width) * u32::from(percent_w) / 100) as u16;
        let height = (u32::from(area.height) * u32::from(percent_h) / 100) as u16;
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

fn deliver(events: &UnboundedSender<AppEvent>, event: AppEvent) {
    if events.send(event).is_err() {
        tracing::debug!("event receiver dropped, discarding completion");
    }
}

//! Searchable, paginated dataset list.
//!
//! Each keystroke in the search box starts a new search from page 0. Only
//! the response to the most recent request is applied, so a slow reply to
//! an old search text can never overwrite newer results.

use color_eyre::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::core::{DatasetKey, DatasetOption, DatasetPage, DatasetQuery, RequestId};
use crate::services::ServiceResult;
use crate::tui::components::text_field::TextField;
use crate::tui::{Action, Component, Focusable, Theme};

pub const LOAD_FAILED_TEXT: &str = "Could not load datasets";

/// A search the app should run on the picker's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSearch {
    pub request_id: RequestId,
    pub query: DatasetQuery,
}

#[derive(Debug, Clone)]
struct PendingSearch {
    request_id: RequestId,
    page: u32,
}

pub struct DatasetPicker {
    search: TextField,
    options: Vec<DatasetOption>,
    total_count: u64,
    next_page: u32,
    page_size: u32,
    exhausted: bool,
    list_state: ListState,
    chosen: Option<DatasetKey>,
    pending: Option<PendingSearch>,
    queued: Option<DatasetSearch>,
    error: Option<String>,
    focused: bool,
}

impl DatasetPicker {
    pub fn new(page_size: u32) -> Self {
        Self {
            search: TextField::new(),
            options: Vec::new(),
            total_count: 0,
            next_page: 0,
            page_size: page_size.max(1),
            exhausted: false,
            list_state: ListState::default(),
            chosen: None,
            pending: None,
            queued: None,
            error: None,
            focused: false,
        }
    }

    pub fn search_text(&self) -> &str {
        self.search.value()
    }

    pub fn options(&self) -> &[DatasetOption] {
        &self.options
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn chosen(&self) -> Option<&DatasetKey> {
        self.chosen.as_ref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted && (self.options.len() as u64) < self.total_count
    }

    /// Start a search from page 0 for the current text, superseding any
    /// request still in flight
    pub fn refresh(&mut self) -> DatasetSearch {
        self.request_page(0)
    }

    fn request_page(&mut self, page: u32) -> DatasetSearch {
        let request_id = RequestId::new();
        let query = DatasetQuery::new(self.search.value().to_string(), page, self.page_size);
        tracing::debug!(%request_id, search = %query.search, page, "dataset search queued");
        self.pending = Some(PendingSearch { request_id, page });
        DatasetSearch { request_id, query }
    }

    /// Ask for the next page unless one is already loading
    pub fn load_more(&mut self) -> Option<DatasetSearch> {
        if self.pending.is_some() || !self.has_more() {
            return None;
        }
        Some(self.request_page(self.next_page))
    }

    /// The search triggered by the last edit or page request, if any
    pub fn take_request(&mut self) -> Option<DatasetSearch> {
        self.queued.take()
    }

    /// Apply a search response. Returns false when it was stale and dropped.
    pub fn apply(&mut self, request_id: RequestId, result: ServiceResult<DatasetPage>) -> bool {
        let Some(pending) = self.pending.as_ref().filter(|p| p.request_id == request_id) else {
            tracing::debug!(%request_id, "dropping stale dataset page");
            return false;
        };
        let page = pending.page;
        self.pending = None;

        match result {
            Ok(result) => {
                tracing::debug!(
                    %request_id,
                    page,
                    received = result.data.len(),
                    total = result.total_count,
                    "dataset page loaded"
                );
                self.error = None;
                self.exhausted = result.data.is_empty();
                if page == 0 {
                    self.options = result.data;
                } else {
                    self.options.extend(result.data);
                }
                self.total_count = result.total_count;
                self.next_page = page + 1;
                self.clamp_selection();
            }
            Err(err) => {
                tracing::warn!(%request_id, kind = err.kind(), error = %err, "dataset search failed");
                self.error = Some(LOAD_FAILED_TEXT.to_string());
                if page == 0 {
                    self.options.clear();
                    self.total_count = 0;
                    self.list_state.select(None);
                }
            }
        }
        true
    }

    fn clamp_selection(&mut self) {
        if self.options.is_empty() {
            self.list_state.select(None);
        } else {
            let idx = self.list_state.selected().unwrap_or(0).min(self.options.len() - 1);
            self.list_state.select(Some(idx));
        }
    }

    /// Choose the highlighted option. Returns its key for the chat widget.
    pub fn confirm(&mut self) -> Option<DatasetKey> {
        let option = self.options.get(self.list_state.selected()?)?;
        tracing::info!(dataset = %option.key, "dataset chosen");
        self.chosen = Some(option.key.clone());
        self.chosen.clone()
    }

    fn move_by(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() - 1;
        let current = self.list_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(last);
        self.list_state.select(Some(next));
        if next == last && delta > 0 {
            self.queued = self.load_more();
        }
    }

    fn on_search_edited(&mut self) {
        self.list_state.select(None);
        self.queued = Some(self.refresh());
    }
}

impl Component for DatasetPicker {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        let page = self.page_size as isize;
        match action {
            Action::MoveUp => self.move_by(-1),
            Action::MoveDown => self.move_by(1),
            Action::PageUp => self.move_by(-page),
            Action::PageDown => self.move_by(page),
            _ => {
                let (handled, changed) = self.search.apply(action);
                if changed {
                    self.on_search_edited();
                }
                return Ok(handled);
            }
        }
        Ok(true)
    }

    fn handle_char(&mut self, c: char) -> bool {
        self.search.insert_char(c);
        self.on_search_edited();
        true
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled("Datasets", theme.header_style()))
            .border_style(theme.pane_border_style(self.focused));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let search_line = self
            .search
            .to_line("Search: ", theme.normal_style(), self.focused);
        frame.render_widget(Paragraph::new(search_line), chunks[0]);

        let items: Vec<ListItem> = self
            .options
            .iter()
            .map(|option| {
                let marker = if self.chosen.as_ref() == Some(&option.key) { "● " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, theme.success_style()),
                    Span::styled(option.label.clone(), theme.normal_style()),
                    Span::styled(format!("  {}", option.datasource_type), theme.muted_style()),
                ]))
            })
            .collect();
        let list = List::new(items).highlight_style(theme.selected_style());
        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);

        let status = if let Some(err) = &self.error {
            Span::styled(err.clone(), theme.error_style())
        } else if self.pending.is_some() {
            Span::styled("Loading...", theme.info_style())
        } else if self.options.is_empty() {
            Span::styled("No datasets found", theme.muted_style())
        } else {
            let more = if self.has_more() { "  PgDn for more" } else { "" };
            Span::styled(
                format!("{} of {}{}", self.options.len(), self.total_count, more),
                theme.muted_style(),
            )
        };
        frame.render_widget(Paragraph::new(Line::from(status)), chunks[2]);
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
        "DatasetPicker"
    }
}

impl Focusable for DatasetPicker {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

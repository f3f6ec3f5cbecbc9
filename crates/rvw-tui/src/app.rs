//! Application state and logic for the TUI.

use ratatui::widgets::TableState;
use rvw_core::model::{Filters, Review};

use crate::loader::{LoadReply, LoadRequest, Loaded, Query};

/// Reviews per page in browse mode.
pub const PAGE_SIZE: i64 = 25;

/// Minimum-rating filter steps, cycled with `m`.
const MIN_RATING_STEPS: [Option<u8>; 5] = [None, Some(2), Some(3), Some(4), Some(5)];

/// Whether keys go to navigation or to the search prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

/// Messages for the Elm architecture update loop
#[derive(Debug, Clone)]
pub enum Message {
    /// Move selection by delta (negative = up, positive = down)
    MoveSelection(i32),
    JumpToTop,
    JumpToBottom,
    NextPage,
    PrevPage,
    ToggleSortDate,
    ToggleSortRating,
    CycleMinRating,
    /// Open the keyword prompt
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    SubmitSearch,
    /// Close the prompt without searching
    CancelSearch,
    /// Leave search results and return to browsing
    ClearSearch,
    ToggleDetail,
    ToggleHelp,
    /// Reload the current view from the store
    Refresh,
    Quit,
    /// A reply from the loader thread
    Loaded(LoadReply),
}

/// Application state
pub struct App {
    /// Rows currently shown
    pub reviews: Vec<Review>,
    pub table_state: TableState,

    /// 1-based page in browse mode
    pub page: i64,
    pub total: u64,
    pub total_pages: u64,

    pub sort_by_date: bool,
    pub sort_by_rating: bool,
    pub min_rating: Option<u8>,

    /// Active keyword search, replacing browse results when set
    pub search: Option<Vec<String>>,
    pub search_input: String,
    pub input_mode: InputMode,

    pub show_detail: bool,
    pub show_help: bool,
    pub should_quit: bool,

    /// Status message (shown in status bar)
    pub status_message: Option<String>,

    /// Bumped whenever the requested view changes; doubles as request id
    generation: u64,
    /// Id of the request the loader is working on
    in_flight: Option<u64>,
    /// The view changed and has not been requested yet
    dirty: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reviews: Vec::new(),
            table_state: TableState::default(),
            page: 1,
            total: 0,
            total_pages: 0,
            sort_by_date: false,
            sort_by_rating: false,
            min_rating: None,
            search: None,
            search_input: String::new(),
            input_mode: InputMode::Normal,
            show_detail: true,
            show_help: false,
            should_quit: false,
            status_message: Some("Loading...".to_string()),
            generation: 1,
            in_flight: None,
            dirty: true,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn selected_review(&self) -> Option<&Review> {
        self.table_state.selected().and_then(|i| self.reviews.get(i))
    }

    /// Filters for the current browse settings.
    pub fn filters(&self) -> Result<Filters, rvw_core::core::ValidationError> {
        Filters::builder()
            .min_rating(self.min_rating)
            .sort_by_date(self.sort_by_date)
            .sort_by_rating(self.sort_by_rating)
            .build()
    }

    /// The next request to send, if the view changed and the loader is idle.
    ///
    /// Only one request is outstanding at a time. Changes made while it runs
    /// are folded into a single follow-up request.
    pub fn take_request(&mut self) -> Option<LoadRequest> {
        if !self.dirty || self.in_flight.is_some() {
            return None;
        }
        let query = match &self.search {
            Some(keywords) => Query::Search {
                keywords: keywords.clone(),
            },
            None => match self.filters() {
                Ok(filters) => Query::Browse {
                    filters,
                    page: self.page,
                    page_size: PAGE_SIZE,
                },
                Err(e) => {
                    self.dirty = false;
                    self.status_message = Some(format!("Invalid filter: {e}"));
                    return None;
                }
            },
        };
        self.dirty = false;
        self.in_flight = Some(self.generation);
        Some(LoadRequest {
            id: self.generation,
            query,
        })
    }

    /// Mark the view as changed so it is re-requested.
    fn invalidate(&mut self) {
        self.generation += 1;
        self.dirty = true;
    }

    fn apply_reply(&mut self, reply: LoadReply) {
        if self.in_flight == Some(reply.id) {
            self.in_flight = None;
        }
        if reply.id != self.generation {
            tracing::debug!(id = reply.id, current = self.generation, "dropping stale reply");
            return;
        }

        match reply.result {
            Ok(Loaded::Page(page)) => {
                self.total = page.total;
                self.total_pages = page.total_pages;
                self.set_rows(page.reviews);
                self.status_message = None;
            }
            Ok(Loaded::Search(reviews)) => {
                self.total = reviews.len() as u64;
                self.total_pages = u64::from(!reviews.is_empty());
                self.set_rows(reviews);
                self.status_message = None;
            }
            Err(e) => {
                self.status_message = Some(format!("Load failed: {e}"));
            }
        }
    }

    fn set_rows(&mut self, reviews: Vec<Review>) {
        let selected = self
            .table_state
            .selected()
            .filter(|_| !reviews.is_empty())
            .map(|i| i.min(reviews.len() - 1))
            .or_else(|| (!reviews.is_empty()).then_some(0));
        self.reviews = reviews;
        self.table_state.select(selected);
    }

    fn move_selection(&mut self, delta: i32) {
        if self.reviews.is_empty() {
            return;
        }
        let last = self.reviews.len() - 1;
        let current = self.table_state.selected().unwrap_or(0);
        let magnitude = delta.unsigned_abs() as usize;
        let next = if delta < 0 {
            current.saturating_sub(magnitude)
        } else {
            current.saturating_add(magnitude).min(last)
        };
        self.table_state.select(Some(next));
    }

    fn set_page(&mut self, page: i64) {
        self.page = page;
        self.table_state.select(Some(0));
        self.invalidate();
    }
}

/// Update the model based on a message (Elm architecture)
pub fn update(app: &mut App, message: Message) -> Option<Message> {
    // Help overlay takes priority
    if app.show_help && !matches!(message, Message::Loaded(_)) {
        if let Message::ToggleHelp = message {
            app.show_help = false;
        }
        return None;
    }

    match message {
        Message::ToggleHelp => app.show_help = true,
        Message::Quit => app.should_quit = true,
        Message::Refresh => {
            app.invalidate();
            app.status_message = Some("Refreshing...".to_string());
        }
        Message::MoveSelection(delta) => app.move_selection(delta),
        Message::JumpToTop => {
            if !app.reviews.is_empty() {
                app.table_state.select(Some(0));
            }
        }
        Message::JumpToBottom => {
            if !app.reviews.is_empty() {
                app.table_state.select(Some(app.reviews.len() - 1));
            }
        }
        Message::NextPage => {
            if app.search.is_none() && app.page.unsigned_abs() < app.total_pages {
                app.set_page(app.page + 1);
            }
        }
        Message::PrevPage => {
            if app.search.is_none() && app.page > 1 {
                app.set_page(app.page - 1);
            }
        }
        Message::ToggleSortDate => {
            app.sort_by_date = !app.sort_by_date;
            app.set_page(1);
        }
        Message::ToggleSortRating => {
            app.sort_by_rating = !app.sort_by_rating;
            app.set_page(1);
        }
        Message::CycleMinRating => {
            let index = MIN_RATING_STEPS
                .iter()
                .position(|step| *step == app.min_rating)
                .unwrap_or(0);
            app.min_rating = MIN_RATING_STEPS[(index + 1) % MIN_RATING_STEPS.len()];
            app.set_page(1);
        }
        Message::StartSearch => {
            app.input_mode = InputMode::Search;
            app.search_input = app.search.as_ref().map(|k| k.join(" ")).unwrap_or_default();
        }
        Message::SearchInput(c) => app.search_input.push(c),
        Message::SearchBackspace => {
            app.search_input.pop();
        }
        Message::SubmitSearch => {
            app.input_mode = InputMode::Normal;
            let keywords: Vec<String> =
                app.search_input.split_whitespace().map(str::to_string).collect();
            if keywords.is_empty() {
                return Some(Message::ClearSearch);
            }
            app.search = Some(keywords);
            app.table_state.select(Some(0));
            app.invalidate();
        }
        Message::CancelSearch => app.input_mode = InputMode::Normal,
        Message::ClearSearch => {
            if app.search.take().is_some() {
                app.set_page(1);
            }
        }
        Message::ToggleDetail => app.show_detail = !app.show_detail,
        Message::Loaded(reply) => app.apply_reply(reply),
    }
    None
}

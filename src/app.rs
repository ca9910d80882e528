//! App state and navigation controller
//!
//! Owns the view stack, routes input to the active view, and coordinates the
//! directory, feed, fetch and playback components. The controller never
//! performs I/O: it queues [`Request`]s for the event loop and receives the
//! results back as [`AppEvent`]s on the same loop that handles input.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempPath;
use uuid::Uuid;

use crate::api::{DirectoryError, FeedError};
use crate::models::{Episode, ListEntry, Show, TransportState};
use crate::playback::fetch::discard;
use crate::playback::{FetchError, FetchOrder, PlaybackEngine, PlaybackSession, SessionError};

// =============================================================================
// Input Mode
// =============================================================================

/// Current input mode for keyboard handling
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Text input mode (search box focused)
    Editing,
}

// =============================================================================
// Loading State
// =============================================================================

/// Loading state for async operations
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    /// Loading with optional message
    Loading(Option<String>),
    /// Error with message
    Error(String),
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadingState::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            LoadingState::Loading(Some(msg)) => Some(msg),
            LoadingState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

// =============================================================================
// List Selection
// =============================================================================

/// Selection state for a list widget
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    pub selected: usize,
    pub len: usize,
}

impl ListState {
    pub fn new(len: usize) -> Self {
        Self { selected: 0, len }
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.selected + 1 < self.len {
            self.selected += 1;
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
    }

    pub fn page_down(&mut self, page_size: usize) {
        if self.len > 0 {
            self.selected = (self.selected + page_size).min(self.len - 1);
        }
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        self.selected = self.len.saturating_sub(1);
    }

    /// Update length when new items arrive, clamping the selection
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Apply a navigation key; returns false for keys that are not navigation
    pub fn navigate(&mut self, code: KeyCode) -> bool {
        const PAGE: usize = 10;
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.up(),
            KeyCode::Down | KeyCode::Char('j') => self.down(),
            KeyCode::PageUp => self.page_up(PAGE),
            KeyCode::PageDown => self.page_down(PAGE),
            KeyCode::Home | KeyCode::Char('g') => self.first(),
            KeyCode::End | KeyCode::Char('G') => self.last(),
            _ => return false,
        }
        true
    }
}

// =============================================================================
// View-Specific State
// =============================================================================

/// Search box and show results (the root view)
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    /// Cursor position in characters
    pub cursor: usize,
    pub results: Vec<Show>,
    pub list: ListState,
    pub loading: LoadingState,
}

impl SearchState {
    fn byte_index(&self, char_index: usize) -> usize {
        self.query
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.query.len())
    }

    fn char_len(&self) -> usize {
        self.query.chars().count()
    }

    /// Insert character at cursor
    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.query.insert(at, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.query.remove(at);
        }
    }

    /// Delete character at cursor
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.query.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Replace results wholesale; a new result set supersedes the old one
    pub fn set_results(&mut self, results: Vec<Show>) {
        self.list = ListState::new(results.len());
        self.results = results;
        self.loading = LoadingState::Idle;
    }

    pub fn selected_show(&self) -> Option<&Show> {
        self.results.get(self.list.selected)
    }

    /// Query text split at the cursor, for rendering
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.query.split_at(self.byte_index(self.cursor))
    }
}

/// Root view: search box plus show list
#[derive(Debug, Clone, Default)]
pub struct ShowsView {
    pub search: SearchState,
}

/// Episodes of one show
#[derive(Debug, Clone)]
pub struct EpisodesView {
    /// Routes feed results back to this view
    pub id: u64,
    pub show: Show,
    pub list: ListState,
    pub loading: LoadingState,
}

impl EpisodesView {
    pub fn selected_episode(&self) -> Option<&Episode> {
        self.show.episodes.get(self.list.selected)
    }
}

/// Buttons on the episode detail view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailButton {
    #[default]
    Play,
    PauseResume,
    Stop,
    Back,
}

impl DetailButton {
    pub const ALL: [DetailButton; 4] = [
        DetailButton::Play,
        DetailButton::PauseResume,
        DetailButton::Stop,
        DetailButton::Back,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self, state: TransportState) -> &'static str {
        match self {
            DetailButton::Play => "▶ Play",
            DetailButton::PauseResume if state == TransportState::Paused => "⏵ Resume",
            DetailButton::PauseResume => "⏸ Pause",
            DetailButton::Stop => "■ Stop",
            DetailButton::Back => "← Back",
        }
    }
}

/// Episode detail and player
#[derive(Debug)]
pub struct DetailView {
    pub show_title: String,
    pub session: PlaybackSession,
    pub focus: DetailButton,
}

/// A view pushed above the root show list
#[derive(Debug)]
pub enum View {
    Episodes(EpisodesView),
    Detail(DetailView),
}

/// Which view currently receives input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Shows,
    Episodes,
    Detail,
}

impl ViewKind {
    pub fn label(&self) -> &'static str {
        match self {
            ViewKind::Shows => "SHOWS",
            ViewKind::Episodes => "EPISODES",
            ViewKind::Detail => "PLAYER",
        }
    }
}

// =============================================================================
// View Stack
// =============================================================================

/// Ordered views; the show list is the permanent root, the last pushed view
/// is the only one that receives input.
#[derive(Debug, Default)]
pub struct ViewStack {
    root: ShowsView,
    pushed: Vec<View>,
}

impl ViewStack {
    pub fn root(&self) -> &ShowsView {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut ShowsView {
        &mut self.root
    }

    /// Top pushed view, `None` when the root is active
    pub fn top(&self) -> Option<&View> {
        self.pushed.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut View> {
        self.pushed.last_mut()
    }

    pub fn active(&self) -> ViewKind {
        match self.top() {
            None => ViewKind::Shows,
            Some(View::Episodes(_)) => ViewKind::Episodes,
            Some(View::Detail(_)) => ViewKind::Detail,
        }
    }

    pub fn depth(&self) -> usize {
        1 + self.pushed.len()
    }

    pub fn push(&mut self, view: View) {
        self.pushed.push(view);
    }

    /// Remove the top view; the root can never be popped
    pub fn pop(&mut self) -> Option<View> {
        self.pushed.pop()
    }

    pub fn episodes_mut(&mut self, id: u64) -> Option<&mut EpisodesView> {
        self.pushed.iter_mut().find_map(|view| match view {
            View::Episodes(episodes) if episodes.id == id => Some(episodes),
            _ => None,
        })
    }

    pub fn detail_mut(&mut self, session_id: Uuid) -> Option<&mut DetailView> {
        self.pushed.iter_mut().find_map(|view| match view {
            View::Detail(detail) if detail.session.id() == session_id => Some(detail),
            _ => None,
        })
    }

    /// Highlighted row of the active list, tagged with its kind
    pub fn selected_entry(&self) -> Option<ListEntry<'_>> {
        match self.top() {
            None => self.root.search.selected_show().map(ListEntry::Show),
            Some(View::Episodes(view)) => view.selected_episode().map(ListEntry::Episode),
            Some(View::Detail(_)) => None,
        }
    }
}

// =============================================================================
// Requests & Events
// =============================================================================

/// Work the controller asks the event loop to run off the input path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Search { generation: u64, query: String },
    LoadEpisodes { view_id: u64, feed_url: String },
    Fetch(FetchOrder),
    CancelFetch { session_id: Uuid },
}

/// Results delivered back to the controller
#[derive(Debug)]
pub enum AppEvent {
    SearchFinished {
        generation: u64,
        result: Result<Vec<Show>, DirectoryError>,
    },
    EpisodesLoaded {
        view_id: u64,
        result: Result<Vec<Episode>, FeedError>,
    },
    FetchFinished {
        session_id: Uuid,
        result: Result<TempPath, FetchError>,
    },
}

// =============================================================================
// Main Application State
// =============================================================================

/// Main application state
#[derive(Debug)]
pub struct App {
    /// Whether the app is running
    pub running: bool,
    pub input_mode: InputMode,
    /// Error popup, cleared by the next key press
    pub error: Option<String>,

    views: ViewStack,
    engine: PlaybackEngine,
    requests: Vec<Request>,
    search_generation: u64,
    next_view_id: u64,
}

impl App {
    pub fn new(engine: PlaybackEngine) -> Self {
        Self {
            running: true,
            input_mode: InputMode::Normal,
            error: None,
            views: ViewStack::default(),
            engine,
            requests: Vec::new(),
            search_generation: 0,
            next_view_id: 0,
        }
    }

    pub fn views(&self) -> &ViewStack {
        &self.views
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    /// Session of the detail view, if one is open
    pub fn session(&self) -> Option<&PlaybackSession> {
        match self.views.top() {
            Some(View::Detail(detail)) => Some(&detail.session),
            _ => None,
        }
    }

    /// Drain the queued requests
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::warn!(error = %msg, "shown to user");
        self.error = Some(msg);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Tear down every pushed view (stopping audio) and stop the loop
    pub fn quit(&mut self) {
        while let Some(view) = self.views.pop() {
            self.close_view(view);
        }
        self.running = false;
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Push a view; it receives all input from now on
    pub fn push_view(&mut self, view: View) {
        self.views.push(view);
        self.input_mode = InputMode::Normal;
        tracing::debug!(active = self.views.active().label(), depth = self.views.depth(), "view pushed");
    }

    /// Go back: leave editing first, otherwise pop the top view
    pub fn back(&mut self) -> bool {
        if self.input_mode == InputMode::Editing {
            self.input_mode = InputMode::Normal;
            return true;
        }

        match self.views.pop() {
            Some(view) => {
                self.close_view(view);
                tracing::debug!(active = self.views.active().label(), depth = self.views.depth(), "view popped");
                true
            }
            None => false,
        }
    }

    /// Release whatever a popped view owned before it goes away
    fn close_view(&mut self, view: View) {
        if let View::Detail(detail) = view {
            if detail.session.is_fetching() {
                self.requests.push(Request::CancelFetch {
                    session_id: detail.session.id(),
                });
            }
            detail.session.teardown(&mut self.engine);
        }
        self.input_mode = InputMode::Normal;
    }

    /// Focus search input (show list only)
    pub fn focus_search(&mut self) {
        if self.views.active() == ViewKind::Shows {
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn submit_search(&mut self) {
        self.input_mode = InputMode::Normal;
        // Any search still in flight is superseded
        self.search_generation += 1;

        let search = &mut self.views.root_mut().search;
        let query = search.query.trim().to_string();
        if query.is_empty() {
            search.set_results(Vec::new());
            return;
        }

        tracing::info!(query = %query, "search submitted");
        search.loading = LoadingState::Loading(Some(format!("Searching for \"{}\"...", query)));
        self.requests.push(Request::Search {
            generation: self.search_generation,
            query,
        });
    }

    /// Dispatch the highlighted row by its kind
    pub fn activate_selection(&mut self) -> bool {
        let Some(entry) = self.views.selected_entry() else {
            return false;
        };

        match entry {
            ListEntry::Show(show) => {
                let show = show.clone();
                self.open_show(show);
            }
            ListEntry::Episode(episode) => {
                let episode = episode.clone();
                self.open_episode(episode);
            }
        }
        true
    }

    fn open_show(&mut self, show: Show) {
        self.next_view_id += 1;
        let view_id = self.next_view_id;
        tracing::info!(show = %show.title, "show selected");

        self.requests.push(Request::LoadEpisodes {
            view_id,
            feed_url: show.feed_url.clone(),
        });
        self.push_view(View::Episodes(EpisodesView {
            id: view_id,
            show,
            list: ListState::new(0),
            loading: LoadingState::Loading(Some("Loading episodes...".into())),
        }));
    }

    fn open_episode(&mut self, episode: Episode) {
        let show_title = match self.views.top() {
            Some(View::Episodes(view)) => view.show.title.clone(),
            _ => String::new(),
        };
        tracing::info!(episode = %episode.title, "episode selected");

        self.push_view(View::Detail(DetailView {
            show_title,
            session: PlaybackSession::new(episode),
            focus: DetailButton::default(),
        }));
    }

    /// Reload the active episode list; old episodes stay until the new ones arrive
    pub fn refresh_episodes(&mut self) -> bool {
        let Some(View::Episodes(view)) = self.views.top_mut() else {
            return false;
        };
        view.loading = LoadingState::Loading(Some("Refreshing episodes...".into()));
        self.requests.push(Request::LoadEpisodes {
            view_id: view.id,
            feed_url: view.show.feed_url.clone(),
        });
        true
    }

    // -------------------------------------------------------------------------
    // Transport Controls
    // -------------------------------------------------------------------------

    fn apply_session_outcome(&mut self, outcome: Result<Option<FetchOrder>, SessionError>) {
        match outcome {
            Ok(Some(order)) => self.requests.push(Request::Fetch(order)),
            Ok(None) => {}
            Err(e) => self.set_error(e.to_string()),
        }
    }

    pub fn play(&mut self) {
        let Some(View::Detail(detail)) = self.views.top_mut() else {
            return;
        };
        let outcome = detail.session.play(&mut self.engine);
        self.apply_session_outcome(outcome);
    }

    /// Space bar: pause when playing, otherwise play
    pub fn toggle_playback(&mut self) {
        let Some(View::Detail(detail)) = self.views.top_mut() else {
            return;
        };
        let outcome = detail.session.toggle(&mut self.engine);
        self.apply_session_outcome(outcome);
    }

    /// Pause/Resume button: only acts on a loaded episode
    pub fn pause_or_resume(&mut self) {
        let Some(View::Detail(detail)) = self.views.top_mut() else {
            return;
        };
        let outcome = match detail.session.state() {
            TransportState::Playing => detail.session.pause(&mut self.engine),
            TransportState::Paused => detail.session.resume(&mut self.engine),
            _ => Ok(()),
        };
        self.apply_session_outcome(outcome.map(|()| None));
    }

    pub fn stop(&mut self) {
        if let Some(View::Detail(detail)) = self.views.top_mut() {
            detail.session.stop(&mut self.engine);
        }
    }

    fn activate_button(&mut self, button: DetailButton) {
        match button {
            DetailButton::Play => self.play(),
            DetailButton::PauseResume => self.pause_or_resume(),
            DetailButton::Stop => self.stop(),
            DetailButton::Back => {
                self.back();
            }
        }
    }

    /// Timer hook, called from the event loop
    pub fn tick(&mut self) {
        if let Some(View::Detail(detail)) = self.views.top_mut() {
            detail.session.tick(&mut self.engine);
        }
    }

    // -------------------------------------------------------------------------
    // Background Results
    // -------------------------------------------------------------------------

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SearchFinished { generation, result } => {
                self.on_search_finished(generation, result)
            }
            AppEvent::EpisodesLoaded { view_id, result } => self.on_episodes_loaded(view_id, result),
            AppEvent::FetchFinished { session_id, result } => {
                self.on_fetch_finished(session_id, result)
            }
        }
    }

    fn on_search_finished(&mut self, generation: u64, result: Result<Vec<Show>, DirectoryError>) {
        if generation != self.search_generation {
            tracing::debug!(generation, current = self.search_generation, "stale search result dropped");
            return;
        }

        let search = &mut self.views.root_mut().search;
        match result {
            Ok(shows) => search.set_results(shows),
            Err(e) => {
                let msg = format!("Search failed: {}", e);
                search.loading = LoadingState::Error(msg.clone());
                self.set_error(msg);
            }
        }
    }

    fn on_episodes_loaded(&mut self, view_id: u64, result: Result<Vec<Episode>, FeedError>) {
        let Some(view) = self.views.episodes_mut(view_id) else {
            tracing::debug!(view_id, "episodes for a closed view dropped");
            return;
        };

        match result {
            Ok(episodes) => {
                view.list.set_len(episodes.len());
                view.show.replace_episodes(episodes);
                view.loading = LoadingState::Idle;
            }
            Err(e) => {
                // The previous list, if any, stays visible
                let msg = format!("Episode load failed: {}", e);
                view.loading = LoadingState::Error(msg.clone());
                self.set_error(msg);
            }
        }
    }

    fn on_fetch_finished(&mut self, session_id: Uuid, result: Result<TempPath, FetchError>) {
        let Some(detail) = self.views.detail_mut(session_id) else {
            tracing::debug!(%session_id, "fetch result for a closed session dropped");
            if let Ok(path) = result {
                discard(path);
            }
            return;
        };

        if let Err(e) = detail.session.fetch_completed(result, &mut self.engine) {
            self.set_error(e.to_string());
        }
    }

    // -------------------------------------------------------------------------
    // Keyboard Event Handling
    // -------------------------------------------------------------------------

    /// Handle keyboard event, returns true if event was consumed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        self.clear_error();

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return true;
        }

        // Editing belongs to the show list; never let it outlive a push
        if self.input_mode == InputMode::Editing && self.views.active() != ViewKind::Shows {
            self.input_mode = InputMode::Normal;
        }

        if self.input_mode == InputMode::Editing {
            self.handle_editing_key(key)
        } else {
            self.handle_normal_key(key)
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> bool {
        let search = &mut self.views.root_mut().search;
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => self.submit_search(),
            KeyCode::Char(c) => search.insert(c),
            KeyCode::Backspace => search.backspace(),
            KeyCode::Delete => search.delete(),
            KeyCode::Left => search.cursor_left(),
            KeyCode::Right => search.cursor_right(),
            KeyCode::Home => search.cursor_home(),
            KeyCode::End => search.cursor_end(),
            _ => return false,
        }
        true
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return true;
            }
            KeyCode::Esc => return self.back(),
            _ => {}
        }

        // Routing follows the stack top, recomputed on every key
        match self.views.active() {
            ViewKind::Shows => self.handle_shows_key(key),
            ViewKind::Episodes => self.handle_episodes_key(key),
            ViewKind::Detail => self.handle_detail_key(key),
        }
    }

    fn handle_shows_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('/') | KeyCode::Char('i') => {
                self.focus_search();
                true
            }
            KeyCode::Enter => self.activate_selection(),
            code => self.views.root_mut().search.list.navigate(code),
        }
    }

    fn handle_episodes_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => self.activate_selection(),
            KeyCode::Char('r') => self.refresh_episodes(),
            KeyCode::Char('b') | KeyCode::Backspace => self.back(),
            code => match self.views.top_mut() {
                Some(View::Episodes(view)) => view.list.navigate(code),
                _ => false,
            },
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('p') => self.play(),
            KeyCode::Char(' ') => self.toggle_playback(),
            KeyCode::Char('s') => self.stop(),
            KeyCode::Char('b') | KeyCode::Backspace => {
                self.back();
            }
            KeyCode::Enter => {
                if let Some(View::Detail(detail)) = self.views.top() {
                    let focus = detail.focus;
                    self.activate_button(focus);
                }
            }
            KeyCode::Left | KeyCode::BackTab | KeyCode::Right | KeyCode::Tab => {
                if let Some(View::Detail(detail)) = self.views.top_mut() {
                    detail.focus = match key.code {
                        KeyCode::Left | KeyCode::BackTab => detail.focus.prev(),
                        _ => detail.focus.next(),
                    };
                }
            }
            _ => return false,
        }
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

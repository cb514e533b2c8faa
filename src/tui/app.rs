//! Application state and event loop

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    DefaultTerminal, Frame,
};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::services::{
    AuthSession, Capabilities, EntryScope, FetchSequencer, FetchTicket, FileStore, HttpApi,
    MilkApi, StatsAggregator,
};
use crate::types::{DashboardStats, MilkEntry, Result, TimeRange, User};

use super::theme::Theme;
use super::widgets::{
    centered,
    confirm::{ConfirmPopup, ConfirmState, DeleteTarget},
    daily::{DailySeries, DailyView},
    dashboard::DashboardView,
    entries::EntriesView,
    help::HelpPopup,
    render_separator, scroll_to,
    spinner::{LoadingStage, Spinner},
    tabs::{Tab, TabBar},
    users::UsersView,
    VISIBLE_ROWS,
};

/// Application state
pub enum AppState {
    /// Loading data with spinner animation
    Loading {
        spinner_frame: usize,
        stage: LoadingStage,
    },
    /// Ready with loaded data
    Ready { data: Box<AppData> },
    /// Error state
    Error { message: String },
}

/// Loaded application data
#[derive(Debug, Clone)]
pub struct AppData {
    /// Entries newest first
    pub entries: Vec<MilkEntry>,
    /// Empty unless the session may manage users
    pub users: Vec<User>,
    pub user_count: Option<u64>,
    pub stats: DashboardStats,
    /// Daily tab series for the selected range
    pub series: DailySeries,
}

/// Work the event loop hands to a background thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Reload,
    Delete(DeleteTarget),
}

/// Selection and scroll position of one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ListPosition {
    selected: usize,
    scroll: usize,
}

impl ListPosition {
    fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.scroll = scroll_to(self.selected, self.scroll, VISIBLE_ROWS);
    }

    fn down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
        self.scroll = scroll_to(self.selected, self.scroll, VISIBLE_ROWS);
    }

    /// Keep the position valid after the list changed length
    fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
        self.scroll = scroll_to(
            self.selected,
            self.scroll.min(len.saturating_sub(VISIBLE_ROWS)),
            VISIBLE_ROWS,
        );
    }
}

/// Main application
pub struct App {
    state: AppState,
    should_quit: bool,
    caps: Capabilities,
    own_id: i64,
    tabs: &'static [Tab],
    current_tab: Tab,
    range: TimeRange,
    daily: ListPosition,
    entries: ListPosition,
    users: ListPosition,
    show_help: bool,
    confirm: Option<ConfirmState>,
    pending: Option<Action>,
    /// Outcome of the last action, shown in the footer
    notice: Option<String>,
    theme: Theme,
}

impl App {
    /// Create a new app in loading state
    pub fn new(caps: Capabilities, own_id: i64, theme: Theme) -> Self {
        Self {
            state: AppState::Loading {
                spinner_frame: 0,
                stage: LoadingStage::Fetching,
            },
            should_quit: false,
            caps,
            own_id,
            tabs: Tab::visible(caps),
            current_tab: Tab::default(),
            range: TimeRange::default(),
            daily: ListPosition::default(),
            entries: ListPosition::default(),
            users: ListPosition::default(),
            show_help: false,
            confirm: None,
            pending: None,
            notice: None,
            theme,
        }
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.confirm.is_some() {
            self.handle_confirm_key(key.code);
            return;
        }
        if self.show_help && matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.request(Action::Reload);
            }
            KeyCode::Char('t') if !self.is_deleting() => {
                self.range = self.range.next();
                self.daily = ListPosition::default();
                self.request(Action::Reload);
            }
            KeyCode::Tab => {
                self.current_tab = self.current_tab.next(self.tabs);
            }
            KeyCode::BackTab => {
                self.current_tab = self.current_tab.prev(self.tabs);
            }
            KeyCode::Char(c @ '1'..='9') => {
                if let Some(tab) = Tab::from_number(c as u8 - b'0', self.tabs) {
                    self.current_tab = tab;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(position) = self.active_position_mut() {
                    position.up();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.active_len();
                if let Some(position) = self.active_position_mut() {
                    position.down(len);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                self.ask_delete();
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        let Some(confirm) = self.confirm.as_mut() else {
            return;
        };
        match code {
            KeyCode::Left
            | KeyCode::Right
            | KeyCode::Char('h')
            | KeyCode::Char('l')
            | KeyCode::Tab => confirm.toggle(),
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let target = confirm.target;
                self.confirm = None;
                self.request(Action::Delete(target));
            }
            KeyCode::Enter => {
                let chosen = confirm.is_yes().then_some(confirm.target);
                self.confirm = None;
                if let Some(target) = chosen {
                    self.request(Action::Delete(target));
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm = None;
            }
            _ => {}
        }
    }

    /// Queue an action for the event loop. Nothing is queued while a delete
    /// is in flight, and deletes need loaded data.
    fn request(&mut self, action: Action) {
        if self.is_deleting() {
            return;
        }
        if matches!(action, Action::Delete(_)) && !matches!(self.state, AppState::Ready { .. }) {
            return;
        }
        self.pending = Some(action);
    }

    fn is_deleting(&self) -> bool {
        matches!(
            self.state,
            AppState::Loading {
                stage: LoadingStage::Deleting,
                ..
            }
        )
    }

    /// Take the queued action, switching to the loading screen
    pub fn take_action(&mut self) -> Option<Action> {
        let action = self.pending.take()?;
        let stage = match (action, &self.state) {
            (Action::Delete(_), _) => LoadingStage::Deleting,
            (Action::Reload, AppState::Ready { .. }) => LoadingStage::Refreshing,
            (Action::Reload, _) => LoadingStage::Fetching,
        };
        self.notice = None;
        self.state = AppState::Loading {
            spinner_frame: 0,
            stage,
        };
        Some(action)
    }

    fn ask_delete(&mut self) {
        let AppState::Ready { data } = &self.state else {
            return;
        };
        let confirm = match self.current_tab {
            Tab::Entries if self.caps.can_modify_entries => data
                .entries
                .get(self.entries.selected)
                .and_then(|entry| {
                    let id = entry.id?;
                    Some(ConfirmState::new(
                        DeleteTarget::Entry(id),
                        format!("entry #{} ({})", id, entry.milk_type),
                    ))
                }),
            Tab::Users if self.caps.can_manage_users => {
                match data.users.get(self.users.selected) {
                    Some(user) if user.id == self.own_id => {
                        self.notice = Some("You cannot delete your own account".to_string());
                        None
                    }
                    Some(user) => Some(ConfirmState::new(
                        DeleteTarget::User(user.id),
                        format!("user {}", user.username),
                    )),
                    None => None,
                }
            }
            _ => None,
        };
        if confirm.is_some() {
            self.confirm = confirm;
        }
    }

    fn active_len(&self) -> usize {
        let AppState::Ready { data } = &self.state else {
            return 0;
        };
        match self.current_tab {
            Tab::Daily => data.series.rows.len(),
            Tab::Entries => data.entries.len(),
            Tab::Users => data.users.len(),
            Tab::Dashboard => 0,
        }
    }

    fn active_position_mut(&mut self) -> Option<&mut ListPosition> {
        match self.current_tab {
            Tab::Daily => Some(&mut self.daily),
            Tab::Entries => Some(&mut self.entries),
            Tab::Users => Some(&mut self.users),
            Tab::Dashboard => None,
        }
    }

    /// Apply a finished background job
    pub fn apply_result(&mut self, result: Result<Box<AppData>>, notice: Option<String>) {
        match result {
            Ok(data) => {
                self.daily.clamp(data.series.rows.len());
                self.entries.clamp(data.entries.len());
                self.users.clamp(data.users.len());
                self.state = AppState::Ready { data };
                self.notice = notice;
            }
            Err(e) if e.is_auth_failure() => {
                self.state = AppState::Error {
                    message: format!("{}. Run `milktrack login` to sign in again.", e),
                };
            }
            Err(e) => {
                self.state = AppState::Error {
                    message: e.to_string(),
                };
            }
        }
    }

    /// Update spinner animation
    pub fn tick(&mut self) {
        if let AppState::Loading {
            spinner_frame,
            stage,
        } = &self.state
        {
            self.state = AppState::Loading {
                spinner_frame: Spinner::next_frame(*spinner_frame),
                stage: *stage,
            };
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Draw the application
    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.state {
            AppState::Loading {
                spinner_frame,
                stage,
            } => {
                Spinner::new(*spinner_frame, *stage, self.theme).render(area, buf);
            }
            AppState::Ready { data } => {
                let chunks = Layout::vertical([
                    Constraint::Length(1), // Top padding
                    Constraint::Length(1), // Tabs
                    Constraint::Length(1), // Separator
                    Constraint::Min(0),    // View
                    Constraint::Length(1), // Separator
                    Constraint::Length(1), // Keybindings / notice
                ])
                .split(centered(area));

                TabBar::new(self.tabs, self.current_tab, self.theme).render(chunks[1], buf);
                render_separator(chunks[2], buf, self.theme);
                self.render_view(data, chunks[3], buf);
                render_separator(chunks[4], buf, self.theme);
                self.render_footer(chunks[5], buf);

                if self.show_help {
                    let help = HelpPopup::new(self.theme)
                        .with_delete(self.caps.can_modify_entries || self.caps.can_manage_users);
                    let help_area = help.area(area);
                    help.render(help_area, buf);
                }
                if let Some(confirm) = &self.confirm {
                    ConfirmPopup::new(confirm, self.theme)
                        .render(ConfirmPopup::centered_area(area), buf);
                }
            }
            AppState::Error { message } => {
                let y = area.y + area.height / 2;
                let lines = vec![
                    Line::from(Span::styled(
                        format!("Error: {}", message),
                        Style::default().fg(self.theme.error()),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "r: Retry  q: Quit",
                        Style::default().fg(self.theme.muted()),
                    )),
                ];
                Paragraph::new(lines).alignment(Alignment::Center).render(
                    Rect {
                        y,
                        height: area.height.saturating_sub(y - area.y),
                        ..area
                    },
                    buf,
                );
            }
        }
    }
}

impl App {
    fn render_view(&self, data: &AppData, area: Rect, buf: &mut Buffer) {
        match self.current_tab {
            Tab::Dashboard => DashboardView::new(&data.stats, self.range, self.theme)
                .with_user_count(data.user_count)
                .render(area, buf),
            Tab::Daily => DailyView::new(&data.series, self.range, self.daily.scroll, self.theme)
                .with_selected_index(Some(self.daily.selected))
                .render(area, buf),
            Tab::Entries => EntriesView::new(&data.entries, self.entries.scroll, self.theme)
                .with_selected_index(Some(self.entries.selected))
                .with_owner(self.caps.can_view_all_entries)
                .render(area, buf),
            Tab::Users => UsersView::new(&data.users, self.users.scroll, self.own_id, self.theme)
                .with_selected_index(Some(self.users.selected))
                .render(area, buf),
        }
    }

    fn render_footer(&self, area: Rect, buf: &mut Buffer) {
        if let Some(notice) = &self.notice {
            Paragraph::new(Line::from(Span::styled(
                notice.as_str(),
                Style::default()
                    .fg(self.theme.date())
                    .add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .render(area, buf);
            return;
        }

        let mut bindings = vec![("q", "Quit"), ("Tab", "View"), ("t", "Range"), ("r", "Reload")];
        let can_delete = match self.current_tab {
            Tab::Entries => self.caps.can_modify_entries,
            Tab::Users => self.caps.can_manage_users,
            _ => false,
        };
        if can_delete {
            bindings.push(("x", "Delete"));
        }
        bindings.push(("?", "Help"));

        let mut spans = Vec::new();
        for (i, (key, desc)) in bindings.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(key, Style::default().fg(self.theme.accent())));
            spans.push(Span::styled(
                format!(": {}", desc),
                Style::default().fg(self.theme.muted()),
            ));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

/// Fetch everything the tabs show for `range` as seen at `now`
pub fn load_data(
    api: &dyn MilkApi,
    caps: Capabilities,
    range: TimeRange,
    now: NaiveDateTime,
) -> Result<Box<AppData>> {
    let fetched = api.list_milk(EntryScope::for_capabilities(caps))?;
    let stats = StatsAggregator::compute(&fetched, range.window(), now);
    let series = match range {
        TimeRange::AllTime => DailySeries::from_buckets(&StatsAggregator::daily_all(&fetched)),
        TimeRange::Last7Days | TimeRange::Last30Days => {
            DailySeries::from_buckets(&stats.daily_stats)
        }
    };
    let entries = StatsAggregator::recent(&fetched, fetched.len());

    let (users, user_count) = if caps.can_manage_users {
        (api.list_users()?, Some(api.count_users()?))
    } else {
        (Vec::new(), None)
    };

    info!(
        entries = entries.len(),
        users = users.len(),
        range = range.label(),
        "dashboard data loaded"
    );
    Ok(Box::new(AppData {
        entries,
        users,
        user_count,
        stats,
        series,
    }))
}

/// Run `action` against the backend, then reload.
/// A failed delete still reloads and reports the failure as a notice.
pub fn perform(
    api: &dyn MilkApi,
    action: Action,
    caps: Capabilities,
    range: TimeRange,
    now: NaiveDateTime,
) -> (Result<Box<AppData>>, Option<String>) {
    let deleted = match action {
        Action::Reload => Ok(None),
        Action::Delete(DeleteTarget::Entry(id)) => api
            .delete_milk(id)
            .map(|()| Some(format!("Deleted entry #{}", id))),
        Action::Delete(DeleteTarget::User(id)) => api.delete_user(id).map(Some),
    };
    let notice = match deleted {
        Ok(notice) => notice,
        Err(e) if e.is_auth_failure() => return (Err(e), None),
        Err(e) => {
            warn!(error = %e, ?action, "delete failed");
            Some(format!("Delete failed: {}", e))
        }
    };
    (load_data(api, caps, range, now), notice)
}

/// Result of one background job, tagged with its ticket
pub struct JobOutcome {
    pub ticket: FetchTicket,
    pub result: Result<Box<AppData>>,
    pub notice: Option<String>,
}

/// Spawns background jobs; each new job supersedes the ones before it
pub struct Worker {
    api: Arc<dyn MilkApi>,
    sequencer: FetchSequencer,
    tx: Sender<JobOutcome>,
}

impl Worker {
    pub fn new(api: Arc<dyn MilkApi>) -> (Self, Receiver<JobOutcome>) {
        let (tx, rx) = mpsc::channel();
        let worker = Self {
            api,
            sequencer: FetchSequencer::new(),
            tx,
        };
        (worker, rx)
    }

    pub fn start(&self, action: Action, caps: Capabilities, range: TimeRange) -> FetchTicket {
        let ticket = self.sequencer.issue();
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        debug!(ticket = ticket.id(), ?action, "starting background job");
        thread::spawn(move || {
            let now = Local::now().naive_local();
            let (result, notice) = perform(api.as_ref(), action, caps, range, now);
            let _ = tx.send(JobOutcome {
                ticket,
                result,
                notice,
            });
        });
        ticket
    }

    /// Whether `outcome` belongs to the latest job
    pub fn is_current(&self, outcome: &JobOutcome) -> bool {
        self.sequencer.is_current(outcome.ticket)
    }

    /// Drop whatever is still running
    pub fn cancel(&self) {
        self.sequencer.invalidate();
    }
}

/// Run the TUI application
pub fn run(config: Config) -> anyhow::Result<()> {
    let auth = AuthSession::restore(FileStore::new(&config.data_dir));
    auth.require()?;
    let api = HttpApi::new(&config)?.with_token(auth.token().map(str::to_string));

    // Must run before raw mode
    let theme = Theme::detect();

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, auth, Arc::new(api), theme);
    ratatui::restore();
    result
}

fn run_app(
    terminal: &mut DefaultTerminal,
    mut auth: AuthSession<FileStore>,
    api: Arc<dyn MilkApi>,
    theme: Theme,
) -> anyhow::Result<()> {
    let caps = auth.capabilities();
    let own_id = auth.require()?.user.id;
    let mut app = App::new(caps, own_id, theme);

    let (worker, rx) = Worker::new(api);
    worker.start(Action::Reload, caps, app.range());

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        while let Ok(outcome) = rx.try_recv() {
            if !worker.is_current(&outcome) {
                debug!(ticket = outcome.ticket.id(), "dropping stale result");
                continue;
            }
            if let Err(e) = &outcome.result {
                if e.is_auth_failure() {
                    warn!(error = %e, "backend rejected the session, signing out");
                    if let Err(e) = auth.logout() {
                        warn!(error = %e, "failed to clear stored session");
                    }
                }
            }
            app.apply_result(outcome.result, outcome.notice);
        }

        if let Some(action) = app.take_action() {
            worker.start(action, caps, app.range());
        }

        // Poll for events with 100ms timeout for spinner animation
        if event::poll(Duration::from_millis(100))? {
            app.handle_event(event::read()?);
        } else {
            app.tick();
        }
    }

    worker.cancel();
    Ok(())
}

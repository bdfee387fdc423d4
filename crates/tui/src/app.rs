use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gamevault_core::{
    catalog::{CatalogCandidate, CatalogClient},
    models::{GamePatch, GameRecord, GameStatus},
    stats::stats,
    store::{CollectionEvent, CollectionStore},
    views,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{
    spawn,
    sync::{broadcast, mpsc},
};
use tracing::{error, info, warn};

use crate::form::{rating_stars, FormField, GameForm};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_QUERY_LEN: usize = 64;
const RECENT_COUNT: usize = 3;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

impl Theme {
    fn status_color(&self, status: GameStatus) -> Color {
        match status {
            GameStatus::Playing => self.success,
            GameStatus::Completed => Color::Blue,
            GameStatus::Paused => self.warning,
            GameStatus::Planned => Color::Magenta,
            GameStatus::Abandoned => self.danger,
            GameStatus::Unspecified => self.muted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Collection,
    Stats,
    Form,
    Search,
}

enum AppEvent {
    Input(Event),
    Tick,
    SearchFinished {
        query: String,
        results: Vec<CatalogCandidate>,
    },
}

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    results: Vec<CatalogCandidate>,
    cursor: usize,
    pending: bool,
    dirty: bool,
    searched: bool,
}

impl SearchState {
    fn move_cursor(&mut self, delta: isize) {
        if self.results.is_empty() {
            return;
        }
        let last = self.results.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
    }

    fn selected(&self) -> Option<&CatalogCandidate> {
        self.results.get(self.cursor)
    }

    /// Edits while a request is in flight orphan it; its result is dropped.
    fn edit(&mut self, change: impl FnOnce(&mut String)) {
        change(&mut self.query);
        self.dirty = true;
        self.pending = false;
    }

    /// Take `results` if they answer the current query.
    fn accept(&mut self, query: &str, results: Vec<CatalogCandidate>) -> bool {
        if query != self.query.trim() {
            return false;
        }
        self.pending = false;
        self.searched = true;
        self.cursor = 0;
        self.results = results;
        true
    }
}

/// Terminal front-end over the collection store.
pub struct VaultApp {
    store: Arc<CollectionStore>,
    catalog: Arc<CatalogClient>,
    state: UiState,
    screen: Screen,
    form: GameForm,
    search: SearchState,
    pending_delete: Option<GameRecord>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl VaultApp {
    pub fn new(store: Arc<CollectionStore>, catalog: Arc<CatalogClient>) -> Self {
        Self {
            store,
            catalog,
            state: UiState::default(),
            screen: Screen::Collection,
            form: GameForm::default(),
            search: SearchState::default(),
            pending_delete: None,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let records = self.store.load().await;
        self.state.set_games(records);
        self.state.apply_filter();
        self.state
            .set_status(format!("Loaded {} games", self.state.all_games.len()));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);
        let mut changes = self.store.subscribe();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    if !self.process_app_event(maybe_event).await {
                        break;
                    }
                }
                change = changes.recv() => self.handle_collection_event(change),
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    async fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                if let Err(err) = self.handle_key(key).await {
                    error!(?err, "Action failed");
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Input(_)) => true,
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::SearchFinished { query, results }) => {
                let hits = results.len();
                if self.search.accept(&query, results) {
                    self.state.set_status(if hits == 0 {
                        format!("No catalog matches for \"{query}\"")
                    } else {
                        format!("{hits} catalog matches for \"{query}\"")
                    });
                }
                true
            }
            None => false,
        }
    }

    fn handle_tick(&mut self) {
        if self.state.mode == Mode::Filter {
            self.state
                .set_status(format!("Filter: {}", self.state.filter));
        }
    }

    fn handle_collection_event(
        &mut self,
        change: Result<CollectionEvent, broadcast::error::RecvError>,
    ) {
        match change {
            Ok(CollectionEvent::Completed(record)) => {
                self.state
                    .set_status(format!("Completed {}. Congratulations!", record.title));
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed collection events; refreshing");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
        self.refresh_from_store();
    }

    fn refresh_from_store(&mut self) {
        let selected = self.state.current_game().map(|game| game.id.clone());
        self.state.set_games(self.store.records());
        self.state.apply_filter();
        if let Some(id) = selected {
            self.state.select_game(&id);
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        if self.pending_delete.is_some() {
            return self.handle_delete_confirm_key(key).await;
        }
        match self.screen {
            Screen::Collection => match self.state.mode {
                Mode::Browse => self.handle_browse_key(key).await,
                Mode::Filter => {
                    self.handle_filter_key(key);
                    Ok(())
                }
            },
            Screen::Stats => {
                self.handle_stats_key(key);
                Ok(())
            }
            Screen::Form => self.handle_form_key(key).await,
            Screen::Search => {
                self.handle_search_key(key);
                Ok(())
            }
        }
    }

    async fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1),
            KeyCode::Char('g') if key.modifiers.is_empty() => self.state.move_to(0),
            KeyCode::Char('G') => self.state.move_to_end(),
            KeyCode::Home => self.state.move_to(0),
            KeyCode::End => self.state.move_to_end(),
            KeyCode::PageDown => self.state.page_down(),
            KeyCode::PageUp => self.state.page_up(),
            KeyCode::Char('/') => {
                self.state.mode = Mode::Filter;
                self.state.set_status("Filter: ".to_string());
            }
            KeyCode::Char('s') => {
                self.state.status_filter = match self.state.status_filter {
                    None => Some(GameStatus::ALL[0]),
                    Some(GameStatus::Unspecified) => None,
                    Some(status) => Some(status.cycle_next()),
                };
                self.state.apply_filter();
                let label = self
                    .state
                    .status_filter
                    .map(|status| status.label())
                    .unwrap_or("All");
                self.state.set_status(format!("Showing: {label}"));
            }
            KeyCode::Char('t') => self.screen = Screen::Stats,
            KeyCode::Char('a') => self.open_form(GameForm::default()),
            KeyCode::Char('c') => {
                self.search = SearchState::default();
                self.screen = Screen::Search;
                self.state
                    .set_status("Type a name and press Enter to search the catalog".to_string());
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(game) = self.state.current_game() {
                    let form = GameForm::from_record(game);
                    self.open_form(form);
                }
            }
            KeyCode::Char('d') => {
                if let Some(game) = self.state.current_game().cloned() {
                    self.state
                        .set_status(format!("Delete {}? (y/n)", game.title));
                    self.pending_delete = Some(game);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.bump_hours(1).await?,
            KeyCode::Char('-') => self.bump_hours(-1).await?,
            KeyCode::Char('m') => self.mark_completed().await?,
            KeyCode::Char('r') => {
                let records = self.store.load().await;
                info!(total = records.len(), "Collection reloaded");
                self.refresh_from_store();
                self.state
                    .set_status(format!("Reloaded {} games", records.len()));
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.filter.clear();
                self.state.apply_filter();
                self.state.set_status("Filter cleared".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state
                    .set_status(format!("{} matches", self.state.filtered.len()));
            }
            KeyCode::Backspace => {
                self.state.filter.pop();
                self.state.apply_filter();
            }
            KeyCode::Char(c) => {
                if self.state.filter.len() < MAX_QUERY_LEN {
                    self.state.filter.push(c);
                    self.state.apply_filter();
                }
            }
            _ => {}
        }
    }

    fn handle_stats_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Esc | KeyCode::Char('t') => self.screen = Screen::Collection,
            _ => {}
        }
    }

    async fn handle_delete_confirm_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(game) = self.pending_delete.take() else {
            return Ok(());
        };
        if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            if self.store.remove(&game.id).await? {
                self.state.set_status(format!("Deleted {}", game.title));
            } else {
                self.state
                    .set_status(format!("{} was already gone", game.title));
            }
            self.refresh_from_store();
        } else {
            self.state.set_status("Delete cancelled".to_string());
        }
        Ok(())
    }

    fn open_form(&mut self, form: GameForm) {
        let hint = if form.is_edit() {
            "Editing game"
        } else {
            "New game"
        };
        self.form = form;
        self.screen = Screen::Form;
        self.state.set_status(format!(
            "{hint}: Tab/↑↓ move • ←→ change status/rating • Enter save • Esc cancel"
        ));
    }

    async fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Collection;
                self.state.set_status("Cancelled".to_string());
            }
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
            KeyCode::Left => self.form.cycle(-1),
            KeyCode::Right => self.form.cycle(1),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Enter => self.save_form().await?,
            KeyCode::Char(ch) => self.form.insert(ch),
            _ => {}
        }
        Ok(())
    }

    async fn save_form(&mut self) -> Result<()> {
        let result = match self.form.editing.clone() {
            Some(id) => match self.form.to_patch() {
                Ok(patch) => self.store.update(&id, patch).await,
                Err(message) => {
                    self.form.error = Some(message);
                    return Ok(());
                }
            },
            None => match self.form.to_new_game() {
                Ok(input) => self.store.add(input).await,
                Err(message) => {
                    self.form.error = Some(message);
                    return Ok(());
                }
            },
        };

        match result {
            Ok(record) => {
                self.screen = Screen::Collection;
                self.refresh_from_store();
                self.state.select_game(&record.id);
                self.state.set_status(format!("Saved {}", record.title));
                Ok(())
            }
            Err(err) if err.is_user_error() => {
                self.form.error = Some(err.to_string());
                Ok(())
            }
            Err(err) => {
                self.form.error = Some("Could not save. Press Enter to retry.".to_string());
                Err(err.into())
            }
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Collection;
                self.state.set_status("Search closed".to_string());
            }
            KeyCode::Down => self.search.move_cursor(1),
            KeyCode::Up => self.search.move_cursor(-1),
            KeyCode::Backspace => self.search.edit(|query| {
                query.pop();
            }),
            KeyCode::Enter => {
                if !self.search.dirty {
                    if let Some(candidate) = self.search.selected() {
                        let form = GameForm::from_candidate(candidate);
                        self.open_form(form);
                        return;
                    }
                }
                self.start_search();
            }
            KeyCode::Char(c) => {
                if self.search.query.len() < MAX_QUERY_LEN {
                    self.search.edit(|query| query.push(c));
                }
            }
            _ => {}
        }
    }

    fn start_search(&mut self) {
        let query = self.search.query.trim().to_string();
        if query.is_empty() {
            self.state.set_status("Type a name to search".to_string());
            return;
        }
        let Some(sender) = self.event_tx.clone() else {
            return;
        };
        self.search.pending = true;
        self.search.dirty = false;
        self.search.results.clear();
        self.state.set_status(format!("Searching for \"{query}\"…"));

        let catalog = self.catalog.clone();
        spawn(async move {
            let results = catalog.search(&query).await;
            let _ = sender
                .send(AppEvent::SearchFinished { query, results })
                .await;
        });
    }

    async fn bump_hours(&mut self, delta: i32) -> Result<()> {
        let Some(game) = self.state.current_game().cloned() else {
            return Ok(());
        };
        let hours = adjusted_hours(game.hours_played, delta);
        let patch = GamePatch {
            hours_played: Some(hours),
            ..GamePatch::default()
        };
        let updated = self.store.update(&game.id, patch).await?;
        self.refresh_from_store();
        self.state
            .set_status(format!("{}: {}h", updated.title, updated.hours_played));
        Ok(())
    }

    async fn mark_completed(&mut self) -> Result<()> {
        let Some(game) = self.state.current_game().cloned() else {
            return Ok(());
        };
        if game.status == GameStatus::Completed {
            self.state
                .set_status(format!("{} is already completed", game.title));
            return Ok(());
        }
        let patch = GamePatch {
            status: Some(GameStatus::Completed),
            ..GamePatch::default()
        };
        self.store.update(&game.id, patch).await?;
        self.refresh_from_store();
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Collection => self.draw_collection(frame),
            Screen::Stats => self.draw_stats(frame),
            Screen::Form => self.draw_form(frame),
            Screen::Search => self.draw_search(frame),
        }
        if let Some(game) = &self.pending_delete {
            self.render_delete_prompt(frame, game);
        }
    }

    fn draw_collection(&mut self, frame: &mut Frame) {
        let size = frame.size();
        self.state.list_height = size.height.saturating_sub(5) as usize;
        self.state.ensure_cursor_visible();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(3)])
            .split(size);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[0]);

        self.render_game_list(frame, body[0]);
        self.render_game_info(frame, body[1]);
        self.render_status(frame, chunks[1]);
    }

    fn render_game_list(&self, frame: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let visible = self.state.visible_games(height.max(1));
        let items: Vec<ListItem> = if visible.is_empty() {
            vec![ListItem::new(Line::from("  No games"))]
        } else {
            visible
                .iter()
                .enumerate()
                .map(|(idx, game)| {
                    let absolute = self.state.offset + idx;
                    let marker = if absolute == self.state.cursor {
                        Span::styled("▶ ", Style::default().fg(self.theme.accent))
                    } else {
                        Span::raw("  ")
                    };
                    ListItem::new(Line::from(vec![
                        marker,
                        Span::styled(
                            game.title.clone(),
                            Style::default().fg(self.theme.primary_fg),
                        ),
                        Span::raw(" "),
                        Span::styled(
                            format!("[{}]", game.status.label()),
                            Style::default().fg(self.theme.status_color(game.status)),
                        ),
                    ]))
                })
                .collect()
        };

        let mut list_state = ListState::default();
        if !self.state.filtered.is_empty() {
            list_state.select(Some(self.state.cursor - self.state.offset));
        }

        let scope = self
            .state
            .status_filter
            .map(|status| status.label())
            .unwrap_or("All");
        let title = format!(
            "Games ({}/{}) • {scope}",
            self.state.filtered.len(),
            self.state.all_games.len()
        );
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_game_info(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(game) = self.state.current_game() else {
            let paragraph = Paragraph::new("Press 'a' to add a game or 'c' to search the catalog")
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        };

        let label = Style::default().fg(self.theme.muted);
        let mut lines = vec![
            Line::from(Span::styled(
                game.title.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Platform: ", label),
                Span::raw(game.platform.clone()),
            ]),
            Line::from(vec![
                Span::styled("Status:   ", label),
                Span::styled(
                    game.status.label(),
                    Style::default().fg(self.theme.status_color(game.status)),
                ),
            ]),
            Line::from(vec![
                Span::styled("Hours:    ", label),
                Span::raw(format!("{}h", game.hours_played)),
            ]),
            Line::from(vec![
                Span::styled("Rating:   ", label),
                Span::styled(
                    rating_stars(game.rating),
                    Style::default().fg(self.theme.warning),
                ),
            ]),
            Line::from(vec![
                Span::styled("Added:    ", label),
                Span::raw(game.created_at.format("%Y-%m-%d %H:%M").to_string()),
            ]),
        ];
        if let Some(updated) = game.updated_at {
            lines.push(Line::from(vec![
                Span::styled("Updated:  ", label),
                Span::raw(updated.format("%Y-%m-%d %H:%M").to_string()),
            ]));
        }
        if let Some(cover) = &game.cover_image_uri {
            let source = game
                .cover_source()
                .map(|source| format!("{source:?}").to_lowercase())
                .unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled("Cover:    ", label),
                Span::raw(format!("{cover} ({source})")),
            ]));
        }
        if !game.notes.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Notes", label)));
            lines.push(Line::from(game.notes.clone()));
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_stats(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(3)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);

        let records = &self.state.all_games;
        let summary = stats(records);
        let label = Style::default().fg(self.theme.muted);
        let bold = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Games      ", label),
                Span::styled(summary.total_games.to_string(), bold),
            ]),
            Line::from(vec![
                Span::styled("Hours      ", label),
                Span::styled(format!("{}h", summary.total_hours), bold),
            ]),
            Line::from(vec![
                Span::styled("Completed  ", label),
                Span::styled(summary.completed_count.to_string(), bold),
            ]),
            Line::from(vec![
                Span::styled("Avg rating ", label),
                Span::raw(
                    summary
                        .average_rating
                        .map(|avg| format!("{avg:.1} ({} rated)", summary.rated_count))
                        .unwrap_or_else(|| "no ratings".to_string()),
                ),
            ]),
            Line::from(vec![
                Span::styled("Favorite   ", label),
                Span::raw(
                    summary
                        .favorite_platform
                        .clone()
                        .unwrap_or_else(|| "none".to_string()),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled("By status", label)),
        ];
        let widest = summary.by_status.values().copied().max().unwrap_or(1).max(1);
        for (status, count) in &summary.by_status {
            let width = count * 20 / widest;
            lines.push(Line::from(vec![
                Span::raw(format!("{:<12}", status.label())),
                Span::styled(
                    "█".repeat(width.max(1)),
                    Style::default().fg(self.theme.status_color(*status)),
                ),
                Span::raw(format!(" {count}")),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("By platform", label)));
        for (platform, count) in &summary.by_platform {
            lines.push(Line::from(format!("{platform:<12}{count}")));
        }
        let totals = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Statistics"))
            .wrap(Wrap { trim: false });
        frame.render_widget(totals, columns[0]);

        let mut highlights = vec![Line::from(Span::styled("Continue playing", label))];
        let playing = views::currently_playing(records);
        if playing.is_empty() {
            highlights.push(Line::from("  Nothing in progress"));
        }
        for game in playing {
            highlights.push(Line::from(format!("  {} ({}h)", game.title, game.hours_played)));
        }
        highlights.push(Line::from(""));
        highlights.push(Line::from(Span::styled("Recently added", label)));
        for game in views::recently_added(records, RECENT_COUNT) {
            highlights.push(Line::from(format!(
                "  {}  {}",
                game.created_at.format("%Y-%m-%d"),
                game.title
            )));
        }
        let side = Paragraph::new(highlights)
            .block(Block::default().borders(Borders::ALL).title("Highlights"))
            .wrap(Wrap { trim: false });
        frame.render_widget(side, columns[1]);

        self.render_status(frame, rows[1]);
    }

    fn draw_form(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(3)])
            .split(area);

        let focused = self.form.focused();
        let mut lines: Vec<Line> = FormField::ALL
            .iter()
            .map(|field| {
                let active = *field == focused;
                let marker = if active { "▶ " } else { "  " };
                let mut value = self.form.display_value(*field);
                if active && !matches!(field, FormField::Status | FormField::Rating) {
                    value.push('▏');
                }
                let value_style = if active {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(self.theme.accent)),
                    Span::styled(
                        format!("{:<10}", field.label()),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(value, value_style),
                ])
            })
            .collect();
        if let Some(error) = &self.form.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(self.theme.danger),
            )));
        }

        let title = if self.form.is_edit() {
            "Edit Game"
        } else {
            "Add Game"
        };
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, rows[0]);
        self.render_status(frame, rows[1]);
    }

    fn draw_search(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        let input = Paragraph::new(Line::from(vec![
            Span::styled("Name: ", Style::default().fg(self.theme.muted)),
            Span::raw(format!("{}▏", self.search.query)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Catalog Search"),
        );
        frame.render_widget(input, rows[0]);

        let items: Vec<ListItem> = if self.search.pending {
            vec![ListItem::new(Line::from("  Searching…"))]
        } else if self.search.results.is_empty() {
            let message = if self.search.searched {
                "  No games found"
            } else {
                "  Press Enter to search"
            };
            vec![ListItem::new(Line::from(message))]
        } else {
            self.search
                .results
                .iter()
                .map(|candidate| {
                    ListItem::new(Line::from(vec![
                        Span::raw(candidate.display_name.clone()),
                        Span::styled(
                            format!("  #{}", candidate.identifier),
                            Style::default().fg(self.theme.muted),
                        ),
                    ]))
                })
                .collect()
        };
        let mut list_state = ListState::default();
        if !self.search.results.is_empty() && !self.search.pending {
            list_state.select(Some(self.search.cursor));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Results (Enter to use)"),
            )
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, rows[1], &mut list_state);
        self.render_status(frame, rows[2]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let hints = match self.screen {
            Screen::Collection => {
                "a add • e edit • d delete • c catalog • s status • / filter • +/- hours • m done • t stats • q quit"
            }
            Screen::Stats => "Esc back • q quit",
            Screen::Form => "Enter save • Esc cancel",
            Screen::Search => "Enter search/select • ↑↓ move • Esc back",
        };
        let lines = vec![
            Line::from(Span::styled(
                self.state.status.clone(),
                Style::default().fg(self.theme.primary_fg),
            )),
            Line::from(Span::styled(hints, Style::default().fg(self.theme.muted))),
        ];
        let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::TOP));
        frame.render_widget(paragraph, area);
    }

    fn render_delete_prompt(&self, frame: &mut Frame, game: &GameRecord) {
        let area = centered_rect(48, 5, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(format!("Delete \"{}\"?", game.title)),
            Line::from(Span::styled(
                "y to confirm, any other key to cancel",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .border_style(Style::default().fg(self.theme.danger)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn adjusted_hours(hours: u32, delta: i32) -> u32 {
    hours.saturating_add_signed(delta)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    all_games: Vec<GameRecord>,
    filtered: Vec<GameRecord>,
    cursor: usize,
    offset: usize,
    list_height: usize,
    filter: String,
    status_filter: Option<GameStatus>,
    status: String,
    mode: Mode,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            all_games: Vec::new(),
            filtered: Vec::new(),
            cursor: 0,
            offset: 0,
            list_height: 1,
            filter: String::new(),
            status_filter: None,
            status: "Ready".to_string(),
            mode: Mode::Browse,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_games(&mut self, games: Vec<GameRecord>) {
        self.all_games = games;
    }

    fn apply_filter(&mut self) {
        let scoped = match self.status_filter {
            Some(status) => views::filter_by_status(&self.all_games, status),
            None => self.all_games.clone(),
        };
        self.filtered = views::search_titles(&scoped, &self.filter);
        self.cursor = 0;
        self.offset = 0;
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize) {
        if self.filtered.is_empty() {
            return;
        }
        self.cursor = index.min(self.filtered.len() - 1);
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        self.cursor = self.filtered.len() - 1;
        self.ensure_cursor_visible();
    }

    fn page_down(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.filtered.len());
        self.move_cursor(delta as isize);
    }

    fn page_up(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.filtered.len());
        self.move_cursor(-(delta as isize));
    }

    fn visible_games(&self, height: usize) -> &[GameRecord] {
        if self.filtered.is_empty() {
            return &[];
        }
        let end = (self.offset + height).min(self.filtered.len());
        &self.filtered[self.offset..end]
    }

    fn current_game(&self) -> Option<&GameRecord> {
        self.filtered.get(self.cursor)
    }

    fn select_game(&mut self, game_id: &str) -> bool {
        match self.filtered.iter().position(|game| game.id == game_id) {
            Some(pos) => {
                self.cursor = pos;
                self.ensure_cursor_visible();
                true
            }
            None => false,
        }
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn ensure_cursor_visible(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        if self.cursor >= self.filtered.len() {
            self.cursor = self.filtered.len() - 1;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.list_height {
            self.offset = self.cursor + 1 - self.list_height;
        }
    }
}

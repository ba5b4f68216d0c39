use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use nowplaying_core::{
    catalog::{spawn_fetch, CatalogApi, DateWindow, FetchEvent},
    config::AppConfig,
    models::Movie,
    poster::PosterCache,
    presenter::{ListView, MoviePresenter, MovieRow, ScreenState},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const ROW_HEIGHT: usize = 2;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
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
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Envelope details kept for the header and status bar.
#[derive(Debug, Clone)]
struct ListingSummary {
    page: u32,
    total_pages: u32,
    total_results: u32,
    dates: Option<DateWindow>,
    skipped: usize,
}

/// Now playing screen: one catalog fetch, one scrollable list.
pub struct NowPlayingApp {
    config: AppConfig,
    catalog: Arc<dyn CatalogApi>,
    posters: PosterCache,
    presenter: MoviePresenter<MovieListState>,
    listing: Option<ListingSummary>,
    fetch_rx: Option<mpsc::Receiver<FetchEvent>>,
    status: String,
    should_quit: bool,
    theme: Theme,
}

impl NowPlayingApp {
    pub fn new(config: AppConfig, catalog: Arc<dyn CatalogApi>, posters: PosterCache) -> Self {
        let presenter =
            MoviePresenter::with_image_base(MovieListState::default(), config.image_base_url.clone());
        Self {
            config,
            catalog,
            posters,
            presenter,
            listing: None,
            fetch_rx: None,
            status: "Ready".to_string(),
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal).await;
        restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);
        self.start_fetch();

        let mut fetch_rx = self.fetch_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            if let Some(rx) = fetch_rx.as_mut() {
                let mut fetch_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_fetch = rx.recv() => {
                        match maybe_fetch {
                            Some(event) => self.handle_fetch_event(event),
                            None => fetch_closed = true,
                        }
                    }
                }
                if fetch_closed {
                    fetch_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn start_fetch(&mut self) {
        if !self.presenter.begin_loading() {
            return;
        }
        let page = self.config.page;
        let (sender, receiver) = mpsc::channel(1);
        self.fetch_rx = Some(receiver);
        self.status = format!("Loading now playing (page {page})…");
        spawn_fetch(Arc::clone(&self.catalog), page, sender);
    }

    fn handle_fetch_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Loaded(listing) => {
                self.listing = Some(ListingSummary {
                    page: listing.page,
                    total_pages: listing.total_pages,
                    total_results: listing.total_results,
                    dates: listing.dates,
                    skipped: listing.skipped,
                });
                let count = listing.movies.len();
                self.presenter.on_fetch_success(listing.movies);
                self.status = format!("Loaded {count} movies");
            }
            FetchEvent::Failed(err) => {
                self.presenter.on_fetch_failure(&err);
                self.status = format!("Failed to load movies: {err}");
            }
        }
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                self.handle_key(key);
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let list = self.presenter.view_mut();
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => list.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => list.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => list.move_to(0),
            KeyCode::Char('G') | KeyCode::End => list.move_to_end(),
            KeyCode::PageDown => list.page_down(),
            KeyCode::PageUp => list.page_up(),
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(size);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        self.render_header(frame, chunks[0]);
        self.render_movie_list(frame, body[0]);
        self.render_movie_details(frame, body[1]);
        self.render_status(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            "Now Playing",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(window) = self.listing.as_ref().and_then(|listing| listing.dates) {
            if let (Some(min), Some(max)) = (window.minimum, window.maximum) {
                spans.push(Span::styled(
                    format!("  {} – {}", min.format("%b %d"), max.format("%b %d, %Y")),
                    Style::default().fg(self.theme.muted),
                ));
            }
        }
        let paragraph = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_movie_list(&mut self, frame: &mut Frame, area: Rect) {
        let inner_height = area.height.saturating_sub(2) as usize;
        let inner_width = area.width.saturating_sub(4) as usize;
        let title = format!("Movies ({})", self.presenter.row_count());
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.presenter.row_count() == 0 {
            let (message, color) = match self.presenter.state() {
                ScreenState::Idle | ScreenState::Loading => {
                    ("Loading now playing…", self.theme.muted)
                }
                ScreenState::Failed => ("Could not load movies", self.theme.danger),
                ScreenState::Loaded => ("No movies playing", self.theme.muted),
            };
            let paragraph =
                Paragraph::new(Span::styled(message, Style::default().fg(color))).block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let (cursor, range) = {
            let list = self.presenter.view_mut();
            list.set_list_height((inner_height / ROW_HEIGHT).max(1));
            (list.cursor, list.visible_range())
        };

        let rows: Vec<MovieRow> = range
            .clone()
            .filter_map(|index| self.presenter.row(index, &self.posters))
            .collect();

        let mut list_state = ListState::default();
        if !rows.is_empty() {
            list_state.select(Some(cursor.saturating_sub(range.start).min(rows.len() - 1)));
        }

        let items: Vec<ListItem> = rows
            .iter()
            .map(|row| self.movie_item(row, row.index == cursor, inner_width))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn movie_item(&self, row: &MovieRow, is_selected: bool, width: usize) -> ListItem<'static> {
        let marker = if is_selected {
            Span::styled(
                "▶ ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("  ")
        };
        let poster_style = if row.poster.shows_placeholder() {
            Style::default().fg(self.theme.muted)
        } else {
            Style::default().fg(self.theme.warning)
        };
        let poster = Span::styled(format!("{:<8} ", row.poster_label()), poster_style);
        let title = Span::styled(
            row.title.clone(),
            Style::default()
                .fg(self.theme.primary_fg)
                .add_modifier(Modifier::BOLD),
        );
        let overview = Span::styled(
            format!("  {}", truncate(&row.overview, width.saturating_sub(2))),
            Style::default().fg(self.theme.muted),
        );
        ListItem::new(vec![
            Line::from(vec![marker, poster, title]),
            Line::from(overview),
        ])
    }

    fn render_movie_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(movie) = self.presenter.movie(self.presenter.view().cursor) else {
            let paragraph = Paragraph::new("No movie selected").block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let lines = self.detail_lines(movie);
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn detail_lines(&self, movie: &Movie) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(
            movie.display_name(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if !movie.original_title.is_empty() && movie.original_title != movie.title {
            lines.push(Line::from(Span::styled(
                movie.original_title.clone(),
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.push(Line::from(""));
        if let Some(date) = movie.released_on() {
            lines.push(Line::from(format!("Released: {}", date.format("%Y-%m-%d"))));
        }
        if !movie.original_language.is_empty() {
            lines.push(Line::from(format!("Language: {}", movie.original_language)));
        }
        lines.push(Line::from(format!(
            "Rating: ★ {:.1} ({} votes)",
            movie.vote_average, movie.vote_count
        )));
        lines.push(Line::from(format!("Popularity: {:.1}", movie.popularity)));
        let genres = movie.genre_names();
        if !genres.is_empty() {
            lines.push(Line::from(format!("Genres: {}", genres.join(", "))));
        }
        if movie.adult {
            lines.push(Line::from(Span::styled(
                "Adult",
                Style::default().fg(self.theme.danger),
            )));
        }
        lines.push(Line::from(format!("Poster: {}", self.presenter.poster_url(movie))));
        lines.push(Line::from(format!(
            "Backdrop: {}",
            self.presenter.backdrop_url(movie)
        )));
        lines.push(Line::from(""));
        let overview = if movie.overview.is_empty() {
            "No overview available.".to_string()
        } else {
            movie.overview.clone()
        };
        lines.push(Line::from(overview));
        lines
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary_style = if self.presenter.state() == ScreenState::Failed {
            Style::default().fg(self.theme.danger)
        } else {
            Style::default()
        };
        let primary = Line::from(Span::styled(self.status.clone(), primary_style));
        let secondary = match &self.listing {
            Some(listing) => {
                let mut text = format!(
                    "Page {}/{} • {} titles in catalog",
                    listing.page, listing.total_pages, listing.total_results
                );
                if listing.skipped > 0 {
                    text.push_str(&format!(" • {} malformed entries skipped", listing.skipped));
                }
                text
            }
            None => "j/k move • g/G jump • PgUp/PgDn page • q quit".to_string(),
        };
        let paragraph = Paragraph::new(vec![
            primary,
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Cursor and scroll offset over the presenter's rows.
#[derive(Debug, Default)]
pub struct MovieListState {
    cursor: usize,
    offset: usize,
    list_height: usize,
    rows: usize,
}

impl ListView for MovieListState {
    fn data_changed(&mut self, row_count: usize) {
        debug!(row_count, "Movie list data changed");
        self.rows = row_count;
        self.clamp_cursor();
        self.ensure_cursor_visible();
    }
}

impl MovieListState {
    fn set_list_height(&mut self, height: usize) {
        self.list_height = height;
        self.clamp_cursor();
        self.ensure_cursor_visible();
    }

    fn visible_range(&self) -> std::ops::Range<usize> {
        let end = (self.offset + self.list_height.max(1)).min(self.rows);
        self.offset.min(end)..end
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.rows == 0 {
            return;
        }
        let len = self.rows as isize;
        let mut idx = self.cursor as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx >= len {
            idx = len - 1;
        }
        self.cursor = idx as usize;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize) {
        if self.rows == 0 {
            return;
        }
        self.cursor = index.min(self.rows - 1);
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        if self.rows == 0 {
            return;
        }
        self.cursor = self.rows - 1;
        self.ensure_cursor_visible();
    }

    fn page_down(&mut self) {
        if self.rows == 0 || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.rows);
        self.move_cursor(delta as isize);
    }

    fn page_up(&mut self) {
        if self.rows == 0 || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.rows);
        self.move_cursor(-(delta as isize));
    }

    fn clamp_cursor(&mut self) {
        if self.rows == 0 {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= self.rows {
            self.cursor = self.rows - 1;
        }
    }

    fn ensure_cursor_visible(&mut self) {
        if self.rows == 0 || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = self.rows.saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    info!("Terminal restored");
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

fn truncate(text: &str, width: usize) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= width {
        return flattened;
    }
    if width == 0 {
        return String::new();
    }
    let mut shortened: String = flattened.chars().take(width - 1).collect();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with(rows: usize, height: usize) -> MovieListState {
        let mut list = MovieListState::default();
        list.set_list_height(height);
        list.data_changed(rows);
        list
    }

    #[test]
    fn data_change_clamps_cursor() {
        let mut list = list_with(10, 4);
        list.move_to_end();
        assert_eq!(list.cursor, 9);
        assert_eq!(list.visible_range(), 6..10);

        list.data_changed(3);
        assert_eq!(list.cursor, 2);
        assert_eq!(list.visible_range(), 0..3);
    }

    #[test]
    fn cursor_scrolls_window() {
        let mut list = list_with(20, 5);
        assert_eq!(list.visible_range(), 0..5);
        list.move_cursor(6);
        assert_eq!(list.cursor, 6);
        assert_eq!(list.visible_range(), 2..7);
        list.page_down();
        assert_eq!(list.cursor, 11);
        list.page_up();
        list.page_up();
        assert_eq!(list.cursor, 1);
        list.move_cursor(-5);
        assert_eq!(list.cursor, 0);
        assert_eq!(list.visible_range().start, 0);
    }

    #[test]
    fn empty_list_ignores_movement() {
        let mut list = list_with(0, 5);
        list.move_cursor(3);
        list.move_to_end();
        list.page_down();
        assert_eq!(list.cursor, 0);
        assert_eq!(list.visible_range(), 0..0);
    }

    #[test]
    fn truncate_flattens_and_ellipsizes() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a\nmulti   line", 20), "a multi line");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("abc", 0), "");
    }
}

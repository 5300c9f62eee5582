//! Ratatui-based terminal UI.
//!
//! The TUI is the interactive surface of the uploader: a credentials panel
//! (file or manual entry), a CSV file list, a data preview, a date-range
//! selector, the price/volume charts, and a save action. Every user gesture
//! runs to completion before the next one is handled — the event loop is
//! synchronous, so a long connect or save blocks exactly like the one-shot
//! CLI commands do.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline;
use crate::cli::{TuiArgs, picker};
use crate::domain::{Credentials, Frame};
use crate::error::AppError;
use crate::frame::{day_interval, filter_by_date, unique_dates};
use crate::io::creds::{DEFAULT_CREDS_PATH, load_credentials};
use crate::io::loader;
use crate::warehouse::{self, HttpSession, materialize};

mod plotters_chart;

use plotters_chart::{SeriesChart, SeriesKind};

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::Terminal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::Terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::Terminal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Where connection parameters come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredsMode {
    File,
    Manual,
}

/// One selectable row in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    CredsFile,
    Account,
    User,
    Password,
    Database,
    Schema,
    File,
    Table,
}

const FIELDS: [Field; 8] = [
    Field::CredsFile,
    Field::Account,
    Field::User,
    Field::Password,
    Field::Database,
    Field::Schema,
    Field::File,
    Field::Table,
];

/// A loaded CSV plus the state of the interval selector.
struct LoadedCsv {
    path: PathBuf,
    frame: Frame,
    /// Distinct calendar dates, ascending: the selector's domain.
    dates: Vec<chrono::NaiveDate>,
    start_idx: usize,
    end_idx: usize,
    /// Derived view, recomputed whenever the interval changes.
    filtered: Frame,
}

impl LoadedCsv {
    fn refilter(&mut self) {
        if self.dates.is_empty() {
            self.filtered = self.frame.clone();
            return;
        }
        let (start, end) = day_interval(self.dates[self.start_idx], self.dates[self.end_idx]);
        self.filtered = filter_by_date(&self.frame, start, end);
    }
}

struct App {
    creds_mode: CredsMode,
    creds_file: String,
    account: String,
    user: String,
    password: String,
    database: String,
    schema: String,
    table_input: String,
    selected_field: usize,
    editing: bool,
    files: Vec<PathBuf>,
    file_cursor: usize,
    loaded: Option<LoadedCsv>,
    session: Option<HttpSession>,
    /// Credentials used for the live session (database/schema feed the target).
    connected_creds: Option<Credentials>,
    status: String,
}

impl App {
    fn new(args: TuiArgs) -> Self {
        let files = picker::discover_csv_files();
        let file_cursor = args
            .file
            .as_ref()
            .and_then(|want| files.iter().position(|f| f == want))
            .unwrap_or(0);

        let creds_file = args
            .creds
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_CREDS_PATH.to_string());

        Self {
            creds_mode: CredsMode::File,
            creds_file,
            account: String::new(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            schema: String::new(),
            table_input: String::new(),
            selected_field: 0,
            editing: false,
            files,
            file_cursor,
            loaded: None,
            session: None,
            connected_creds: None,
            status: "Select a CSV (Enter on File) and connect (c).".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::Terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::Terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::Terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Handle one key press; returns true to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.editing {
            self.handle_edit(key.code);
            return false;
        }

        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < FIELDS.len() - 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.handle_horizontal(-1, shift),
            KeyCode::Right => self.handle_horizontal(1, shift),
            KeyCode::Enter => match FIELDS[self.selected_field] {
                Field::File => self.load_selected_file(),
                _ => {
                    self.editing = true;
                    self.status = "Editing (Enter to apply, Esc to stop).".to_string();
                }
            },
            KeyCode::Char('m') => {
                self.creds_mode = match self.creds_mode {
                    CredsMode::File => CredsMode::Manual,
                    CredsMode::Manual => CredsMode::File,
                };
                self.status = format!("Credentials: {}", self.creds_mode_label());
            }
            KeyCode::Char('c') => self.connect(),
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('r') => {
                self.files = picker::discover_csv_files();
                self.file_cursor = self.file_cursor.min(self.files.len().saturating_sub(1));
                self.status = format!("Found {} CSV file(s).", self.files.len());
            }
            _ => {}
        }

        false
    }

    fn handle_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Enter => {
                self.editing = false;
                self.status = "Done editing.".to_string();
            }
            KeyCode::Backspace => {
                if let Some(buf) = self.field_buffer() {
                    buf.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buf) = self.field_buffer() {
                    buf.push(c);
                }
            }
            _ => {}
        }
    }

    fn field_buffer(&mut self) -> Option<&mut String> {
        match FIELDS[self.selected_field] {
            Field::CredsFile => Some(&mut self.creds_file),
            Field::Account => Some(&mut self.account),
            Field::User => Some(&mut self.user),
            Field::Password => Some(&mut self.password),
            Field::Database => Some(&mut self.database),
            Field::Schema => Some(&mut self.schema),
            Field::Table => Some(&mut self.table_input),
            Field::File => None,
        }
    }

    /// Left/Right: cycle the file list on the File row, otherwise move the
    /// interval cursors (plain = start, Shift = end).
    fn handle_horizontal(&mut self, delta: i64, shift: bool) {
        if FIELDS[self.selected_field] == Field::File && !shift {
            if self.files.is_empty() {
                return;
            }
            let n = self.files.len() as i64;
            self.file_cursor = ((self.file_cursor as i64 + delta).rem_euclid(n)) as usize;
            return;
        }

        let Some(loaded) = &mut self.loaded else {
            self.status = "Load a CSV first (Enter on File).".to_string();
            return;
        };
        if loaded.dates.is_empty() {
            self.status = "No dates to select over.".to_string();
            return;
        }

        let max = loaded.dates.len() as i64 - 1;
        if shift {
            loaded.end_idx = (loaded.end_idx as i64 + delta).clamp(0, max) as usize;
        } else {
            loaded.start_idx = (loaded.start_idx as i64 + delta).clamp(0, max) as usize;
        }
        loaded.refilter();
        self.status = format!(
            "Range: {} .. {} ({} rows)",
            loaded.dates[loaded.start_idx],
            loaded.dates[loaded.end_idx],
            loaded.filtered.n_rows(),
        );
    }

    fn load_selected_file(&mut self) {
        let Some(path) = self.files.get(self.file_cursor).cloned() else {
            self.status = "No CSV files found (r to rescan).".to_string();
            return;
        };

        match loader::load_frame(&path) {
            Ok(frame) => {
                let dates = unique_dates(&frame);
                let end_idx = dates.len().saturating_sub(1);
                let mut loaded = LoadedCsv {
                    path: path.clone(),
                    frame,
                    dates,
                    start_idx: 0,
                    end_idx,
                    filtered: Frame::default(),
                };
                loaded.refilter();

                self.table_input = materialize::default_table_name(&path);
                self.status = format!(
                    "Loaded {} ({} rows).",
                    picker::pretty_path(&path),
                    loaded.frame.n_rows(),
                );
                self.loaded = Some(loaded);
            }
            Err(err) => {
                self.status = format!("Load failed: {err}");
            }
        }
    }

    fn connect(&mut self) {
        let credentials = match self.creds_mode {
            CredsMode::File => match load_credentials(std::path::Path::new(&self.creds_file)) {
                Ok(c) => c,
                Err(err) => {
                    self.status = format!("Credential load failed: {err}");
                    return;
                }
            },
            CredsMode::Manual => Credentials::manual(
                &self.account,
                &self.user,
                &self.password,
                &self.database,
                &self.schema,
            ),
        };

        self.status = "Connecting...".to_string();
        match warehouse::connect(&credentials) {
            Ok(session) => {
                // A reconnect replaces the prior session without closing it.
                self.session = Some(session);
                self.connected_creds = Some(credentials);
                self.status = "Connected to warehouse.".to_string();
            }
            Err(err) => {
                self.status = format!("Connection failed: {err}");
            }
        }
    }

    fn save(&mut self) {
        let Some(loaded) = &self.loaded else {
            self.status = "Nothing to save: load a CSV first.".to_string();
            return;
        };
        let (Some(session), Some(credentials)) = (self.session.as_mut(), self.connected_creds.as_ref()) else {
            self.status = "Not connected: press c to connect first.".to_string();
            return;
        };

        let default_table = materialize::default_table_name(&loaded.path);
        let target = match pipeline::target_from(credentials, Some(self.table_input.as_str()), &default_table) {
            Ok(t) => t,
            Err(err) => {
                self.status = format!("Save failed: {err}");
                return;
            }
        };

        self.status = "Saving...".to_string();
        match materialize::save(session, &loaded.filtered, &target) {
            Ok(rows) => {
                self.status = format!("Wrote {rows} rows to {}", materialize::qualified_name(&target));
            }
            Err(err) => {
                self.status = format!("Save failed: {err}");
            }
        }
    }

    fn creds_mode_label(&self) -> &'static str {
        match self.creds_mode {
            CredsMode::File => "JSON file",
            CredsMode::Manual => "manual input",
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("csvlift", Style::default().fg(Color::Cyan)),
            Span::raw(" — CSV time-series uploader"),
        ]));

        let connection = if self.session.is_some() { "connected" } else { "not connected" };
        let loaded = match &self.loaded {
            Some(l) => format!(
                "{} | rows: {} filtered: {}",
                picker::pretty_path(&l.path),
                l.frame.n_rows(),
                l.filtered.n_rows(),
            ),
            None => "no file loaded".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!("warehouse: {connection} | creds: {} | {loaded}", self.creds_mode_label()),
            Style::default().fg(Color::Gray),
        )));

        if let Some(l) = &self.loaded {
            if !l.dates.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!(
                        "range: {} .. {} (of {} .. {})",
                        l.dates[l.start_idx],
                        l.dates[l.end_idx],
                        l.dates[0],
                        l.dates[l.dates.len() - 1],
                    ),
                    Style::default().fg(Color::Gray),
                )));
            }
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(42), Constraint::Min(0)])
            .split(area);

        self.draw_settings(frame, chunks[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(9),
                Constraint::Min(0),
                Constraint::Length(8),
            ])
            .split(chunks[1]);

        self.draw_preview(frame, right[0]);
        self.draw_chart(frame, right[1], "Close", SeriesKind::Line);
        self.draw_chart(frame, right[2], "Volume", SeriesKind::Area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let file_label = self
            .files
            .get(self.file_cursor)
            .map(|p| picker::pretty_path(p))
            .unwrap_or_else(|| "none found".to_string());

        let masked: String = "*".repeat(self.password.chars().count());
        let items: Vec<ListItem> = FIELDS
            .iter()
            .map(|field| {
                let text = match field {
                    Field::CredsFile => format!("Creds file: {}", self.creds_file),
                    Field::Account => format!("Account:    {}", self.account),
                    Field::User => format!("User:       {}", self.user),
                    Field::Password => format!("Password:   {masked}"),
                    Field::Database => format!("Database:   {}", self.database),
                    Field::Schema => format!("Schema:     {}", self.schema),
                    Field::File => format!("File:       {file_label}"),
                    Field::Table => format!("Table:      {}", self.table_input),
                };
                ListItem::new(text)
            })
            .collect();

        let title = format!("Settings ({})", self.creds_mode_label());
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing {
            let hint = Paragraph::new("Editing…")
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_preview(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Preview").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let text = match &self.loaded {
            Some(l) => crate::report::format_preview(&l.filtered, crate::report::PREVIEW_ROWS),
            None => "Upload a CSV: select a file and press Enter.".to_string(),
        };
        frame.render_widget(Paragraph::new(text), inner);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, column: &str, kind: SeriesKind) {
        let block = Block::default().title(column.to_string()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(loaded) = &self.loaded else {
            return;
        };

        let Some((series, x_bounds, y_bounds)) = chart_series(&loaded.filtered, column, kind) else {
            let msg = Paragraph::new(format!("No `{column}` data in range."))
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let x_label = match (loaded.dates.get(loaded.start_idx), loaded.dates.get(loaded.end_idx)) {
            (Some(s), Some(e)) => format!("{s} .. {e}"),
            _ => "rows".to_string(),
        };

        let widget = SeriesChart {
            series: &series,
            kind,
            x_bounds,
            y_bounds,
            x_label,
            y_label: column,
            fmt_x: fmt_axis_idx,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  Enter edit/load  ←/→ start  Shift+←/→ end  m creds mode  c connect  s save  r rescan  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Build one chart series: (row index, value) with padded bounds.
fn chart_series(frame: &Frame, column: &str, kind: SeriesKind) -> Option<(Vec<(f64, f64)>, [f64; 2], [f64; 2])> {
    let values = frame.numeric_series(column);
    if values.is_empty() {
        return None;
    }

    let series: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();

    let x_max = (series.len() as f64 - 1.0).max(1.0);
    let x_bounds = [0.0, x_max];

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in &series {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }
    // Area charts fill from zero; anchor the axis there.
    if kind == SeriesKind::Area {
        y_min = y_min.min(0.0);
    }
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [y_min - pad, y_max + pad];

    Some((series, x_bounds, y_bounds))
}

fn fmt_axis_idx(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.1}")
}

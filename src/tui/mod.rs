//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing the source, the fetch window
//! and the plotted range, a variable picker, and the dual-axis chart.
//!
//! The plotted range has two channels:
//! - bound inputs: edit `Range start` / `Range end` (Enter to type, ←/→ by a day)
//! - interval keys: `[`/`]` shift, `-`/`+` narrow/widen, `a` full span

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::chart::{ChartModel, LineStyle, palette_rgb};
use crate::config::AppConfig;
use crate::data::{HkmaClient, PageSource, SourceRegistry};
use crate::domain::{Axis, RangeState, SourceId, VariableMeta};
use crate::error::{AppError, ValidationError};
use crate::io::export::{default_export_name, write_dataset_csv};
use crate::range::Bound;
use crate::session::{Notice, NoticeLevel, Session};

mod plotters_chart;

use plotters_chart::DualAxisChart;

/// Days moved by one interval shift key press.
const SHIFT_DAYS: i64 = 7;
/// Days added/removed at each end by one widen/narrow key press.
const RESIZE_DAYS: i64 = 7;

/// Start the TUI.
pub fn run(
    source: SourceId,
    window: RangeState,
    config: &AppConfig,
    registry: &SourceRegistry,
    meta: &VariableMeta,
) -> Result<(), AppError> {
    let client = HkmaClient::new(config.timeout)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(Session::new(source, window), &client, registry, meta);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
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

/// Rows of the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Source,
    FetchFrom,
    FetchTo,
    RangeStart,
    RangeEnd,
    Variables,
}

const FIELDS: [Field; 6] = [
    Field::Source,
    Field::FetchFrom,
    Field::FetchTo,
    Field::RangeStart,
    Field::RangeEnd,
    Field::Variables,
];

impl Field {
    fn is_date(self) -> bool {
        matches!(self, Field::FetchFrom | Field::FetchTo | Field::RangeStart | Field::RangeEnd)
    }
}

struct App<'a, P: PageSource + ?Sized> {
    session: Session,
    pages: &'a P,
    registry: &'a SourceRegistry,
    meta: &'a VariableMeta,
    selected_field: usize,
    var_cursor: usize,
    /// Text typed into a date field; `Some` while editing.
    date_input: Option<String>,
    status: Notice,
    /// Set when a fetch should run after the next redraw, so the
    /// "Fetching..." status is visible during the blocking call.
    pending_fetch: bool,
    export_dir: PathBuf,
}

impl<'a, P: PageSource + ?Sized> App<'a, P> {
    fn new(session: Session, pages: &'a P, registry: &'a SourceRegistry, meta: &'a VariableMeta) -> Self {
        Self {
            session,
            pages,
            registry,
            meta,
            selected_field: 0,
            var_cursor: 0,
            date_input: None,
            status: Notice::info("Fetching..."),
            pending_fetch: true,
            export_dir: PathBuf::from("."),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if self.pending_fetch {
                self.pending_fetch = false;
                self.fetch();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
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

    fn field(&self) -> Field {
        FIELDS[self.selected_field]
    }

    fn fetch(&mut self) {
        self.status = self.session.fetch(self.pages, self.registry);
        let available = self.session.available_variables().len();
        if self.var_cursor >= available {
            self.var_cursor = available.saturating_sub(1);
        }
    }

    fn request_fetch(&mut self) {
        self.pending_fetch = true;
        self.status = Notice::info(format!("Fetching {}...", self.session.source().slug()));
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.date_input.is_some() {
            self.handle_date_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELDS.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => match self.field() {
                Field::Source => self.request_fetch(),
                Field::Variables => self.toggle_at_cursor(),
                field => {
                    let current = self.field_date(field).map(|d| d.to_string()).unwrap_or_default();
                    self.date_input = Some(current);
                    self.status = Notice::info("Editing date (YYYY-MM-DD). Enter to apply, Esc to cancel.");
                }
            },
            KeyCode::Char(' ') if self.field() == Field::Variables => self.toggle_at_cursor(),
            KeyCode::Char('f') => self.request_fetch(),
            KeyCode::Char('[') => self.move_interval(|r| r.shift(-SHIFT_DAYS)),
            KeyCode::Char(']') => self.move_interval(|r| r.shift(SHIFT_DAYS)),
            KeyCode::Char('-') => self.move_interval(|r| r.resize(-RESIZE_DAYS)),
            KeyCode::Char('+') | KeyCode::Char('=') => self.move_interval(|r| r.resize(RESIZE_DAYS)),
            KeyCode::Char('a') => self.move_interval(|r| r.reset()),
            KeyCode::Char('e') => self.export(false),
            KeyCode::Char('E') => self.export(true),
            _ => {}
        }

        false
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        let Some(input) = self.date_input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.date_input = None;
                self.status = Notice::info("Date edit canceled.");
            }
            KeyCode::Enter => {
                let text = input.trim().to_string();
                self.date_input = None;
                match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                    Ok(date) => self.set_field_date(self.field(), date),
                    Err(_) => {
                        self.status = Notice::error(ValidationError::Unparseable { input: text }.to_string());
                    }
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' {
                    input.push(c);
                }
            }
            _ => {}
        }
    }

    fn adjust_field(&mut self, delta: i64) {
        match self.field() {
            Field::Source => {
                let current = self.session.source();
                let next = if delta >= 0 { current.next() } else { current.prev() };
                if self.session.set_source(next) {
                    self.var_cursor = 0;
                    self.status = Notice::info(format!(
                        "source: {} (press f to fetch)",
                        self.registry.get(next).title
                    ));
                }
            }
            Field::Variables => {
                let available = self.session.available_variables().len();
                if available == 0 {
                    return;
                }
                self.var_cursor = if delta >= 0 {
                    (self.var_cursor + 1).min(available - 1)
                } else {
                    self.var_cursor.saturating_sub(1)
                };
            }
            field => {
                if let Some(date) = self.field_date(field) {
                    self.set_field_date(field, date + chrono::Duration::days(delta));
                }
            }
        }
    }

    fn field_date(&self, field: Field) -> Option<NaiveDate> {
        let window = self.session.window();
        let range = self.session.range().map(|r| r.state());
        match field {
            Field::FetchFrom => Some(window.start),
            Field::FetchTo => Some(window.end),
            Field::RangeStart => range.map(|r| r.start),
            Field::RangeEnd => range.map(|r| r.end),
            Field::Source | Field::Variables => None,
        }
    }

    fn set_field_date(&mut self, field: Field, date: NaiveDate) {
        let result = match field {
            Field::FetchFrom => self.session.set_window_bound(Bound::Start(date)),
            Field::FetchTo => self.session.set_window_bound(Bound::End(date)),
            Field::RangeStart => self.session.apply_bound(Bound::Start(date)),
            Field::RangeEnd => self.session.apply_bound(Bound::End(date)),
            Field::Source | Field::Variables => return,
        };
        self.status = match result {
            Ok(()) if matches!(field, Field::FetchFrom | Field::FetchTo) => {
                Notice::info("Fetch window updated (press f to fetch).")
            }
            Ok(()) => Notice::info("Range updated."),
            Err(err) => Notice::error(err.to_string()),
        };
    }

    fn move_interval(&mut self, op: impl FnOnce(&mut crate::range::RangeSync)) {
        match self.session.range_mut() {
            Some(range) => {
                op(range);
                let state = range.state();
                self.status = Notice::info(format!("Range: {} to {}", state.start, state.end));
            }
            None => self.status = Notice::warning("No data loaded."),
        }
    }

    fn toggle_at_cursor(&mut self) {
        let available = self.session.available_variables();
        if let Some(column) = available.get(self.var_cursor) {
            self.session.toggle_variable(column);
        }
    }

    fn export(&mut self, range_only: bool) {
        let Some(dataset) = self.session.dataset() else {
            self.status = Notice::warning("No data loaded.");
            return;
        };
        let rows = if range_only {
            self.session.selected_rows()
        } else {
            dataset.rows()
        };
        let path = self.export_dir.join(default_export_name(self.session.source(), dataset));
        let granularity = self.registry.get(self.session.source()).granularity();
        self.status = match write_dataset_csv(&path, dataset, rows, granularity) {
            Ok(()) => Notice::info(format!("Wrote {} rows to {}", rows.len(), path.display())),
            Err(err) => Notice::error(format!("Export failed: {err}")),
        };
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
        let cfg = self.registry.get(self.session.source());
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("hks", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" | {}", cfg.title)),
        ]));

        let loaded = match (self.session.dataset(), self.session.dataset().and_then(|d| d.span())) {
            (Some(ds), Some(span)) => format!("{} rows, {} to {}", ds.len(), span.min, span.max),
            _ => "no data loaded".to_string(),
        };
        let window = self.session.window();
        lines.push(Line::from(Span::styled(
            format!("window: {} to {} | {loaded}", window.start, window.end),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(area);

        self.draw_chart(frame, chunks[0]);

        let lower = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(0)])
            .split(chunks[1]);
        self.draw_settings(frame, lower[0]);
        self.draw_variables(frame, lower[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let model = self.session.chart(self.meta, self.registry);
        let title = match &model {
            Ok(m) => m.title.clone(),
            Err(_) => self.registry.get(self.session.source()).title.to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let model = match model {
            Ok(m) => m,
            Err(err) => {
                let msg = if self.pending_fetch {
                    "Fetching...".to_string()
                } else {
                    capitalize(&err.to_string())
                };
                let p = Paragraph::new(msg).style(Style::default().fg(Color::Yellow));
                frame.render_widget(p, inner);
                return;
            }
        };

        let (chart_rect, legend_rect) = chart_layout(inner);
        frame.render_widget(DualAxisChart { model: &model }, chart_rect);
        if let Some(rect) = legend_rect {
            let legend = Paragraph::new(legend_line(&model)).wrap(Wrap { trim: true });
            frame.render_widget(legend, rect);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let window = self.session.window();
        let range = self.session.range().map(|r| r.state());
        let value = |field: Field| -> String {
            if field.is_date() && field == self.field() {
                if let Some(input) = &self.date_input {
                    return format!("{input}_");
                }
            }
            match field {
                Field::Source => self.session.source().slug().to_string(),
                Field::FetchFrom => window.start.to_string(),
                Field::FetchTo => window.end.to_string(),
                Field::RangeStart => range.map(|r| r.start.to_string()).unwrap_or_else(|| "-".to_string()),
                Field::RangeEnd => range.map(|r| r.end.to_string()).unwrap_or_else(|| "-".to_string()),
                Field::Variables => format!("{} selected", self.session.selected().len()),
            }
        };

        let items: Vec<ListItem> = FIELDS
            .iter()
            .map(|&field| ListItem::new(format!("{:<12} {}", field_name(field), value(field))))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_variables(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let partition = self.session.partition(self.meta);
        let selected = self.session.selected();
        let items: Vec<ListItem> = self
            .session
            .available_variables()
            .iter()
            .map(|column| {
                let mark = if selected.contains(column) { "[x]" } else { "[ ]" };
                let axis = match partition.axis_of(column) {
                    Some(Axis::Primary) => " L",
                    Some(Axis::Secondary) => " R",
                    None => "",
                };
                ListItem::new(format!("{mark} {} ({column}){axis}", self.meta.display_label(column)))
            })
            .collect();

        let focused = self.field() == Field::Variables;
        let list = List::new(items)
            .block(Block::default().title("Variables").borders(Borders::ALL))
            .highlight_style(if focused {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            })
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.var_cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Enter edit/toggle  f fetch  [ ] shift  - + zoom  a all  e/E export  q quit";
        let status_color = match self.status.level {
            NoticeLevel::Info => Color::Yellow,
            NoticeLevel::Warning => Color::LightRed,
            NoticeLevel::Error => Color::Red,
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(self.status.message.as_str(), Style::default().fg(status_color)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn field_name(field: Field) -> &'static str {
    match field {
        Field::Source => "Source",
        Field::FetchFrom => "Fetch from",
        Field::FetchTo => "Fetch to",
        Field::RangeStart => "Range start",
        Field::RangeEnd => "Range end",
        Field::Variables => "Variables",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Legend as one styled line: `── label` for solid, `╌╌ label (R)` for dashed.
fn legend_line(model: &ChartModel) -> Line<'static> {
    let mut spans = Vec::new();
    for entry in &model.legend {
        let (r, g, b) = palette_rgb(entry.color);
        let stroke = match entry.style {
            LineStyle::Solid => "── ",
            LineStyle::Dashed => "╌╌ ",
        };
        if !spans.is_empty() {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(stroke, Style::default().fg(Color::Rgb(r, g, b))));
        spans.push(Span::raw(entry.text.clone()));
    }
    Line::from(spans)
}

const LEGEND_ROWS: u16 = 2;

/// Split the chart block into plot area and legend rows.
fn chart_layout(inner: Rect) -> (Rect, Option<Rect>) {
    if inner.height <= LEGEND_ROWS + 8 {
        return (inner, None);
    }

    let chart = Rect {
        height: inner.height - LEGEND_ROWS,
        ..inner
    };
    let legend = Rect {
        y: inner.y + chart.height,
        height: LEGEND_ROWS,
        ..inner
    };
    (chart, Some(legend))
}

//! Ratatui-based terminal dashboard.
//!
//! Shows one indicator at a time as a per-country line chart, the latest
//! year's observations, and an on-demand AI narrative for that year.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Terminal,
};

use crate::ai::{GenerationResult, GenerativeProvider, NarrativeState};
use crate::ai::prompt::fmt_value;
use crate::app::pipeline::Session;
use crate::data::{IndicatorSource, LoadOutcome};
use crate::domain::IndicatorTable;
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{series_color, IndicatorPlottersChart};

/// Start the dashboard.
pub fn run(session: Session) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(session);
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

/// Blocking work requested by a key press; run after the next draw so the
/// status line says what is happening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Load,
    Refresh,
    Narrate,
}

struct App<S, P> {
    session: Session<S, P>,
    outcome: Option<LoadOutcome>,
    indicator: usize,
    narrative: Option<GenerationResult>,
    pending: Option<Pending>,
    status: String,
}

impl<S: IndicatorSource, P: GenerativeProvider> App<S, P> {
    fn new(session: Session<S, P>) -> Self {
        Self {
            session,
            outcome: None,
            indicator: 0,
            narrative: None,
            pending: Some(Pending::Load),
            status: "Fetching World Bank data...".to_string(),
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

            if self.pending.is_some() {
                self.run_pending();
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

    /// Returns `true` when the dashboard should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.cycle_indicator(-1),
            KeyCode::Right => self.cycle_indicator(1),
            KeyCode::Char('r') => {
                self.pending = Some(Pending::Refresh);
                self.status = "Refreshing World Bank data...".to_string();
            }
            KeyCode::Char('g') => {
                if self.table().is_empty() {
                    self.status = "No data to describe.".to_string();
                } else {
                    self.pending = Some(Pending::Narrate);
                    self.status = "Generating narrative...".to_string();
                }
            }
            _ => {}
        }
        false
    }

    fn run_pending(&mut self) {
        match self.pending.take() {
            Some(Pending::Load) => self.reload(),
            Some(Pending::Refresh) => {
                self.session.refresh();
                self.narrative = None;
                self.reload();
            }
            Some(Pending::Narrate) => self.narrate(),
            None => {}
        }
    }

    fn reload(&mut self) {
        match self.session.load() {
            Ok(outcome) => {
                self.status = match &outcome.diagnostic {
                    Some(diag) => format!("No data: {diag}"),
                    None if outcome.table.is_empty() => "No observations for this request.".to_string(),
                    None => format!(
                        "Loaded {} rows, {} countries.",
                        outcome.table.len(),
                        outcome.table.countries().len()
                    ),
                };
                self.outcome = Some(outcome);
                let n = self.labels().len().max(1);
                self.indicator %= n;
            }
            Err(err) => {
                self.status = format!("Load failed: {err}");
            }
        }
    }

    fn narrate(&mut self) {
        let Some(outcome) = &self.outcome else {
            return;
        };
        let table = outcome.table.clone();
        let year = match self.session.target_year(&table, None) {
            Ok(year) => year,
            Err(err) => {
                self.status = format!("Generation failed: {err}");
                return;
            }
        };
        let result = self.session.narrate(&table, year);
        self.status = match &result {
            Ok(n) => format!("Narrative for {} by {}.", n.year, n.model),
            Err(err) => format!("Generation failed: {err}"),
        };
        self.narrative = Some(result);
    }

    fn cycle_indicator(&mut self, delta: isize) {
        let n = self.labels().len();
        if n == 0 {
            return;
        }
        self.indicator = (self.indicator as isize + delta).rem_euclid(n as isize) as usize;
        if let Some(label) = self.current_label() {
            self.status = format!("indicator: {label}");
        }
    }

    fn table(&self) -> &IndicatorTable {
        static EMPTY: IndicatorTable = IndicatorTable::empty();
        self.outcome.as_ref().map(|o| o.table.as_ref()).unwrap_or(&EMPTY)
    }

    /// Indicator labels, from the configured `IndicatorSpec` so they exist before the
    /// first load and when it is empty.
    fn labels(&self) -> Vec<String> {
        self.session.config().indicators.labels().map(str::to_string).collect()
    }

    fn current_label(&self) -> Option<String> {
        self.labels().get(self.indicator).cloned()
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
        let config = self.session.config();
        let countries = config.countries.codes().join(",");
        let end = config
            .end_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "now".to_string());
        let label = self.current_label().unwrap_or_else(|| "-".to_string());

        let lines = vec![
            Line::from(vec![
                Span::styled("econ", Style::default().fg(Color::Cyan)),
                Span::raw(" · Global Econ Monitor (World Bank)"),
            ]),
            Line::from(Span::styled(
                format!(
                    "indicator: {label} | countries: {countries} | years: {}..{end} | rows: {}",
                    config.start_year,
                    self.table().len()
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Min(0)])
            .split(area);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(rows[1]);

        self.draw_chart(frame, rows[0]);
        self.draw_latest(frame, bottom[0]);
        self.draw_narrative(frame, bottom[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let label = self.current_label().unwrap_or_default();
        let block = Block::default().title(format!("{label} (%)")).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let table = self.table();
        if table.is_empty() {
            let text = match self.outcome.as_ref().and_then(|o| o.diagnostic.as_deref()) {
                Some(diag) => format!("No data.\n{diag}"),
                None if self.outcome.is_some() => "No data for this request.".to_string(),
                None => "Waiting for data...".to_string(),
            };
            let msg = Paragraph::new(text)
                .style(Style::default().fg(Color::Yellow))
                .wrap(Wrap { trim: true });
            frame.render_widget(msg, inner);
            return;
        }

        let Some((series, x_bounds, y_bounds)) = chart_series(table, &label) else {
            let msg = Paragraph::new(format!("No observations for {label}."))
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let legend_height = 1;
        let (plot_area, legend_area) = if inner.height > legend_height + 8 {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(legend_height)])
                .split(inner);
            (parts[0], Some(parts[1]))
        } else {
            (inner, None)
        };

        let (chart_rect, insets) = chart_layout(plot_area);
        let widget = IndicatorPlottersChart {
            series: &series,
            x_bounds,
            y_bounds,
            x_label: "year",
            y_label: label.clone(),
            fmt_x: fmt_axis_year,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, plot_area, chart_rect, insets, x_bounds, y_bounds);
        }

        if let Some(legend_area) = legend_area {
            let mut spans = Vec::new();
            for (idx, (country, _)) in series.iter().enumerate() {
                spans.push(Span::styled("━ ", Style::default().fg(series_color(idx))));
                spans.push(Span::raw(format!("{country}  ")));
            }
            frame.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), legend_area);
        }
    }

    fn draw_latest(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let table = self.table();
        let Some(year) = table.latest_observed_year() else {
            let block = Block::default().title("Latest").borders(Borders::ALL);
            frame.render_widget(Paragraph::new("-").block(block), area);
            return;
        };

        let slice = table.for_year(year);
        let header = Row::new(
            std::iter::once("country".to_string()).chain(slice.labels.iter().cloned()),
        )
        .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = slice.rows.iter().map(|r| {
            Row::new(std::iter::once(r.country.clone()).chain(r.values.iter().map(|v| fmt_value(*v))))
        });
        let widths = std::iter::once(Constraint::Length(8))
            .chain(slice.labels.iter().map(|_| Constraint::Min(10)))
            .collect::<Vec<_>>();

        let widget = Table::new(rows, widths)
            .header(header)
            .block(Block::default().title(format!("Latest ({year})")).borders(Borders::ALL));
        frame.render_widget(widget, area);
    }

    fn draw_narrative(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let (title, body, style) = match &self.narrative {
            None => (
                "AI analysis".to_string(),
                "Press g to generate an analysis of the latest year.".to_string(),
                Style::default().fg(Color::Gray),
            ),
            Some(Ok(n)) => (
                format!("AI analysis ({}, {})", n.year, n.model),
                n.text.trim().to_string(),
                Style::default(),
            ),
            Some(Err(err)) => (
                "AI analysis".to_string(),
                format!("Generation failed: {err}"),
                Style::default().fg(Color::Red),
            ),
        };
        let p = Paragraph::new(body)
            .style(style)
            .wrap(Wrap { trim: false })
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ indicator  g analyze  r refresh  q quit";
        let state = self.session.generator().state();
        let state_color = match state {
            NarrativeState::Failed => Color::Red,
            _ if state.is_terminal() => Color::Green,
            _ => Color::Cyan,
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(narrative_state_label(state), Style::default().fg(state_color)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn narrative_state_label(state: &NarrativeState) -> String {
    match state {
        NarrativeState::Idle => "ai: idle".to_string(),
        NarrativeState::ModelSelecting => "ai: selecting model".to_string(),
        NarrativeState::Generating { model } => format!("ai: generating ({model})"),
        NarrativeState::Succeeded => "ai: done".to_string(),
        NarrativeState::Failed => "ai: failed".to_string(),
    }
}

type ChartSeries = Vec<(String, Vec<(f64, f64)>)>;

/// Build per-country chart series and padded bounds for one indicator.
///
/// Returns `None` when the indicator has no observations at all.
fn chart_series(table: &IndicatorTable, label: &str) -> Option<(ChartSeries, [f64; 2], [f64; 2])> {
    let series: ChartSeries = table
        .countries()
        .into_iter()
        .map(|c| {
            let points = table
                .series(label, c)
                .into_iter()
                .map(|(year, v)| (year as f64, v))
                .collect();
            (c.to_string(), points)
        })
        .collect();

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (_, points) in &series {
        for &(x, y) in points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !x_min.is_finite() || !y_min.is_finite() {
        return None;
    }

    // A single year still needs a non-empty x range.
    if x_max <= x_min {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    Some((series, [x_min, x_max], [y_min - pad, y_max + pad]))
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.1}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 7,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_year(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_value(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("year")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }
}

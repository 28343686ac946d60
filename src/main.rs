use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset as ChartDataset,
    GraphType, Paragraph, Row, Table,
};

use afl_terminal::charts::{BarSeries, CrowdSeries, MarginSeries};
use afl_terminal::classifier::LABELS;
use afl_terminal::colours::{Rgb, team_colour_or_neutral};
use afl_terminal::config::{self, Settings};
use afl_terminal::dataset::Dataset;
use afl_terminal::export::export_workbook;
use afl_terminal::logging;
use afl_terminal::state::{screen_label, AppState, Screen};

struct App {
    state: AppState,
    should_quit: bool,
    export_path: PathBuf,
}

impl App {
    fn new(state: AppState, export_path: PathBuf) -> Self {
        Self {
            state,
            should_quit: false,
            export_path,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.set_screen(Screen::Overview),
            KeyCode::Char('2') => self.state.set_screen(Screen::Team),
            KeyCode::Char('3') => self.state.set_screen(Screen::Season),
            KeyCode::Char('4') => self.state.set_screen(Screen::Model),
            KeyCode::Right | KeyCode::Tab => self.state.next_screen(),
            KeyCode::Left | KeyCode::BackTab => self.state.prev_screen(),
            KeyCode::Char('t') | KeyCode::Down => self.state.next_team(),
            KeyCode::Char('T') | KeyCode::Up => self.state.prev_team(),
            KeyCode::Char('y') => self.state.next_season(),
            KeyCode::Char('Y') => self.state.prev_season(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn export(&mut self) {
        let team = self.state.team();
        let season = self.state.season;
        match export_workbook(&self.export_path, self.state.dataset.records(), team, season) {
            Ok(report) => {
                let msg = format!(
                    "[INFO] Exported {} teams, {} games to {}",
                    report.teams,
                    report.season_games,
                    self.export_path.display()
                );
                self.state.push_log(msg);
            }
            Err(err) => {
                tracing::warn!(error = %err, "export failed");
                self.state.push_log(format!("[WARN] Export failed: {err}"));
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    let settings = Settings::parse();
    settings.validate()?;
    logging::init_file_logger(&settings.log_file)?;
    let svm_config = settings.svm.config()?;

    let dataset = Dataset::load(&settings.data.csv)
        .with_context(|| format!("load match results from {}", settings.data.csv.display()))?;
    let loaded = format!(
        "[INFO] Loaded {} matches from {}",
        dataset.len(),
        dataset
            .source()
            .unwrap_or(settings.data.csv.as_path())
            .display()
    );

    let mut state = AppState::new(dataset, &settings.data.team, settings.data.season, svm_config);
    state.push_log(loaded);
    let mut app = App::new(state, settings.export_path.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = %err, "terminal loop failed");
    }
    res.context("terminal loop failed")
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Overview => render_overview(frame, chunks[1], &app.state),
        Screen::Team => render_team(frame, chunks[1], &app.state),
        Screen::Season => render_season(frame, chunks[1], &app.state),
        Screen::Model => render_model(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = format!(
        "AFL TERMINAL | {} | Team: {} | Season: {} | {} matches",
        screen_label(state.screen),
        state.team(),
        state.season,
        state.dataset.len()
    );
    let line1 = format!("   __   {title}");
    let line2 = "  (__)".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text() -> &'static str {
    "1-4 Screens | ←/→ Switch | t/T Team | y/Y Season | e Export | ? Help | q Quit"
}

fn colour(rgb: Rgb) -> Color {
    let rgb = rgb.visible_on_dark();
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

fn render_empty(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let empty = Paragraph::new(message)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(empty, area);
}

fn render_overview(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(40)])
        .split(area);

    render_win_bars(frame, cols[0], &state.league);
    render_ranking_list(frame, cols[1], &state.league, "Ladder by win %");
}

fn render_team(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(40)])
        .split(rows[1]);

    render_win_bars(frame, rows[0], &state.by_day);
    render_win_bars(frame, bottom[0], &state.by_opposition);
    render_ranking_list(frame, bottom[1], &state.by_opposition, "Against each team");
}

fn render_season(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let line = colour(team_colour_or_neutral(state.team()));

    render_margin_chart(frame, rows[0], &state.margin, line);
    render_crowd_chart(frame, rows[1], &state.crowd);
}

fn render_win_bars(frame: &mut Frame, area: Rect, series: &BarSeries) {
    if series.is_empty() {
        render_empty(frame, area, &series.title, "No matches for this selection");
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let count = series.rows.len();
    const GAP: usize = 1;
    let bar_width = ((inner_width + GAP) / count)
        .saturating_sub(GAP)
        .clamp(1, 12);

    let bars: Vec<Bar> = series
        .rows
        .iter()
        .map(|row| {
            let fill = colour(series.bar_colour(row));
            Bar::default()
                .value(u64::from(row.win_pct))
                .text_value(format!("{}", row.win_pct))
                .label(Line::from(short_label(&row.group, bar_width)))
                .style(Style::default().fg(fill))
                .value_style(Style::default().fg(Color::Black).bg(fill))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(series.title.clone())
                .borders(Borders::ALL),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width as u16)
        .bar_gap(GAP as u16)
        .max(100);
    frame.render_widget(chart, area);
}

fn short_label(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let initials: String = name
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .collect();
    if initials.chars().count() > 1 && initials.chars().count() <= width {
        return initials;
    }
    name.chars().take(width).collect()
}

fn render_ranking_list(frame: &mut Frame, area: Rect, series: &BarSeries, title: &str) {
    let text = if series.is_empty() {
        "No matches".to_string()
    } else {
        series
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                format!(
                    "{:>2}. {:<24} {:>3}% ({}/{})",
                    i + 1,
                    row.group,
                    row.win_pct,
                    row.wins,
                    row.matches
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let list = Paragraph::new(text)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(list, area);
}

fn round_axis_labels(rounds: &[String]) -> Vec<Span<'static>> {
    match rounds.len() {
        0 => Vec::new(),
        1 => vec![Span::raw(rounds[0].clone())],
        n => vec![
            Span::raw(rounds[0].clone()),
            Span::raw(rounds[n / 2].clone()),
            Span::raw(rounds[n - 1].clone()),
        ],
    }
}

fn x_bounds(rounds: &[String]) -> [f64; 2] {
    [0.0, (rounds.len().saturating_sub(1)).max(1) as f64]
}

fn render_margin_chart(frame: &mut Frame, area: Rect, series: &MarginSeries, line: Color) {
    if series.is_empty() {
        render_empty(frame, area, &series.title, "No matches for this team and season");
        return;
    }

    let datasets = vec![
        ChartDataset::default()
            .name("Margin")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(line))
            .data(&series.margins),
        ChartDataset::default()
            .name("Draw")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&series.zero_line),
    ];

    let [lo, hi] = series.y_bounds();
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(series.title.clone())
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Round (bye rounds omitted)")
                .bounds(x_bounds(&series.rounds))
                .labels(round_axis_labels(&series.rounds)),
        )
        .y_axis(
            Axis::default()
                .title("Margin")
                .bounds([lo, hi])
                .labels(vec![
                    Span::raw(format!("{lo:.0}")),
                    Span::raw("0"),
                    Span::raw(format!("{hi:.0}")),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_crowd_chart(frame: &mut Frame, area: Rect, series: &CrowdSeries) {
    if series.is_empty() {
        render_empty(frame, area, &series.title, "No matches for this team and season");
        return;
    }

    let mut datasets = vec![
        ChartDataset::default()
            .name("Win")
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::LightGreen))
            .data(&series.wins),
        ChartDataset::default()
            .name("Loss")
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Red))
            .data(&series.losses),
    ];
    for reference in &series.references {
        datasets.push(
            ChartDataset::default()
                .name(reference.label)
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Rgb(
                    reference.colour.r,
                    reference.colour.g,
                    reference.colour.b,
                )))
                .data(&reference.points),
        );
    }

    let y_max = series.y_max();
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(series.title.clone())
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Round (bye rounds omitted)")
                .bounds(x_bounds(&series.rounds))
                .labels(round_axis_labels(&series.rounds)),
        )
        .y_axis(
            Axis::default()
                .title("Crowd")
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max / 2.0)),
                    Span::raw(format!("{y_max:.0}")),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_model(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("SVM Win/Loss confusion matrix")
        .borders(Borders::ALL);

    let report = match &state.classifier {
        Some(Ok(report)) => report,
        Some(Err(err)) => {
            let msg = Paragraph::new(format!("Model unavailable: {err}"))
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(msg, area);
            return;
        }
        None => {
            let msg = Paragraph::new("Model not trained yet").block(block);
            frame.render_widget(msg, area);
            return;
        }
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(1)])
        .split(inner);

    let header = Row::new(
        std::iter::once("Actual \\ Predicted".to_string())
            .chain(LABELS.iter().map(|l| l.label().to_string())),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = LABELS
        .iter()
        .map(|actual| {
            let mut cells = vec![actual.label().to_string()];
            cells.extend(
                LABELS
                    .iter()
                    .map(|predicted| report.matrix.get(*actual, *predicted).to_string()),
            );
            let style = if actual.is_win() {
                Style::default().fg(Color::LightGreen)
            } else {
                Style::default().fg(Color::Red)
            };
            Row::new(cells).style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(table, parts[0]);

    let summary = format!(
        "{} training matches, {} test matches, {} features\n\
         Accuracy: {:.1}%\n\
         Linear SVM (Pegasos), lambda {}, {} epochs, seed {}",
        report.train_size,
        report.test_size,
        report.features,
        report.accuracy() * 100.0,
        state.svm_config.lambda,
        state.svm_config.epochs,
        state.svm_config.seed
    );
    frame.render_widget(Paragraph::new(summary), parts[1]);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "AFL Terminal - Help",
        "",
        "Screens:",
        "  1            Overview (win % per team)",
        "  2            Team (day of week, opposition)",
        "  3            Season (margin, crowd)",
        "  4            Model (SVM confusion matrix)",
        "  ←/→ Tab      Previous / next screen",
        "",
        "Selection:",
        "  t / ↓        Next team",
        "  T / ↑        Previous team",
        "  y / Y        Next / previous season",
        "",
        "  e            Export xlsx",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

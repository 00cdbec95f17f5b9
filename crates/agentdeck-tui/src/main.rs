//! Agentdeck TUI - live orchestrator dashboard
//!
//! This TUI provides a soft-realtime view of:
//! - Agent status across the whole orchestrator
//! - The decision stream with a heartbeat filter
//! - Daily activity and per-agent performance
//! - Event-stream connectivity and knowledge-retrieval activity

use std::io;
use std::time::Duration;

use chrono::Utc;
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
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use agentdeck_core::api::ApiClient;
use agentdeck_core::config::Config;
use agentdeck_core::model::{AgentStatus, Suggestion};
use agentdeck_core::sync::{DashboardState, SyncHandle, SyncOptions, Synchronizer, visible_decisions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Live,
    Stream,
    Analytics,
}

struct App {
    tab: Tab,
    show_heartbeats: bool,
    suggestions: Vec<Suggestion>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = ApiClient::builder()
        .base_url(config.server.resolved_base_url())
        .timeout_secs(config.server.timeout_secs)
        .build()?;
    let handle = Synchronizer::spawn(client.clone(), SyncOptions::from(&config.sync));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, handle.clone(), client).await;

    // Restore terminal
    handle.shutdown().await;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    handle: SyncHandle,
    client: ApiClient,
) -> anyhow::Result<()> {
    let mut app = App {
        tab: Tab::Live,
        show_heartbeats: false,
        // Suggestions are ephemeral; an unreachable factory just means an
        // empty panel until the next refresh
        suggestions: client.suggestions().await.unwrap_or_default(),
    };

    loop {
        let state = handle.snapshot();
        terminal.draw(|frame| draw(frame, &app, &state))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('1') => app.tab = Tab::Live,
                    KeyCode::Char('2') => app.tab = Tab::Stream,
                    KeyCode::Char('3') => app.tab = Tab::Analytics,
                    KeyCode::Char('h') => app.show_heartbeats = !app.show_heartbeats,
                    KeyCode::Char('r') => {
                        handle.refresh().await;
                        app.suggestions = client.suggestions().await.unwrap_or_default();
                    }
                    _ => {}
                }
            }
        }
    }
}

fn draw(frame: &mut ratatui::Frame, app: &App, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], app, state);

    match app.tab {
        Tab::Live => draw_live(frame, chunks[1], app, state),
        Tab::Stream => draw_stream(frame, chunks[1], app, state),
        Tab::Analytics => draw_analytics(frame, chunks[1], state),
    }

    let footer = Paragraph::new("q: Quit | 1: Live | 2: Stream | 3: Analytics | h: Heartbeats | r: Refresh")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[2]);
}

fn draw_header(frame: &mut ratatui::Frame, area: Rect, app: &App, state: &DashboardState) {
    let connection = if state.connected {
        Span::styled("LIVE", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("OFFLINE", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
    };

    let mut spans = vec![
        Span::styled("Agentdeck", Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        connection,
        Span::raw(format!("  agents: {}", state.agents.len())),
    ];
    if state.retrieval_active(Utc::now()) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("KB", Style::default().fg(Color::Magenta)));
    }

    let tab_name = match app.tab {
        Tab::Live => "Live",
        Tab::Stream => "Stream",
        Tab::Analytics => "Analytics",
    };
    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(tab_name));
    frame.render_widget(header, area);
}

fn status_style(status: AgentStatus) -> Style {
    match status {
        AgentStatus::Idle => Style::default().fg(Color::Green),
        AgentStatus::Deciding => Style::default().fg(Color::Yellow),
        AgentStatus::Error => Style::default().fg(Color::Red),
        AgentStatus::Unknown => Style::default().fg(Color::DarkGray),
    }
}

fn draw_live(frame: &mut ratatui::Frame, area: Rect, app: &App, state: &DashboardState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(6)])
        .split(area);

    let lines: Vec<Line> = if state.agents.is_empty() {
        vec![Line::from("No agents reported yet. Waiting for the backend...")]
    } else {
        state
            .agents
            .iter()
            .map(|agent| {
                let last = agent
                    .last_decision
                    .map(|ts| ts.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "never".to_string());
                Line::from(vec![
                    Span::styled(
                        format!("{:10}", agent.status.as_str()),
                        status_style(agent.status),
                    ),
                    Span::styled(
                        format!(" {:18}", agent.name),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(" {:24}", agent.model)),
                    Span::styled(
                        format!(" last decision: {}", last),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect()
    };

    let agents = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Agents"));
    frame.render_widget(agents, rows[0]);

    let suggestion_lines: Vec<Line> = if app.suggestions.is_empty() {
        vec![Line::from("No suggestions right now")]
    } else {
        app.suggestions
            .iter()
            .map(|s| {
                Line::from(vec![
                    Span::styled(s.title.clone(), Style::default().fg(Color::Yellow)),
                    Span::styled(
                        format!("  {}", truncate(&s.reason, 60)),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect()
    };
    let suggestions = Paragraph::new(suggestion_lines)
        .block(Block::default().borders(Borders::ALL).title("Suggested Agents"));
    frame.render_widget(suggestions, rows[1]);
}

fn draw_stream(frame: &mut ratatui::Frame, area: Rect, app: &App, state: &DashboardState) {
    let visible = visible_decisions(&state.decisions, app.show_heartbeats);

    let lines: Vec<Line> = if visible.is_empty() {
        vec![Line::from("No relevant decisions found. Waiting for agents...")]
    } else {
        visible
            .iter()
            .map(|d| {
                let reasoning = d.reasoning.as_deref().unwrap_or("");
                let mut spans = vec![
                    Span::styled(
                        d.timestamp.format("%H:%M:%S").to_string(),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        format!(" {:12}", d.agent_id),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(format!(" {:30}", truncate(reasoning, 30))),
                    Span::styled(
                        format!(" {}", truncate(&d.action.summary(), 40)),
                        if d.action.is_actionable() {
                            Style::default().fg(Color::Yellow)
                        } else {
                            Style::default().fg(Color::DarkGray)
                        },
                    ),
                ];
                if d.dry_run {
                    spans.push(Span::styled(
                        " [dry-run]",
                        Style::default().fg(Color::Blue),
                    ));
                }
                Line::from(spans)
            })
            .collect()
    };

    let title = if app.show_heartbeats {
        "Decision Stream (heartbeats shown)"
    } else {
        "Decision Stream (heartbeats hidden)"
    };
    let stream = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(stream, area);
}

fn draw_analytics(frame: &mut ratatui::Frame, area: Rect, state: &DashboardState) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let daily_lines: Vec<Line> = if state.daily.is_empty() {
        vec![Line::from("No daily stats available")]
    } else {
        state
            .daily
            .iter()
            .map(|row| {
                Line::from(vec![
                    Span::styled(row.date.clone(), Style::default().fg(Color::Cyan)),
                    Span::raw(format!(" total: {:4}  ", row.total())),
                    Span::styled(
                        row.counts
                            .iter()
                            .map(|(agent, n)| format!("{}: {}", agent, n))
                            .collect::<Vec<_>>()
                            .join("  "),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect()
    };
    let daily = Paragraph::new(daily_lines)
        .block(Block::default().borders(Borders::ALL).title("Daily Activity"));
    frame.render_widget(daily, halves[0]);

    let perf_lines: Vec<Line> = if state.performance.is_empty() {
        vec![Line::from("No performance stats available")]
    } else {
        state
            .performance
            .iter()
            .map(|(agent, perf)| {
                Line::from(vec![
                    Span::styled(format!("{:12}", agent), Style::default().fg(Color::Cyan)),
                    Span::raw(format!(
                        " 24h: {:4}  errors: {:5.1}%  top tool: {}",
                        perf.decisions_24h,
                        perf.error_rate * 100.0,
                        if perf.top_tool.is_empty() {
                            "none"
                        } else {
                            perf.top_tool.as_str()
                        }
                    )),
                ])
            })
            .collect()
    };
    let perf = Paragraph::new(perf_lines)
        .block(Block::default().borders(Borders::ALL).title("Performance (24h)"));
    frame.render_widget(perf, halves[1]);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}\u{2026}", cut)
    }
}

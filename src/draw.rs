use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};

use crate::app::{App, MenuItem, Prompt};
use crate::components::box_score::BoxScoreTable;
use crate::components::player_list::PlayerList;
use crate::state::app_state::{InputMode, StatusLevel};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use hooptag_core::events::template_for;
use hooptag_core::{Event, Player, TaggingStep, format_time};
use log::error;

static TABS: &[&str; 4] = &["Tagging", "Play-by-Play", "Box Score", "Roster"];

const RECENT_EVENTS: usize = 8;

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Tagging => draw_tagging(f, layout.main, app),
            MenuItem::PlayByPlay => draw_play_by_play(f, layout.main, app),
            MenuItem::BoxScore => draw_box_score(f, layout.main, app),
            MenuItem::Roster => draw_roster(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }
        draw_status(f, layout.status, app);
        let area = f.area();
        draw_loading_spinner(f, area, app, loading);
    });

    if let Err(e) = result {
        error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = |tab: MenuItem| match tab {
        MenuItem::Tagging => 0,
        MenuItem::PlayByPlay => 1,
        MenuItem::BoxScore => 2,
        MenuItem::Roster => 3,
        MenuItem::Help => 0,
    };
    let selected = match app.state.active_tab {
        MenuItem::Help => tab_index(app.state.previous_tab),
        tab => tab_index(tab),
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(selected)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

// ---------------------------------------------------------------------------
// Tagging
// ---------------------------------------------------------------------------

fn draw_tagging(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Tagging ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !app.state.ready {
        draw_placeholder(f, inner, "Loading roster and project...");
        return;
    }

    let [header, content] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    f.render_widget(Paragraph::new(session_header(app)), header);

    let [left, right] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(content);

    let prompt = app.prompt();
    let on_court = app.session.lineup().on_court().len();
    let title = match prompt {
        Prompt::StartingFive => format!(" Starting five ({on_court}/5) "),
        _ => " On court ".to_string(),
    };
    let list_block = default_border(Color::DarkGray).title(title);
    let list_area = list_block.inner(left);
    f.render_widget(list_block, left);

    let players = app.tagging_players();
    let lineup = app.session.lineup();
    let marked = |p: &Player| lineup.contains(&p.id);
    let active = app.session.tagging_step().player().and_then(|p| p.id.as_deref());
    let cursor = (prompt != Prompt::SubstitutionIn).then_some(app.state.player_cursor);
    f.render_widget(
        PlayerList { players: &players, cursor, is_marked: &marked, active },
        list_area,
    );

    let [prompt_area, recent_area] =
        Layout::vertical([Constraint::Percentage(45), Constraint::Fill(1)]).areas(right);
    draw_prompt(f, prompt_area, app, prompt);
    draw_recent_events(f, recent_area, app);
}

fn session_header(app: &App) -> Line<'static> {
    let ctx = app.session.context();
    let game = ctx.game_number.map_or("-".to_string(), |g| g.to_string());
    let playback = if app.state.playback.playing { "▶" } else { "⏸" };
    let playback_state = &app.state.playback;
    let (link, link_color) = match (&playback_state.last_error, playback_state.connected) {
        (_, true) => ("player online".to_string(), Color::Green),
        (Some(err), false) => (format!("player offline: {err}"), Color::Red),
        (None, false) => ("player offline".to_string(), Color::Red),
    };
    let dirty = if app.session.is_dirty() { " *" } else { "" };
    let saved = app
        .state
        .save
        .last_saved_id
        .as_deref()
        .map(|id| format!("  saved as {id}"))
        .unwrap_or_default();

    Line::from(vec![
        Span::styled(format!("Game {game} · Video {} ", ctx.video_index), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{} {playback} ", format_time(app.session.current_time())),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(link, Style::default().fg(link_color)),
        Span::styled(
            format!("  {} events{dirty}{saved}", app.session.events().len()),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

fn draw_prompt(f: &mut Frame, area: Rect, app: &App, prompt: Prompt) {
    let block = default_border(Color::DarkGray).title(format!(" {} ", app.session.tagging_step().name()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let name = app
        .session
        .tagging_step()
        .player()
        .map(|p| p.name.clone())
        .unwrap_or_default();

    let mut lines: Vec<Line> = match prompt {
        Prompt::StartingFive => vec![
            Line::from("Enter toggles a starter, five confirm the lineup."),
            Line::from("L restores the last saved lineup."),
        ],
        Prompt::Player => vec![
            Line::from("Enter selects the player to tag."),
            Line::from("Q quarter  T timeout  h highlight  [ ] action  l note"),
        ],
        Prompt::Action => vec![
            Line::from(Span::styled(format!("Tagging {name}"), Style::default().fg(Color::Yellow))),
            Line::from("s shot  a assist  r rebound  t steal  b block"),
            Line::from("o turnover  f foul  u substitution  Esc cancel"),
        ],
        Prompt::ShotType => vec![
            Line::from(Span::styled(format!("{name} shot"), Style::default().fg(Color::Yellow))),
            Line::from("1 free throw  2 two  3 three  Esc cancel"),
        ],
        Prompt::ShotResult => {
            let points = match app.session.tagging_step() {
                TaggingStep::AwaitingShotResult { shot, .. } => shot.points(),
                _ => 0,
            };
            vec![
                Line::from(Span::styled(format!("{name} {points}-pt shot"), Style::default().fg(Color::Yellow))),
                Line::from("m made  x missed  Esc cancel"),
            ]
        }
        Prompt::SubstitutionIn => vec![Line::from(Span::styled(
            format!("{name} out. Who comes in? (↑/↓, Enter)"),
            Style::default().fg(Color::Yellow),
        ))],
    };

    if let Some(input) = input_line(app) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(input, Style::default().fg(Color::Yellow))));
    }

    if prompt != Prompt::SubstitutionIn {
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        return;
    }

    let [text_area, bench_area] =
        Layout::vertical([Constraint::Length(lines.len() as u16), Constraint::Fill(1)]).areas(inner);
    f.render_widget(Paragraph::new(lines), text_area);
    let bench = app.session.bench();
    let never = |_: &Player| false;
    f.render_widget(
        PlayerList { players: &bench, cursor: Some(app.state.bench_cursor), is_marked: &never, active: None },
        bench_area,
    );
}

fn draw_recent_events(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::DarkGray).title(" Recent ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let events = app.sorted_events();
    let start = events.len().saturating_sub(RECENT_EVENTS);
    let lines: Vec<Line> = events[start..].iter().rev().map(|e| Line::from(event_text(e))).collect();
    f.render_widget(Paragraph::new(lines), inner);
}

pub fn event_text(event: &Event) -> String {
    let icon = template_for(event.kind).map(|t| t.icon).unwrap_or("·");
    format!("{} {icon} {}", format_time(event.timestamp), event.description)
}

fn input_line(app: &App) -> Option<String> {
    let label = match app.state.input.mode {
        InputMode::LearningNote => "Note",
        InputMode::AddPlayer => "Name, jersey, position",
        _ => return None,
    };
    Some(format!("{label}> {}_", app.state.input.buffer))
}

// ---------------------------------------------------------------------------
// Play-by-play
// ---------------------------------------------------------------------------

fn draw_play_by_play(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Play-by-Play ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let events = app.sorted_events();
    if events.is_empty() {
        draw_placeholder(f, inner, "No events tagged yet");
        return;
    }

    let picking = matches!(app.state.input.mode, InputMode::PickRebounder { .. });
    let (list_area, picker_area) = if picking {
        let [list, picker] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(inner);
        (list, Some(picker))
    } else {
        (inner, None)
    };

    let [legend, list] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(list_area);
    f.render_widget(
        Paragraph::new("↑/↓ move  Enter seek  d delete  r rebound for missed shot")
            .style(Style::default().fg(Color::DarkGray)),
        legend,
    );

    let visible = list.height as usize;
    let cursor = app.state.event_cursor;
    let offset = cursor.saturating_sub(visible.saturating_sub(1));
    let lines: Vec<Line> = events
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(idx, e)| {
            let style = if idx == cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(Span::styled(event_text(e), style))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), list);

    if let Some(picker_area) = picker_area {
        let picker_block = default_border(Color::Yellow).title(" Rebound by ");
        let picker_inner = picker_block.inner(picker_area);
        f.render_widget(picker_block, picker_area);
        let candidates = app.rebound_candidates();
        let lineup = app.session.lineup();
        let marked = |p: &Player| lineup.contains(&p.id);
        f.render_widget(
            PlayerList {
                players: &candidates,
                cursor: Some(app.state.input.cursor),
                is_marked: &marked,
                active: None,
            },
            picker_inner,
        );
    }
}

// ---------------------------------------------------------------------------
// Box score
// ---------------------------------------------------------------------------

fn draw_box_score(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Box Score ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.session.roster().is_empty() {
        draw_placeholder(f, inner, "No players on the roster");
        return;
    }
    let stats = app.session.stats();
    f.render_widget(BoxScoreTable { stats: &stats }, inner);
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

fn draw_roster(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(format!(" Roster ({}) ", app.session.roster().len()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [legend, list, input] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
    f.render_widget(
        Paragraph::new("↑/↓ move  + add player  d remove  ● on court")
            .style(Style::default().fg(Color::DarkGray)),
        legend,
    );

    let players = app.session.roster().sorted_by_jersey();
    let lineup = app.session.lineup();
    let marked = |p: &Player| lineup.contains(&p.id);
    f.render_widget(
        PlayerList { players: &players, cursor: Some(app.state.roster_cursor), is_marked: &marked, active: None },
        list,
    );

    if let Some(line) = input_line(app) {
        f.render_widget(Paragraph::new(line).style(Style::default().fg(Color::Yellow)), input);
    }
}

// ---------------------------------------------------------------------------
// Help, logs, status
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = [
        ("1-4", "switch tab (Tagging, Play-by-Play, Box Score, Roster)"),
        ("↑/↓ Enter", "move and select"),
        ("Esc", "cancel the current selection"),
        ("s a r t b o f u", "shot assist rebound steal block turnover foul substitution"),
        ("1 2 3 / m x", "shot value / made or missed"),
        ("Q T h [ ]", "quarter start, timeout, highlight, action start/end"),
        ("l", "learning note"),
        ("R / L", "reset lineup / restore last lineup"),
        ("space ← →", "play-pause, seek 5s"),
        ("n / p", "next / previous video"),
        ("w / e", "save project / export stats"),
        ("g", "retry a failed project load"),
        ("F  \"", "full screen, logs"),
        ("q", "quit"),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(format!("{keys:>16}  "), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = tui_logger::TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray));
    f.render_widget(logs, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let Some(status) = app.state.status.as_ref() else {
        return;
    };
    let color = match status.level {
        StatusLevel::Info => Color::Gray,
        StatusLevel::Warn => Color::Yellow,
        StatusLevel::Error => Color::Red,
    };
    f.render_widget(Paragraph::new(status.text.as_str()).style(Style::default().fg(color)), area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}

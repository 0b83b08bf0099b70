mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::refresher::TimePoller;
use crate::state::video_link::{VideoCommand, VideoEvent, VideoLink};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::time::Instant;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal();

    tui_logger::init_logger(log::LevelFilter::Error)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let app = App::new();
    let store = app.settings.project_store();
    let roster = app.settings.roster_client();
    let player_ws = app.settings.player_ws.clone();
    let app = Arc::new(Mutex::new(app));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (video_cmd_tx, video_cmd_rx) = mpsc::channel::<VideoCommand>(100);
    let (video_evt_tx, video_evt_rx) = mpsc::channel::<VideoEvent>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Roster and project store thread
    let network_worker = NetworkWorker::new(store, roster, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Video player link thread
    info!("connecting to video player at {player_ws}");
    let video_link = VideoLink {
        url: player_ws,
        commands: video_cmd_rx,
        events: video_evt_tx,
    };
    let video_task = tokio::spawn(video_link.run());

    // Playback clock and autosave ticks
    let time_poller = TimePoller::new(ui_event_tx.clone());
    let poller_task = tokio::spawn(time_poller.run());

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(
        terminal,
        app,
        ui_event_rx,
        network_req_tx,
        network_resp_rx,
        video_cmd_tx,
        video_evt_rx,
    )
    .await;

    input_handler.abort();
    network_task.abort();
    video_task.abort();
    poller_task.abort();

    Ok(())
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("hooptag {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "hooptag - basketball video tagging in the terminal

Usage:
  hooptag
  hooptag --help
  hooptag --version

Environment:
  HOOPTAG_GAME          Game number the tagged videos belong to (default 1)
  HOOPTAG_VIDEO_INDEX   Playlist position of the first video (default 1)
  HOOPTAG_PLAYER_WS     Video player relay URL (default ws://127.0.0.1:8788)
  HOOPTAG_STORE_URL     Project store base URL; local files when unset
  HOOPTAG_ROSTER_URL    Roster service base URL
  HOOPTAG_ROSTER_JSON   Path to a roster JSON file
  HOOPTAG_LOG           Log level (error, warn, info, debug, trace)"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    video_commands: mpsc::Sender<VideoCommand>,
    mut video_events: mpsc::Receiver<VideoEvent>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw =
                    handle_ui_event(ui_event, &app, &network_requests, &video_commands).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(video_event) = video_events.recv() => {
                handle_video_event(video_event, &app, &network_requests).await;
                let mut app_guard = app.lock().await;
                draw::draw(&mut terminal, &mut app_guard, loading);
            }
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    video_commands: &mpsc::Sender<VideoCommand>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let _ = network_requests.send(NetworkRequest::LoadRoster).await;
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests, video_commands).await;
            true
        }
        UiEvent::Resize => true,
        UiEvent::Tick => {
            let mut guard = app.lock().await;
            let connected = guard.state.playback.connected;
            let autosave = guard.autosave_request(Instant::now());
            drop(guard);

            if connected {
                let _ = video_commands.send(VideoCommand::QueryTime).await;
            }
            match autosave {
                Some(request) => {
                    let _ = network_requests.send(request).await;
                    true
                }
                None => false,
            }
        }
    }
}

async fn handle_video_event(
    event: VideoEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;
    match event {
        VideoEvent::Connected => guard.on_video_connected(),
        VideoEvent::Disconnected => guard.on_video_disconnected(),
        VideoEvent::Time { seconds } => guard.on_video_time(seconds),
        VideoEvent::State { playing } => guard.on_video_state(playing),
        VideoEvent::Error(message) => guard.on_video_error(message),
        VideoEvent::VideoChanged { video_id, index } => {
            let requests = guard.on_video_changed(video_id, index);
            drop(guard);
            for request in requests {
                let _ = network_requests.send(request).await;
            }
        }
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::RosterLoaded { players } => {
            let mut guard = app.lock().await;
            let next = guard.on_roster_loaded(players);
            drop(guard);
            if let Some(request) = next {
                let _ = network_requests.send(request).await;
            }
        }
        NetworkResponse::ProjectLoaded { key, data, meta } => {
            let mut guard = app.lock().await;
            guard.on_project_loaded(key, data, meta);
        }
        NetworkResponse::ProjectSaved { id, data, remote_meta } => {
            let mut guard = app.lock().await;
            guard.on_project_saved(id, data, remote_meta);
        }
        NetworkResponse::SaveFailed { data, message } => {
            error!("Save failed: {message}");
            let mut guard = app.lock().await;
            guard.on_save_failed(data, message);
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    true
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide).unwrap();
    execute!(stdout, terminal::EnterAlternateScreen).unwrap();
    execute!(stdout, terminal::Clear(terminal::ClearType::All)).unwrap();
    terminal::enable_raw_mode().unwrap();
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}

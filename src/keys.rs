use crate::app::{App, MenuItem, Prompt, SEEK_STEP};
use crate::state::app_state::{InputMode, StatusLevel};
use crate::state::messages::NetworkRequest;
use crate::state::video_link::VideoCommand;
use chrono::Utc;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use hooptag_core::{EventType, ShotResult};
use log::error;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    video_commands: &mpsc::Sender<VideoCommand>,
) {
    let mut guard = app.lock().await;
    let mut request: Option<NetworkRequest> = None;
    let mut command: Option<VideoCommand> = None;

    if key_event.code != Char('q') {
        guard.state.confirm_quit = false;
    }

    if guard.state.input.is_composing() {
        match (key_event.code, key_event.modifiers) {
            (KeyCode::Esc, _) => guard.cancel_input(),
            (KeyCode::Enter, _) => guard.submit_input(),
            (KeyCode::Backspace, _) => {
                guard.state.input.buffer.pop();
            }
            (Char('c'), KeyModifiers::CONTROL) => guard.cancel_input(),
            (Char(c), _) => guard.state.input.buffer.push(c),
            _ => {}
        }
        return;
    }

    // the rebounder picker is the only non-text input mode
    if guard.state.input.is_active() {
        match key_event.code {
            Char('k') | KeyCode::Up => guard.move_picker_cursor(-1),
            Char('j') | KeyCode::Down => guard.move_picker_cursor(1),
            KeyCode::Enter => guard.submit_input(),
            KeyCode::Esc => guard.cancel_input(),
            _ => {}
        }
        return;
    }

    let prompt = guard.prompt();
    let ready = guard.state.ready;
    let action = match key_event.code {
        Char(c) if prompt == Prompt::Action => action_for_key(c),
        _ => None,
    };

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }
        (_, Char('q'), _) => {
            if guard.request_quit() {
                crate::cleanup_terminal();
                std::process::exit(0);
            }
        }

        // Shot value while a shot is pending, before the digits switch tabs
        (MenuItem::Tagging, Char(c @ '1'..='3'), _) if prompt == Prompt::ShotType => {
            guard.choose_shot_type(c as u8 - b'0');
        }

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Tagging),
        (_, Char('2'), _) => guard.update_tab(MenuItem::PlayByPlay),
        (_, Char('3'), _) => guard.update_tab(MenuItem::BoxScore),
        (_, Char('4'), _) => guard.update_tab(MenuItem::Roster),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Always available
        (_, Char('"'), _) => guard.toggle_show_logs(),
        (_, Char('F'), _) => guard.toggle_full_screen(),
        (_, Char('g'), _) => request = guard.reload_request(),
        (_, Char(' '), _) => command = Some(guard.toggle_playback()),
        (_, KeyCode::Left, _) => command = Some(guard.seek_by(-SEEK_STEP)),
        (_, KeyCode::Right, _) => command = Some(guard.seek_by(SEEK_STEP)),
        (_, Char('n'), _) => command = Some(VideoCommand::Next),
        (_, Char('p'), _) => command = Some(VideoCommand::Previous),
        (_, Char('w'), _) => request = guard.save_request(),

        // Everything below edits the session
        _ if !ready => {}

        (_, Char('e'), _) => {
            if let Err(e) = guard.export_all(Utc::now()) {
                error!("export failed: {e:#}");
                guard.state.set_status(StatusLevel::Error, format!("Export failed: {e:#}"));
            }
        }

        // Tagging: lineup and player selection
        (MenuItem::Tagging, Char('k') | KeyCode::Up, _) => guard.move_player_cursor(-1),
        (MenuItem::Tagging, Char('j') | KeyCode::Down, _) => guard.move_player_cursor(1),
        (MenuItem::Tagging, KeyCode::Enter, _) => guard.activate_player(),
        (MenuItem::Tagging, KeyCode::Esc, _) => guard.cancel_selection(),
        (MenuItem::Tagging, Char('R'), _) => guard.reset_lineup(),
        (MenuItem::Tagging, Char('L'), _) => guard.restore_lineup(),

        // Tagging: action menu
        (MenuItem::Tagging, Char(_), _) if action.is_some() => {
            if let Some(kind) = action {
                guard.choose_action(kind);
            }
        }
        (MenuItem::Tagging, Char('m'), _) if prompt == Prompt::ShotResult => {
            guard.choose_shot_result(ShotResult::Made)
        }
        (MenuItem::Tagging, Char('x'), _) if prompt == Prompt::ShotResult => {
            guard.choose_shot_result(ShotResult::Missed)
        }

        // Tagging: markers
        (MenuItem::Tagging, Char('Q'), _) => guard.quick_action(EventType::StartOfQuarter),
        (MenuItem::Tagging, Char('T'), _) => guard.quick_action(EventType::Timeout),
        (MenuItem::Tagging, Char('h'), _) => guard.quick_action(EventType::Highlight),
        (MenuItem::Tagging, Char('['), _) => guard.quick_action(EventType::ActionStart),
        (MenuItem::Tagging, Char(']'), _) => guard.quick_action(EventType::ActionEnd),
        (MenuItem::Tagging, Char('l'), _) => guard.begin_input(InputMode::LearningNote),

        // Play-by-play
        (MenuItem::PlayByPlay, Char('k') | KeyCode::Up, _) => guard.move_event_cursor(-1),
        (MenuItem::PlayByPlay, Char('j') | KeyCode::Down, _) => guard.move_event_cursor(1),
        (MenuItem::PlayByPlay, KeyCode::Enter, _) => command = guard.seek_to_selected_event(),
        (MenuItem::PlayByPlay, Char('d') | KeyCode::Delete, _) => guard.delete_selected_event(),
        (MenuItem::PlayByPlay, Char('r'), _) => guard.begin_rebound_pick(),

        // Roster
        (MenuItem::Roster, Char('k') | KeyCode::Up, _) => guard.move_roster_cursor(-1),
        (MenuItem::Roster, Char('j') | KeyCode::Down, _) => guard.move_roster_cursor(1),
        (MenuItem::Roster, Char('+') | Char('a'), _) => guard.begin_input(InputMode::AddPlayer),
        (MenuItem::Roster, Char('d') | KeyCode::Delete, _) => guard.remove_selected_player(),

        _ => {}
    }

    drop(guard);

    if let Some(request) = request {
        let _ = network_requests.send(request).await;
    }
    if let Some(command) = command {
        let _ = video_commands.send(command).await;
    }
}

fn action_for_key(c: char) -> Option<EventType> {
    match c {
        's' => Some(EventType::Shot),
        'a' => Some(EventType::Assist),
        'r' => Some(EventType::Rebound),
        't' => Some(EventType::Steal),
        'b' => Some(EventType::Block),
        'o' => Some(EventType::Turnover),
        'f' => Some(EventType::Foul),
        'u' => Some(EventType::Substitution),
        _ => None,
    }
}

use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, InputMode, StatusLevel, step_cursor};
use crate::state::messages::NetworkRequest;
use crate::state::video_link::VideoCommand;
use anyhow::Context;
use chrono::{DateTime, Utc};
use hooptag_core::lineup::{LineupMode, ToggleOutcome};
use hooptag_core::project::ProjectContext;
use hooptag_core::session::{ClickOutcome, SessionResult};
use hooptag_core::{
    Event, EventType, GameSession, Player, Position, ProjectKey, ProjectMeta, Roster, SaveData, ShotResult,
    ShotType, TaggingStep,
};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Unsaved edits older than this are written out on the next tick.
pub const AUTOSAVE_DELAY: Duration = Duration::from_secs(2);
pub const SEEK_STEP: f64 = 5.0;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Tagging,
    PlayByPlay,
    BoxScore,
    Roster,
    Help,
}

/// What the tagging tab is waiting for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prompt {
    StartingFive,
    Player,
    Action,
    ShotType,
    ShotResult,
    SubstitutionIn,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    pub session: GameSession,
}

impl App {
    pub fn new() -> Self {
        let app = Self::with_settings(AppSettings::load());

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        let context = ProjectContext {
            game_number: Some(settings.game_number),
            video_index: settings.video_index,
            ..Default::default()
        };
        Self {
            session: GameSession::new(Roster::default(), context),
            state: AppState::new(),
            settings,
        }
    }

    // -----------------------------------------------------------------------
    // Network responses
    // -----------------------------------------------------------------------

    /// Seeds the roster; the project for the current video loads next.
    pub fn on_roster_loaded(&mut self, players: Vec<Player>) -> Option<NetworkRequest> {
        let count = players.len();
        self.session.merge_roster(players);
        info!("roster ready with {} players", self.session.roster().len());
        self.state.set_status(StatusLevel::Info, format!("Loaded {count} players"));
        if self.state.ready {
            return None;
        }
        self.session.project_key().map(|key| NetworkRequest::LoadProject { key })
    }

    pub fn on_project_loaded(&mut self, key: ProjectKey, data: Option<SaveData>, meta: Option<ProjectMeta>) {
        if self.session.project_key() != Some(key) {
            debug!("ignoring stale project load for {key:?}");
            return;
        }

        match data {
            Some(data) => {
                let conflict = self.session.load_project(data, meta.as_ref()).map(|c| c.summary.clone());
                let events = self.session.events().len();
                match conflict {
                    Some(summary) => self.state.set_status(StatusLevel::Warn, summary),
                    None => self.state.set_status(
                        StatusLevel::Info,
                        format!("Loaded {} ({events} events). Pick the starting five or press L to restore it", project_label(key)),
                    ),
                }
            }
            None => {
                self.session.on_project_missing();
                self.state.set_status(
                    StatusLevel::Info,
                    format!("New project {}. Pick the starting five", project_label(key)),
                );
            }
        }

        self.state.ready = true;
        self.state.save.last_edit = None;
        self.state.player_cursor = 0;
        self.state.bench_cursor = 0;
        self.state.event_cursor = 0;
    }

    pub fn on_project_saved(&mut self, id: Option<String>, data: SaveData, remote_meta: Option<ProjectMeta>) {
        self.state.save.saving = false;
        let saved_key = key_of(&data);
        if saved_key != self.session.project_key() {
            // flushed the previous video's project on a video change
            debug!("saved earlier project {saved_key:?}");
            self.state.save.last_saved_id = id;
            return;
        }

        let conflict = self.session.check_conflict(remote_meta.as_ref()).cloned();
        self.session.mark_saved(data);
        if !self.session.is_dirty() {
            self.state.save.last_edit = None;
        }

        match conflict {
            Some(conflict) if conflict.remote_is_newer() => {
                warn!("overwrote a newer remote project: {}", conflict.summary);
                self.state.set_status(StatusLevel::Warn, format!("Saved over remote changes: {}", conflict.summary));
            }
            _ => {
                let label = id.as_deref().unwrap_or("project");
                self.state.set_status(StatusLevel::Info, format!("Saved {label}"));
            }
        }
        self.state.save.last_saved_id = id;
    }

    /// The store refused `data`. Work on the current project stays in the
    /// session; a flush of the previous video is kept for a manual retry.
    pub fn on_save_failed(&mut self, data: SaveData, message: String) {
        self.state.save.saving = false;
        match key_of(&data) {
            key if key == self.session.project_key() => {
                // stop retrying until the next edit
                self.state.save.last_edit = None;
                self.state.set_status(StatusLevel::Error, format!("Save failed: {message}"));
            }
            key => {
                let label = key.map(project_label).unwrap_or_else(|| "previous project".into());
                warn!("keeping unsaved {label} ({} events) for retry", data.events.len());
                self.state.save.failed_flush = Some(data);
                self.state.set_status(StatusLevel::Error, format!("Saving {label} failed: {message}. Press w to retry"));
            }
        }
    }

    pub fn on_error(&mut self, message: String) {
        if !self.state.ready {
            self.state.set_status(StatusLevel::Error, format!("Project load failed: {message} (g retries)"));
        } else {
            self.state.set_status(StatusLevel::Error, message);
        }
    }

    /// Retry the project load after a failure. Without a roster the roster
    /// loads first and the project follows it.
    pub fn reload_request(&mut self) -> Option<NetworkRequest> {
        if self.state.ready {
            return None;
        }
        if self.session.roster().is_empty() {
            self.state.set_status(StatusLevel::Info, "Loading roster...");
            return Some(NetworkRequest::LoadRoster);
        }
        self.state.set_status(StatusLevel::Info, "Loading project...");
        self.session.project_key().map(|key| NetworkRequest::LoadProject { key })
    }

    // -----------------------------------------------------------------------
    // Video player events
    // -----------------------------------------------------------------------

    pub fn on_video_connected(&mut self) {
        self.state.playback.connected = true;
        self.state.playback.last_error = None;
    }

    pub fn on_video_disconnected(&mut self) {
        self.state.playback.connected = false;
        self.state.playback.playing = false;
    }

    pub fn on_video_time(&mut self, seconds: f64) {
        self.session.set_current_time(seconds);
    }

    pub fn on_video_state(&mut self, playing: bool) {
        self.state.playback.playing = playing;
    }

    pub fn on_video_error(&mut self, message: String) {
        debug!("video link: {message}");
        self.state.playback.last_error = Some(message);
    }

    /// The player moved to another video: save what we have, then load the
    /// project stored for the new one.
    pub fn on_video_changed(&mut self, video_id: Option<String>, index: u32) -> Vec<NetworkRequest> {
        let context = self.session.context();
        if context.video_index == index && (video_id.is_none() || context.video_id == video_id) {
            return Vec::new();
        }

        let mut requests = Vec::new();
        if self.state.ready && self.session.is_dirty() {
            requests.push(NetworkRequest::SaveProject { data: self.session.save_data(Utc::now()) });
            self.state.save.saving = true;
        }

        self.session.on_video_changed(video_id, index);
        self.state.ready = false;
        self.state.input.finish();
        self.state.set_status(StatusLevel::Info, format!("Switched to video {index}, loading project..."));
        if let Some(key) = self.session.project_key() {
            requests.push(NetworkRequest::LoadProject { key });
        }
        requests
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Tagging tab
    // -----------------------------------------------------------------------

    pub fn prompt(&self) -> Prompt {
        match self.session.tagging_step() {
            TaggingStep::Idle if self.session.mode() == LineupMode::RosterSelection => Prompt::StartingFive,
            TaggingStep::Idle => Prompt::Player,
            TaggingStep::PlayerSelected { .. } => Prompt::Action,
            TaggingStep::AwaitingShotType { .. } => Prompt::ShotType,
            TaggingStep::AwaitingShotResult { .. } => Prompt::ShotResult,
            TaggingStep::AwaitingSubstitutionIn { .. } => Prompt::SubstitutionIn,
        }
    }

    /// The list under the tagging cursor: the whole roster while picking
    /// starters, the five on court afterwards.
    pub fn tagging_players(&self) -> Vec<&Player> {
        match self.session.mode() {
            LineupMode::RosterSelection => self.session.roster().sorted_by_jersey(),
            LineupMode::Tagging => {
                let mut players: Vec<&Player> =
                    self.session.lineup().on_court().iter().map(|cp| &cp.player).collect();
                players.sort_by_key(|p| p.jersey_number);
                players
            }
        }
    }

    pub fn move_player_cursor(&mut self, delta: isize) {
        if self.prompt() == Prompt::SubstitutionIn {
            let len = self.session.bench().len();
            self.state.bench_cursor = step_cursor(self.state.bench_cursor, delta, len);
        } else {
            let len = self.tagging_players().len();
            self.state.player_cursor = step_cursor(self.state.player_cursor, delta, len);
        }
    }

    /// Enter on the tagging tab.
    pub fn activate_player(&mut self) {
        if self.prompt() == Prompt::SubstitutionIn {
            let Some(id) = self.session.bench().get(self.state.bench_cursor).map(|p| p.id.clone()) else {
                return;
            };
            let result = self.session.select_substitution_in(&id);
            if let Some(event) = self.report(result) {
                self.after_commit(event);
                self.state.bench_cursor = 0;
            }
            return;
        }

        let Some(id) = self.tagging_players().get(self.state.player_cursor).map(|p| p.id.clone()) else {
            return;
        };
        let result = self.session.click_player(&id);
        match self.report(result) {
            Some(ClickOutcome::Lineup(ToggleOutcome::Confirmed)) => {
                self.state.player_cursor = 0;
                self.touch();
                self.state.set_status(StatusLevel::Info, "Starting five confirmed");
            }
            Some(ClickOutcome::Lineup(ToggleOutcome::Full)) => {
                self.state.set_status(StatusLevel::Warn, "Five starters already picked");
            }
            Some(ClickOutcome::Lineup(_)) => {
                let picked = self.session.lineup().on_court().len();
                self.state.set_status(StatusLevel::Info, format!("{picked}/5 starters picked"));
            }
            Some(ClickOutcome::Selected) | None => {}
        }
    }

    pub fn choose_action(&mut self, kind: EventType) {
        let result = self.session.select_action(kind);
        if let Some(event) = self.report(result) {
            self.after_commit(event);
        }
    }

    pub fn choose_shot_type(&mut self, points: u8) {
        let result = ShotType::try_from(points)
            .map_err(Into::into)
            .and_then(|shot| self.session.select_shot_type(shot));
        if let Some(event) = self.report(result) {
            self.after_commit(event);
        }
    }

    pub fn choose_shot_result(&mut self, result: ShotResult) {
        let result = self.session.select_shot_result(result);
        if let Some(event) = self.report(result) {
            self.after_commit(event);
        }
    }

    pub fn cancel_selection(&mut self) {
        if self.session.cancel() {
            self.state.bench_cursor = 0;
            self.state.set_status(StatusLevel::Info, "Selection cancelled");
        }
    }

    pub fn quick_action(&mut self, kind: EventType) {
        if !self.state.ready {
            return;
        }
        let result = self.session.quick_action(kind);
        if let Some(event) = self.report(result) {
            self.after_commit(Some(event));
        }
    }

    pub fn reset_lineup(&mut self) {
        self.session.reset_lineup();
        self.state.player_cursor = 0;
        self.state.bench_cursor = 0;
        self.state.set_status(StatusLevel::Info, "Lineup cleared. Pick the starting five");
    }

    pub fn restore_lineup(&mut self) {
        let result = self.session.restore_last_lineup();
        if let Some(count) = self.report(result) {
            self.state.player_cursor = 0;
            self.state.set_status(StatusLevel::Info, format!("Restored last lineup ({count} players)"));
        }
    }

    // -----------------------------------------------------------------------
    // Text input and pickers
    // -----------------------------------------------------------------------

    pub fn begin_input(&mut self, mode: InputMode) {
        if self.state.ready {
            self.state.input.begin(mode);
        }
    }

    pub fn cancel_input(&mut self) {
        self.state.input.finish();
    }

    pub fn submit_input(&mut self) {
        let mode = self.state.input.mode.clone();
        let cursor = self.state.input.cursor;
        let text = self.state.input.finish();
        match mode {
            InputMode::Normal => {}
            InputMode::LearningNote => {
                let result = self.session.add_learning(&text);
                if let Some(event) = self.report(result) {
                    self.after_commit(Some(event));
                }
            }
            InputMode::AddPlayer => match parse_new_player(&text) {
                Some((name, jersey, position)) => {
                    let id = self.session.add_player(&name, jersey, position);
                    debug!("added player {name} as {id}");
                    self.touch();
                    self.state.set_status(StatusLevel::Info, format!("Added #{jersey} {name}"));
                }
                None => self.state.set_status(StatusLevel::Warn, "Expected: Name, jersey, position"),
            },
            InputMode::PickRebounder { shot_id } => {
                let Some(rebounder) = self.rebound_candidates().get(cursor).map(|p| p.id.clone()) else {
                    return;
                };
                let result = self.session.attach_rebound(&shot_id, &rebounder);
                if let Some(event) = self.report(result) {
                    self.touch();
                    self.state.set_status(StatusLevel::Info, event.description);
                }
            }
        }
    }

    pub fn rebound_candidates(&self) -> Vec<&Player> {
        self.session.roster().sorted_by_jersey()
    }

    pub fn move_picker_cursor(&mut self, delta: isize) {
        let len = self.rebound_candidates().len();
        self.state.input.cursor = step_cursor(self.state.input.cursor, delta, len);
    }

    // -----------------------------------------------------------------------
    // Play-by-play tab
    // -----------------------------------------------------------------------

    pub fn sorted_events(&self) -> Vec<&Event> {
        self.session.log().sorted()
    }

    pub fn move_event_cursor(&mut self, delta: isize) {
        let len = self.session.events().len();
        self.state.event_cursor = step_cursor(self.state.event_cursor, delta, len);
    }

    fn selected_event(&self) -> Option<&Event> {
        self.sorted_events().get(self.state.event_cursor).copied()
    }

    pub fn seek_to_selected_event(&mut self) -> Option<VideoCommand> {
        let seconds = self.selected_event()?.timestamp;
        self.session.set_current_time(seconds);
        Some(VideoCommand::Seek { seconds })
    }

    pub fn delete_selected_event(&mut self) {
        let Some(id) = self.selected_event().map(|e| e.id.clone()) else {
            return;
        };
        if let Some(removed) = self.session.delete_event(&id) {
            self.touch();
            self.state.set_status(StatusLevel::Info, format!("Deleted {}", removed.description));
            let len = self.session.events().len();
            self.state.event_cursor = step_cursor(self.state.event_cursor, 0, len);
        }
    }

    /// Start picking a rebounder for the selected missed shot.
    pub fn begin_rebound_pick(&mut self) {
        let Some(event) = self.selected_event() else {
            return;
        };
        if event.kind != EventType::Shot || !event.is_missed() {
            self.state.set_status(StatusLevel::Warn, "Rebounds attach to missed shots only");
            return;
        }
        let shot_id = event.id.clone();
        self.begin_input(InputMode::PickRebounder { shot_id });
    }

    // -----------------------------------------------------------------------
    // Roster tab
    // -----------------------------------------------------------------------

    pub fn move_roster_cursor(&mut self, delta: isize) {
        let len = self.session.roster().len();
        self.state.roster_cursor = step_cursor(self.state.roster_cursor, delta, len);
    }

    pub fn remove_selected_player(&mut self) {
        let Some(id) = self
            .session
            .roster()
            .sorted_by_jersey()
            .get(self.state.roster_cursor)
            .map(|p| p.id.clone())
        else {
            return;
        };
        if let Some(player) = self.session.remove_player(&id) {
            self.touch();
            self.state.set_status(StatusLevel::Info, format!("Removed #{} {}", player.jersey_number, player.name));
            self.move_roster_cursor(0);
            self.state.player_cursor = 0;
        }
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    pub fn toggle_playback(&mut self) -> VideoCommand {
        self.state.playback.playing = !self.state.playback.playing;
        if self.state.playback.playing { VideoCommand::Play } else { VideoCommand::Pause }
    }

    pub fn seek_by(&mut self, delta: f64) -> VideoCommand {
        let seconds = (self.session.current_time() + delta).max(0.0);
        self.session.set_current_time(seconds);
        VideoCommand::Seek { seconds }
    }

    // -----------------------------------------------------------------------
    // Persistence and exports
    // -----------------------------------------------------------------------

    pub fn save_request(&mut self) -> Option<NetworkRequest> {
        if self.state.save.saving {
            return None;
        }
        if let Some(data) = self.state.save.failed_flush.take() {
            self.state.save.saving = true;
            self.state.set_status(StatusLevel::Info, "Retrying save...");
            return Some(NetworkRequest::SaveProject { data });
        }
        if !self.state.ready {
            return None;
        }
        self.state.save.saving = true;
        self.state.set_status(StatusLevel::Info, "Saving...");
        Some(NetworkRequest::SaveProject { data: self.session.save_data(Utc::now()) })
    }

    /// A save request once edits have been idle for [`AUTOSAVE_DELAY`].
    pub fn autosave_request(&mut self, now: Instant) -> Option<NetworkRequest> {
        let last_edit = self.state.save.last_edit?;
        if !self.state.ready || self.state.save.saving || now.duration_since(last_edit) < AUTOSAVE_DELAY {
            return None;
        }
        if !self.session.is_dirty() {
            self.state.save.last_edit = None;
            return None;
        }
        debug!("autosaving");
        self.state.save.saving = true;
        Some(NetworkRequest::SaveProject { data: self.session.save_data(Utc::now()) })
    }

    /// Write the box score (CSV and JSON), the raw project and the chapter
    /// list into the exports directory.
    pub fn export_all(&mut self, now: DateTime<Utc>) -> anyhow::Result<PathBuf> {
        let dir = self.settings.exports_dir();
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let base = match self.session.project_key() {
            Some(key) => format!("game-{}-video-{}", key.game_number, key.video_index),
            None => "session".to_string(),
        };
        let files = [
            (format!("{base}-stats.csv"), self.session.stats_csv(now)?),
            (format!("{base}-stats.json"), self.session.stats_json(now)?),
            (format!("{base}-project.json"), self.session.save_json(now)?),
            (format!("{base}-timestamps.txt"), self.session.youtube_timestamps()),
        ];
        for (name, content) in files {
            let path = dir.join(name);
            std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        }

        info!("exported {base} to {}", dir.display());
        self.state.set_status(StatusLevel::Info, format!("Exported to {}", dir.display()));
        Ok(dir)
    }

    /// `true` when it is fine to exit. Unsaved edits need a second press.
    pub fn request_quit(&mut self) -> bool {
        if self.state.confirm_quit || (!self.session.is_dirty() && self.state.save.failed_flush.is_none()) {
            return true;
        }
        self.state.confirm_quit = true;
        self.state.set_status(StatusLevel::Warn, "Unsaved changes: press q again to quit, w to save");
        false
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn touch(&mut self) {
        self.state.save.last_edit = Some(Instant::now());
    }

    fn after_commit(&mut self, event: Option<Event>) {
        if let Some(event) = event {
            self.touch();
            self.state.set_status(StatusLevel::Info, format!("{} {}", event.formatted_time, event.description));
        }
    }

    fn report<T>(&mut self, result: SessionResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{e}");
                self.state.set_status(StatusLevel::Warn, e.to_string());
                None
            }
        }
    }
}

fn key_of(data: &SaveData) -> Option<ProjectKey> {
    data.game_number.zip(data.video_index).map(|(g, v)| ProjectKey::new(g, v))
}

fn project_label(key: ProjectKey) -> String {
    format!("game {} video {}", key.game_number, key.video_index)
}

/// Parse `Name, jersey, position`; jersey and position are optional.
pub fn parse_new_player(input: &str) -> Option<(String, u32, Position)> {
    let mut parts = input.split(',').map(str::trim);
    let name = parts.next().filter(|n| !n.is_empty())?.to_string();
    let jersey = match parts.next() {
        Some(raw) if !raw.is_empty() => raw.trim_start_matches('#').parse().ok()?,
        _ => 0,
    };
    let position = parts.next().map(Position::parse).unwrap_or_default();
    Some((name, jersey, position))
}

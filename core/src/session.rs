use crate::event_log::{EventLog, LogError};
use crate::events::{DraftError, EventDraft, PlayerRef};
use crate::export::{self, ExportError};
use crate::lineup::{Lineup, LineupMode, ToggleOutcome};
use crate::project::{
    Conflict, ProjectContext, build_save_data, compare_timestamps, has_unsaved_changes, last_known_modified,
};
use crate::roster::Roster;
use crate::stats::{BoxScore, ExtractedGameStats, extract_stats};
use crate::tagging::{SelectedAction, ShotResult, ShotType, TaggingError, TaggingMachine, TaggingStep, Transition};
use crate::{Event, EventType, Player, PlayerId, Position, ProjectKey, ProjectMeta, SaveData};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Tagging(TaggingError),
    Draft(DraftError),
    Log(LogError),
    NoSnapshot,
    UnknownEvent(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Tagging(e) => write!(f, "{e}"),
            SessionError::Draft(e) => write!(f, "{e}"),
            SessionError::Log(e) => write!(f, "{e}"),
            SessionError::NoSnapshot => write!(f, "no saved starting lineup to restore"),
            SessionError::UnknownEvent(id) => write!(f, "no event with id {id}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TaggingError> for SessionError {
    fn from(e: TaggingError) -> Self {
        SessionError::Tagging(e)
    }
}

impl From<DraftError> for SessionError {
    fn from(e: DraftError) -> Self {
        SessionError::Draft(e)
    }
}

impl From<LogError> for SessionError {
    fn from(e: LogError) -> Self {
        SessionError::Log(e)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// What a click on a roster entry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Lineup(ToggleOutcome),
    Selected,
}

/// Owner of everything one operator edits: roster, event log, lineup,
/// pending tagging selection, playback clock and project identity.
///
/// Every log mutation goes through here and is followed by a lineup rebuild.
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    roster: Roster,
    log: EventLog,
    lineup: Lineup,
    tagging: TaggingMachine,
    current_time: f64,
    context: ProjectContext,
    last_saved: Option<SaveData>,
    conflict: Option<Conflict>,
}

impl GameSession {
    pub fn new(roster: Roster, context: ProjectContext) -> Self {
        Self { roster, context, ..Self::default() }
    }

    // ----------------------------------------------------------------------
    // Accessors
    // ----------------------------------------------------------------------

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn events(&self) -> &[Event] {
        self.log.events()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn lineup(&self) -> &Lineup {
        &self.lineup
    }

    pub fn mode(&self) -> LineupMode {
        self.lineup.mode()
    }

    pub fn tagging_step(&self) -> &TaggingStep {
        self.tagging.step()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    pub fn conflict(&self) -> Option<&Conflict> {
        self.conflict.as_ref()
    }

    pub fn last_saved(&self) -> Option<&SaveData> {
        self.last_saved.as_ref()
    }

    pub fn project_key(&self) -> Option<ProjectKey> {
        self.context
            .game_number
            .map(|game| ProjectKey::new(game, self.context.video_index))
    }

    /// Advisory playback position; bad values are clamped to 0.
    pub fn set_current_time(&mut self, seconds: f64) {
        self.current_time = if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 };
    }

    pub fn set_game_number(&mut self, game_number: Option<u32>) {
        self.context.game_number = game_number;
    }

    // ----------------------------------------------------------------------
    // Roster
    // ----------------------------------------------------------------------

    pub fn merge_roster(&mut self, players: Vec<Player>) {
        self.roster.merge(players);
    }

    pub fn add_player(&mut self, name: &str, jersey_number: u32, position: Position) -> PlayerId {
        self.roster.add(name, jersey_number, position).id.clone()
    }

    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        let removed = self.roster.remove(id)?;
        self.lineup.forget(id);
        if self.tagging.step().player().and_then(|p| p.id.as_deref()) == Some(id) {
            self.tagging.cancel();
        }
        self.lineup.rebuild(&self.log, &self.roster);
        Some(removed)
    }

    /// Players not on court, by jersey number.
    pub fn bench(&self) -> Vec<&Player> {
        self.lineup.bench(&self.roster)
    }

    // ----------------------------------------------------------------------
    // Lineup
    // ----------------------------------------------------------------------

    /// A roster click: toggles a starter while fewer than five are on court,
    /// otherwise starts a tagging sequence for that player.
    pub fn click_player(&mut self, player_id: &str) -> SessionResult<ClickOutcome> {
        let player = self
            .roster
            .get(player_id)
            .cloned()
            .ok_or_else(|| TaggingError::UnknownPlayer(player_id.to_owned()))?;

        match self.lineup.mode() {
            LineupMode::RosterSelection => {
                let outcome = self.lineup.toggle_starter(&player, self.current_time);
                if outcome == ToggleOutcome::Confirmed {
                    self.record_lineup_snapshot()?;
                }
                Ok(ClickOutcome::Lineup(outcome))
            }
            LineupMode::Tagging => {
                self.select_player(player_id)?;
                Ok(ClickOutcome::Selected)
            }
        }
    }

    pub fn reset_lineup(&mut self) {
        info!("lineup reset");
        self.lineup.reset();
        self.tagging.cancel();
    }

    /// Re-confirm the most recent starting-lineup snapshot. Substitutions
    /// after the snapshot are folded in again. Returns how many players
    /// could be restored.
    pub fn restore_last_lineup(&mut self) -> SessionResult<usize> {
        let snapshot = self.log.latest_snapshot().ok_or(SessionError::NoSnapshot)?;
        let at = snapshot.timestamp;
        let players: Vec<Player> = snapshot
            .lineup
            .iter()
            .flatten()
            .filter_map(|id| self.roster.get(id).cloned())
            .collect();
        if players.is_empty() {
            return Err(SessionError::NoSnapshot);
        }

        let restored = players.len();
        self.lineup.confirm(players, at);
        self.lineup.rebuild(&self.log, &self.roster);
        self.tagging.cancel();
        info!("restored lineup from {} ({restored} players)", crate::format_time(at));
        Ok(restored)
    }

    fn record_lineup_snapshot(&mut self) -> SessionResult<Event> {
        let five: Vec<PlayerRef> = self
            .lineup
            .baseline()
            .iter()
            .map(|cp| PlayerRef::from(&cp.player))
            .collect();
        self.commit(EventDraft::new(EventType::StartingLineup).lineup(five))
    }

    // ----------------------------------------------------------------------
    // Tagging
    // ----------------------------------------------------------------------

    pub fn select_player(&mut self, player_id: &str) -> SessionResult<()> {
        if self.lineup.mode() != LineupMode::Tagging {
            return Err(TaggingError::LineupIncomplete(self.lineup.on_court().len()).into());
        }
        let player = self
            .roster
            .get(player_id)
            .ok_or_else(|| TaggingError::UnknownPlayer(player_id.to_owned()))?;
        if !self.lineup.contains(player_id) {
            return Err(TaggingError::NotOnCourt(player.name.clone()).into());
        }
        self.tagging.select_player(PlayerRef::from(player));
        Ok(())
    }

    /// Returns the committed event for actions that need no sub-menu.
    pub fn select_action(&mut self, kind: EventType) -> SessionResult<Option<Event>> {
        let transition = self.tagging.select_action(SelectedAction::from_kind(kind))?;
        self.apply(transition)
    }

    pub fn select_shot_type(&mut self, shot: ShotType) -> SessionResult<Option<Event>> {
        let transition = self.tagging.select_shot_type(shot)?;
        self.apply(transition)
    }

    pub fn select_shot_result(&mut self, result: ShotResult) -> SessionResult<Option<Event>> {
        let transition = self.tagging.select_shot_result(result)?;
        self.apply(transition)
    }

    /// Complete a substitution with a bench player.
    pub fn select_substitution_in(&mut self, player_id: &str) -> SessionResult<Option<Event>> {
        if !matches!(self.tagging.step(), TaggingStep::AwaitingSubstitutionIn { .. }) {
            // let the machine report the invalid transition
            let transition = self.tagging.select_substitution_in(PlayerRef::named(player_id))?;
            return self.apply(transition);
        }
        let player = self
            .roster
            .get(player_id)
            .ok_or_else(|| TaggingError::UnknownPlayer(player_id.to_owned()))?;
        if self.lineup.contains(player_id) {
            return Err(TaggingError::AlreadyOnCourt(player.name.clone()).into());
        }
        let transition = self.tagging.select_substitution_in(PlayerRef::from(player))?;
        self.apply(transition)
    }

    pub fn cancel(&mut self) -> bool {
        self.tagging.cancel()
    }

    fn apply(&mut self, transition: Transition) -> SessionResult<Option<Event>> {
        match transition {
            Transition::Pending => Ok(None),
            Transition::Committed(draft) => self.commit(draft).map(Some),
        }
    }

    // ----------------------------------------------------------------------
    // Direct entry
    // ----------------------------------------------------------------------

    /// Player-less marker at the current time. Leaves any pending selection.
    pub fn quick_action(&mut self, kind: EventType) -> SessionResult<Event> {
        if !kind.is_quick_action() {
            return Err(TaggingError::UnsupportedAction(kind).into());
        }
        self.commit(EventDraft::new(kind))
    }

    pub fn add_learning(&mut self, note: &str) -> SessionResult<Event> {
        self.commit(EventDraft::new(EventType::Learning).note(note))
    }

    /// Manual entry form.
    pub fn add_draft(&mut self, draft: EventDraft) -> SessionResult<Event> {
        self.commit(draft)
    }

    /// Credit a rebound on an already tagged missed shot. The shot keeps its
    /// id and time; it is replaced in the log.
    pub fn attach_rebound(&mut self, shot_id: &str, rebounder_id: &str) -> SessionResult<Event> {
        let shot = self
            .log
            .get(shot_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownEvent(shot_id.to_owned()))?;
        if shot.kind != EventType::Shot {
            return Err(TaggingError::UnsupportedAction(shot.kind).into());
        }
        let rebounder = self
            .roster
            .get(rebounder_id)
            .ok_or_else(|| TaggingError::UnknownPlayer(rebounder_id.to_owned()))?;

        let shooter = PlayerRef { id: shot.player_id.clone(), name: shot.player.clone().unwrap_or_default() };
        let replacement = EventDraft::new(EventType::Shot)
            .player(shooter)
            .shot(shot.points.unwrap_or(0), shot.is_missed())
            .rebound_by(rebounder)
            .into_event(shot.id.clone(), shot.timestamp)?;

        self.log.remove(&shot.id);
        self.log.append(replacement.clone())?;
        self.lineup.rebuild(&self.log, &self.roster);
        Ok(replacement)
    }

    pub fn delete_event(&mut self, id: &str) -> Option<Event> {
        let removed = self.log.remove(id)?;
        debug!("deleted event {id} ({})", removed.description);
        self.lineup.rebuild(&self.log, &self.roster);
        if let Some(pid) = self.tagging.step().player().and_then(|p| p.id.clone())
            && !self.lineup.contains(&pid)
        {
            self.tagging.cancel();
        }
        Some(removed)
    }

    fn commit(&mut self, draft: EventDraft) -> SessionResult<Event> {
        let event = draft.into_event(Uuid::new_v4().to_string(), self.current_time)?;
        self.log.append(event.clone())?;
        self.lineup.rebuild(&self.log, &self.roster);
        info!("tagged {} {}", event.formatted_time, event.description);
        Ok(event)
    }

    // ----------------------------------------------------------------------
    // Projects
    // ----------------------------------------------------------------------

    /// Replace the session contents with a loaded project. The lineup is
    /// always cleared; the operator picks (or restores) a starting five.
    pub fn load_project(&mut self, data: SaveData, remote: Option<&ProjectMeta>) -> Option<&Conflict> {
        self.conflict = match (&self.last_saved, remote) {
            (Some(local), Some(remote)) => compare_timestamps(last_known_modified(local), &remote.last_modified),
            _ => None,
        };

        let mut roster = Roster::new(data.players.clone());
        roster.merge(std::mem::take(&mut self.roster).into_players());
        self.roster = roster;
        self.log = EventLog::from_events(data.events.clone());

        if data.video_id.is_some() {
            self.context.video_id = data.video_id.clone();
        }
        if data.playlist_id.is_some() {
            self.context.playlist_id = data.playlist_id.clone();
        }
        if let Some(game) = data.game_number {
            self.context.game_number = Some(game);
        }
        if let Some(index) = data.video_index {
            self.context.video_index = index;
        }

        self.lineup.reset();
        self.tagging.cancel();
        self.current_time = 0.0;
        info!("loaded project with {} events", self.log.len());
        // the merged roster is the clean baseline
        self.last_saved = Some(SaveData { players: self.roster.players().to_vec(), ..data });
        self.conflict.as_ref()
    }

    /// Nothing stored for the current key: start from an empty log.
    pub fn on_project_missing(&mut self) {
        self.log.clear();
        self.lineup.reset();
        self.tagging.cancel();
        self.last_saved = None;
        self.conflict = None;
    }

    /// The player moved to another video; `index` is 1-based.
    pub fn on_video_changed(&mut self, video_id: Option<String>, index: u32) {
        info!("video changed to #{index} ({video_id:?})");
        if video_id.is_some() {
            self.context.video_id = video_id;
        }
        self.context.video_index = index.max(1);
        self.current_time = 0.0;
        self.on_project_missing();
    }

    pub fn save_data(&self, now: DateTime<Utc>) -> SaveData {
        build_save_data(self.roster.players(), self.log.events(), &self.context, now)
    }

    pub fn mark_saved(&mut self, data: SaveData) {
        self.last_saved = Some(data);
        self.conflict = None;
    }

    /// Compare the last known save against the store's metadata.
    pub fn check_conflict(&mut self, remote: Option<&ProjectMeta>) -> Option<&Conflict> {
        self.conflict = match (&self.last_saved, remote) {
            (Some(local), Some(remote)) => compare_timestamps(last_known_modified(local), &remote.last_modified),
            _ => None,
        };
        self.conflict.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        has_unsaved_changes(self.roster.players(), self.log.events(), self.last_saved.as_ref())
    }

    // ----------------------------------------------------------------------
    // Derived views
    // ----------------------------------------------------------------------

    pub fn stats(&self) -> BoxScore {
        extract_stats(self.log.events(), &self.roster)
    }

    pub fn extracted_stats(&self, now: DateTime<Utc>) -> ExtractedGameStats {
        let timestamp = self
            .last_saved
            .as_ref()
            .map(|s| s.timestamp.clone())
            .unwrap_or_else(|| crate::project::timestamp(now));
        ExtractedGameStats {
            game_id: self.context.video_id.clone().unwrap_or_else(|| "unknown".to_owned()),
            video_id: self.context.video_id.clone(),
            timestamp,
            box_score: self.stats(),
        }
    }

    pub fn stats_csv(&self, now: DateTime<Utc>) -> Result<String, ExportError> {
        export::stats_to_csv(&self.extracted_stats(now))
    }

    pub fn stats_json(&self, now: DateTime<Utc>) -> Result<String, ExportError> {
        export::stats_to_json(&self.extracted_stats(now))
    }

    pub fn save_json(&self, now: DateTime<Utc>) -> Result<String, ExportError> {
        export::save_to_json(&self.save_data(now))
    }

    pub fn youtube_timestamps(&self) -> String {
        export::youtube_timestamps(self.log.events())
    }
}

pub mod client;
pub mod event_log;
pub mod events;
pub mod export;
pub mod lineup;
pub mod project;
pub mod roster;
pub mod session;
pub mod stats;
pub mod store;
pub mod tagging;
pub mod wire;

use serde::{Deserialize, Serialize};

pub use events::{EventDraft, PlayerRef};
pub use lineup::{CurrentPlayer, Lineup, LineupMode};
pub use event_log::EventLog;
pub use roster::Roster;
pub use session::GameSession;
pub use stats::{BoxScore, ExtractedGameStats, PlayerGameStats, TeamGameStats};
pub use tagging::{ShotResult, ShotType, TaggingMachine, TaggingStep};

/// Roster ids are opaque strings: database ids for seeded players, UUIDs for
/// players added during a session.
pub type PlayerId = String;

// ---------------------------------------------------------------------------
// Roster entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Forward,
    Center,
    /// Also what any unknown position string decodes to.
    #[default]
    #[serde(other)]
    Guard,
}

impl Position {
    pub fn label(&self) -> &'static str {
        match self {
            Position::Guard => "Guard",
            Position::Forward => "Forward",
            Position::Center => "Center",
        }
    }

    pub fn abbrev(&self) -> &'static str {
        match self {
            Position::Guard => "G",
            Position::Forward => "F",
            Position::Center => "C",
        }
    }

    /// Lenient parse used for roster sources; anything unrecognised is a guard.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "forward" | "f" => Position::Forward,
            "center" | "c" => Position::Center,
            _ => Position::Guard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub jersey_number: u32,
    #[serde(default)]
    pub position: Position,
}

impl Player {
    pub fn new(
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        jersey_number: u32,
        position: Position,
    ) -> Self {
        Self { id: id.into(), name: name.into(), jersey_number, position }
    }
}

// ---------------------------------------------------------------------------
// Tagged events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    StartOfQuarter,
    Timeout,
    Substitution,
    Shot,
    Rebound,
    Foul,
    Assist,
    Steal,
    Block,
    Turnover,
    Highlight,
    Learning,
    ActionStart,
    ActionEnd,
    /// Explicit snapshot of a confirmed starting five.
    StartingLineup,
    /// Anything a newer or foreign save file carries that we don't model.
    #[serde(other)]
    Other,
}

impl EventType {
    /// Actions that commit as soon as they are chosen for a selected player.
    pub fn commits_immediately(&self) -> bool {
        matches!(
            self,
            EventType::Assist
                | EventType::Rebound
                | EventType::Steal
                | EventType::Block
                | EventType::Turnover
                | EventType::Foul
        )
    }

    /// Player-less markers the operator can drop at the current time.
    pub fn is_quick_action(&self) -> bool {
        matches!(
            self,
            EventType::StartOfQuarter
                | EventType::Timeout
                | EventType::Highlight
                | EventType::ActionStart
                | EventType::ActionEnd
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    /// Seconds into the video.
    pub timestamp: f64,
    #[serde(default)]
    pub formatted_time: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and_one: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebound_player: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebound_player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution_out: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution_out_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineup: Option<Vec<PlayerId>>,
    #[serde(default)]
    pub description: String,
}

impl Event {
    /// Minimal event with only the required fields set. Mostly useful for
    /// building fixtures and for loaders that fill fields one by one.
    pub fn bare(id: impl Into<String>, timestamp: f64, kind: EventType) -> Self {
        Self {
            id: id.into(),
            timestamp,
            formatted_time: format_time(timestamp),
            kind,
            player: None,
            player_id: None,
            points: None,
            missed: None,
            and_one: None,
            rebound_player: None,
            rebound_player_id: None,
            substitution_out: None,
            substitution_out_id: None,
            note: None,
            lineup: None,
            description: String::new(),
        }
    }

    pub fn is_missed(&self) -> bool {
        self.missed.unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Saved projects
// ---------------------------------------------------------------------------

/// One saved tagging project. Field names follow the JSON project format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    pub version: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    pub players: Vec<Player>,
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SaveMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_index: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_events: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_span: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_format: Option<String>,
    /// Free-form keys written by other tools (source, note, addedAt, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Lightweight remote bookkeeping used for conflict checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub id: String,
    pub last_modified: String,
}

/// A project is addressed by game number and 1-based video index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectKey {
    pub game_number: u32,
    pub video_index: u32,
}

impl ProjectKey {
    pub fn new(game_number: u32, video_index: u32) -> Self {
        Self { game_number, video_index }
    }
}

/// `MM:SS`, truncating fractional seconds. Minutes are not wrapped at 60.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds.floor() as u64 } else { 0 };
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_pads_and_truncates() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(59.9), "00:59");
        assert_eq!(format_time(61.2), "01:01");
        assert_eq!(format_time(3725.0), "62:05");
        assert_eq!(format_time(-3.0), "00:00");
    }

    #[test]
    fn unknown_event_type_deserializes_as_other() {
        let raw = r#"{"id":"e1","timestamp":4.5,"type":"jump_ball","description":""}"#;
        let event: Event = serde_json::from_str(raw).expect("event should parse");
        assert_eq!(event.kind, EventType::Other);
        assert_eq!(event.formatted_time, "");
    }

    #[test]
    fn legacy_event_without_ids_parses() {
        let raw = r#"{
            "id": "e2",
            "timestamp": 12,
            "formattedTime": "00:12",
            "type": "shot",
            "player": "Jordan Pike",
            "points": 3,
            "missed": true,
            "reboundPlayer": "Ravi Osei",
            "description": "Shot Jordan Pike: three. Missed. Rebound Ravi Osei"
        }"#;
        let event: Event = serde_json::from_str(raw).expect("legacy event should parse");
        assert_eq!(event.kind, EventType::Shot);
        assert_eq!(event.points, Some(3));
        assert!(event.is_missed());
        assert!(event.player_id.is_none());
        assert_eq!(event.rebound_player.as_deref(), Some("Ravi Osei"));
    }

    #[test]
    fn unknown_position_falls_back_to_guard() {
        let raw = r#"{"id":"p1","name":"Sam Hale","jerseyNumber":4,"position":"Wing"}"#;
        let player: Player = serde_json::from_str(raw).expect("player should parse");
        assert_eq!(player.position, Position::Guard);
        let center: Position = serde_json::from_str(r#""Center""#).expect("known position");
        assert_eq!(center, Position::Center);
        assert_eq!(Position::parse("center"), Position::Center);
        assert_eq!(Position::parse(""), Position::Guard);
    }

    #[test]
    fn save_data_requires_players_and_events() {
        let missing = r#"{"version":"1.0.0","timestamp":"2026-01-01T00:00:00Z","players":[]}"#;
        assert!(serde_json::from_str::<SaveData>(missing).is_err());

        let ok = r#"{"version":"1.0.0","timestamp":"2026-01-01T00:00:00Z","players":[],"events":[],
                     "metadata":{"totalEvents":0,"source":"admin"}}"#;
        let data: SaveData = serde_json::from_str(ok).expect("save data should parse");
        let metadata = data.metadata.expect("metadata present");
        assert_eq!(metadata.total_events, Some(0));
        assert_eq!(metadata.extra.get("source").and_then(|v| v.as_str()), Some("admin"));
    }
}

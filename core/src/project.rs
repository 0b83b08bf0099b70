use crate::{Event, Player, SaveData, SaveMetadata};
use chrono::{DateTime, SecondsFormat, Utc};

pub const SAVE_VERSION: &str = "1.0.0";
pub const EXPORT_FORMAT: &str = "youtube-timestamps";

/// Everything a save needs besides the roster and the events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectContext {
    pub game_number: Option<u32>,
    /// 1-based position in the playlist.
    pub video_index: u32,
    pub video_id: Option<String>,
    pub playlist_id: Option<String>,
}

pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Snapshot the session into the project format, stamped with `now`.
pub fn build_save_data(
    players: &[Player],
    events: &[Event],
    context: &ProjectContext,
    now: DateTime<Utc>,
) -> SaveData {
    let stamp = timestamp(now);
    let total_time_span = events.iter().map(|e| e.timestamp).fold(0.0, f64::max);
    SaveData {
        version: SAVE_VERSION.to_owned(),
        timestamp: stamp.clone(),
        last_modified: Some(stamp),
        video_id: context.video_id.clone(),
        playlist_id: context.playlist_id.clone(),
        players: players.to_vec(),
        events: events.to_vec(),
        metadata: Some(SaveMetadata {
            total_events: Some(events.len()),
            total_time_span: Some(total_time_span),
            export_format: Some(EXPORT_FORMAT.to_owned()),
            extra: Default::default(),
        }),
        game_number: context.game_number,
        video_index: Some(context.video_index),
    }
}

/// The time a save was last written, falling back to its creation time.
pub fn last_known_modified(save: &SaveData) -> &str {
    save.last_modified.as_deref().unwrap_or(&save.timestamp)
}

/// Advisory mismatch between what we last saw and what the store holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub local_is_newer: bool,
    pub minutes: i64,
    pub summary: String,
}

impl Conflict {
    pub fn remote_is_newer(&self) -> bool {
        !self.local_is_newer
    }
}

/// Compare two RFC 3339 timestamps. Identical or unparseable timestamps are
/// not a conflict.
pub fn compare_timestamps(local: &str, remote: &str) -> Option<Conflict> {
    let local = DateTime::parse_from_rfc3339(local).ok()?;
    let remote = DateTime::parse_from_rfc3339(remote).ok()?;
    let diff_ms = (local - remote).num_milliseconds();
    if diff_ms == 0 {
        return None;
    }

    let minutes = diff_ms.abs() / 60_000;
    let local_is_newer = diff_ms > 0;
    let summary = if local_is_newer {
        format!("Local version is {minutes} minute(s) newer")
    } else {
        format!("Remote version is {minutes} minute(s) newer")
    };
    Some(Conflict { local_is_newer, minutes, summary })
}

/// Whether the roster or the events differ from the last save. With no save
/// yet, any event counts as a change.
pub fn has_unsaved_changes(players: &[Player], events: &[Event], last_saved: Option<&SaveData>) -> bool {
    let Some(saved) = last_saved else {
        return !events.is_empty();
    };
    if players != saved.players.as_slice() {
        return true;
    }
    if events.len() != saved.events.len() {
        return true;
    }
    let mut ours: Vec<&Event> = events.iter().collect();
    let mut theirs: Vec<&Event> = saved.events.iter().collect();
    ours.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    theirs.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    ours != theirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventType, Position};
    use chrono::TimeZone;

    fn players() -> Vec<Player> {
        vec![Player::new("a", "Lena Marsh", 23, Position::Forward)]
    }

    #[test]
    fn save_data_carries_metadata_and_context() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap();
        let events = vec![
            Event::bare("e1", 12.0, EventType::Highlight),
            Event::bare("e2", 340.5, EventType::Timeout),
        ];
        let context = ProjectContext {
            game_number: Some(7),
            video_index: 2,
            video_id: Some("abc123".into()),
            playlist_id: None,
        };
        let save = build_save_data(&players(), &events, &context, now);

        assert_eq!(save.version, "1.0.0");
        assert_eq!(save.timestamp, "2026-03-01T18:30:00.000Z");
        assert_eq!(save.last_modified.as_deref(), Some("2026-03-01T18:30:00.000Z"));
        assert_eq!(save.game_number, Some(7));
        assert_eq!(save.video_index, Some(2));
        let meta = save.metadata.expect("metadata");
        assert_eq!(meta.total_events, Some(2));
        assert_eq!(meta.total_time_span, Some(340.5));
        assert_eq!(meta.export_format.as_deref(), Some("youtube-timestamps"));
    }

    #[test]
    fn compare_reports_direction_in_whole_minutes() {
        let remote_newer = compare_timestamps("2026-03-01T10:00:00Z", "2026-03-01T10:05:30Z")
            .expect("conflict");
        assert!(remote_newer.remote_is_newer());
        assert_eq!(remote_newer.summary, "Remote version is 5 minute(s) newer");

        let local_newer = compare_timestamps("2026-03-01T10:00:59Z", "2026-03-01T10:00:00Z")
            .expect("conflict");
        assert!(local_newer.local_is_newer);
        assert_eq!(local_newer.summary, "Local version is 0 minute(s) newer");
    }

    #[test]
    fn identical_or_invalid_timestamps_are_not_conflicts() {
        assert!(compare_timestamps("2026-03-01T10:00:00Z", "2026-03-01T11:00:00+01:00").is_none());
        assert!(compare_timestamps("yesterday", "2026-03-01T10:00:00Z").is_none());
    }

    #[test]
    fn unsaved_changes_detection() {
        let events = vec![Event::bare("e1", 5.0, EventType::Highlight), Event::bare("e2", 1.0, EventType::Timeout)];
        assert!(!has_unsaved_changes(&players(), &[], None));
        assert!(has_unsaved_changes(&players(), &events, None));

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let saved = build_save_data(&players(), &events, &ProjectContext::default(), now);
        let reordered: Vec<Event> = events.iter().rev().cloned().collect();
        assert!(!has_unsaved_changes(&players(), &reordered, Some(&saved)));
        assert!(has_unsaved_changes(&players(), &events[..1], Some(&saved)));
        assert!(has_unsaved_changes(&[], &events, Some(&saved)));
    }
}

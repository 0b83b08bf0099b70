//! Box-score aggregation. Everything here is a pure function of the event
//! list and the roster, recomputed on every request.

use crate::event_log::sorted_events;
use crate::roster::Roster;
use crate::{Event, EventType, Player, PlayerId, SaveData};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGameStats {
    pub player_id: PlayerId,
    pub player_name: String,
    pub jersey_number: u32,

    pub assists: u32,
    pub rebounds: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,

    pub field_goals_made: u32,
    pub field_goals_attempted: u32,
    pub field_goal_percentage: f64,
    pub three_pointers_made: u32,
    pub three_pointers_attempted: u32,
    pub three_point_percentage: f64,
    pub free_throws_made: u32,
    pub free_throws_attempted: u32,
    pub free_throw_percentage: f64,
    pub total_points: u32,

    pub fouls: u32,
    pub substitutions: u32,
}

impl PlayerGameStats {
    fn empty(player: &Player) -> Self {
        Self {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            jersey_number: player.jersey_number,
            ..Self::default()
        }
    }

    /// Points + rebounds + assists + steals + blocks - turnovers.
    pub fn efficiency(&self) -> i64 {
        i64::from(self.total_points)
            + i64::from(self.rebounds)
            + i64::from(self.assists)
            + i64::from(self.steals)
            + i64::from(self.blocks)
            - i64::from(self.turnovers)
    }

    fn finish(&mut self) {
        self.field_goal_percentage = percentage(self.field_goals_made, self.field_goals_attempted);
        self.three_point_percentage =
            percentage(self.three_pointers_made, self.three_pointers_attempted);
        self.free_throw_percentage = percentage(self.free_throws_made, self.free_throws_attempted);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamGameStats {
    pub total_points: u32,
    pub total_assists: u32,
    pub total_rebounds: u32,
    pub total_steals: u32,
    pub total_blocks: u32,
    pub total_turnovers: u32,
    pub total_fouls: u32,
    pub total_substitutions: u32,

    pub field_goals_made: u32,
    pub field_goals_attempted: u32,
    pub three_pointers_made: u32,
    pub three_pointers_attempted: u32,
    pub free_throws_made: u32,
    pub free_throws_attempted: u32,

    pub team_field_goal_percentage: f64,
    pub team_three_point_percentage: f64,
    pub team_free_throw_percentage: f64,
}

impl TeamGameStats {
    fn from_players(players: &[PlayerGameStats]) -> Self {
        let mut team = players.iter().fold(Self::default(), |mut acc, p| {
            acc.total_points += p.total_points;
            acc.total_assists += p.assists;
            acc.total_rebounds += p.rebounds;
            acc.total_steals += p.steals;
            acc.total_blocks += p.blocks;
            acc.total_turnovers += p.turnovers;
            acc.total_fouls += p.fouls;
            acc.total_substitutions += p.substitutions;
            acc.field_goals_made += p.field_goals_made;
            acc.field_goals_attempted += p.field_goals_attempted;
            acc.three_pointers_made += p.three_pointers_made;
            acc.three_pointers_attempted += p.three_pointers_attempted;
            acc.free_throws_made += p.free_throws_made;
            acc.free_throws_attempted += p.free_throws_attempted;
            acc
        });
        team.team_field_goal_percentage = percentage(team.field_goals_made, team.field_goals_attempted);
        team.team_three_point_percentage =
            percentage(team.three_pointers_made, team.three_pointers_attempted);
        team.team_free_throw_percentage =
            percentage(team.free_throws_made, team.free_throws_attempted);
        team
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxScore {
    pub player_stats: Vec<PlayerGameStats>,
    pub team_stats: TeamGameStats,
    pub play_by_play: Vec<Event>,
}

/// Box score plus the identity of the save it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedGameStats {
    pub game_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub timestamp: String,
    #[serde(flatten)]
    pub box_score: BoxScore,
}

/// `made / attempted` as a percentage with one decimal; 0 when nothing was
/// attempted.
pub fn percentage(made: u32, attempted: u32) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    (f64::from(made) / f64::from(attempted) * 100.0 * 10.0).round() / 10.0
}

/// Aggregate `events` against `roster`.
///
/// Every roster entry gets a row, in jersey order. Events whose player does
/// not resolve are skipped, including the rebound credit carried on a
/// missed shot.
pub fn extract_stats(events: &[Event], roster: &Roster) -> BoxScore {
    let sorted = sorted_events(events);

    let mut rows: Vec<PlayerGameStats> = roster.players().iter().map(PlayerGameStats::empty).collect();
    let index_of = |player: &Player| roster.players().iter().position(|p| p.id == player.id);

    for event in &sorted {
        let Some(player) = roster.resolve(event.player_id.as_deref(), event.player.as_deref()) else {
            continue;
        };
        let Some(idx) = index_of(player) else {
            continue;
        };
        let stats = &mut rows[idx];

        match event.kind {
            EventType::Assist => stats.assists += 1,
            EventType::Rebound => stats.rebounds += 1,
            EventType::Steal => stats.steals += 1,
            EventType::Block => stats.blocks += 1,
            EventType::Turnover => stats.turnovers += 1,
            EventType::Foul => stats.fouls += 1,
            EventType::Substitution => stats.substitutions += 1,
            EventType::Shot => {
                let points = event.points.unwrap_or(0);
                // free throws stay in the field-goal bucket
                stats.field_goals_attempted += 1;
                match points {
                    3 => stats.three_pointers_attempted += 1,
                    1 => stats.free_throws_attempted += 1,
                    _ => {}
                }
                if !event.is_missed() {
                    stats.field_goals_made += 1;
                    stats.total_points += u32::from(points);
                    match points {
                        3 => stats.three_pointers_made += 1,
                        1 => stats.free_throws_made += 1,
                        _ => {}
                    }
                }
            }
            _ => {}
        }

        if event.kind == EventType::Shot
            && event.is_missed()
            && let Some(rebounder) = roster.resolve(
                event.rebound_player_id.as_deref(),
                event.rebound_player.as_deref(),
            )
            && let Some(r_idx) = index_of(rebounder)
        {
            rows[r_idx].rebounds += 1;
        }
    }

    rows.iter_mut().for_each(PlayerGameStats::finish);
    rows.sort_by_key(|s| s.jersey_number);

    let team_stats = TeamGameStats::from_players(&rows);
    BoxScore {
        player_stats: rows,
        team_stats,
        play_by_play: sorted.into_iter().cloned().collect(),
    }
}

/// Aggregate a saved project using its own player list.
pub fn extract_from_save(save: &SaveData) -> ExtractedGameStats {
    let roster = Roster::new(save.players.clone());
    ExtractedGameStats {
        game_id: save.video_id.clone().unwrap_or_else(|| "unknown".to_owned()),
        video_id: save.video_id.clone(),
        timestamp: save.timestamp.clone(),
        box_score: extract_stats(&save.events, &roster),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;
    use crate::events::EventDraft;

    fn roster() -> Roster {
        Roster::new(vec![
            Player::new("a", "Lena Marsh", 23, Position::Forward),
            Player::new("b", "Otto Fenn", 4, Position::Guard),
            Player::new("c", "Ida Krug", 11, Position::Center),
        ])
    }

    fn shot(id: &str, t: f64, r: &Roster, who: &str, points: u8, missed: bool) -> Event {
        EventDraft::new(EventType::Shot)
            .player(r.get(who).expect("on roster"))
            .shot(points, missed)
            .into_event(id, t)
            .expect("valid shot")
    }

    fn simple(id: &str, t: f64, kind: EventType, name: &str) -> Event {
        let mut e = Event::bare(id, t, kind);
        e.player = Some(name.to_owned());
        e
    }

    fn row<'a>(score: &'a BoxScore, id: &str) -> &'a PlayerGameStats {
        score.player_stats.iter().find(|p| p.player_id == id).expect("row exists")
    }

    #[test]
    fn made_two_and_missed_three_with_rebound() {
        let r = roster();
        let mut miss = shot("e2", 20.0, &r, "a", 3, true);
        miss.rebound_player = Some("Otto Fenn".into());
        let events = vec![shot("e1", 10.0, &r, "a", 2, false), miss];

        let score = extract_stats(&events, &r);
        let a = row(&score, "a");
        assert_eq!(a.field_goals_attempted, 2);
        assert_eq!(a.field_goals_made, 1);
        assert_eq!(a.total_points, 2);
        assert_eq!(a.three_pointers_attempted, 1);
        assert_eq!(a.three_pointers_made, 0);
        assert_eq!(a.field_goal_percentage, 50.0);
        assert_eq!(row(&score, "b").rebounds, 1);
    }

    #[test]
    fn free_throws_count_as_field_goal_attempts() {
        let r = roster();
        let events = vec![
            shot("e1", 1.0, &r, "b", 1, false),
            shot("e2", 2.0, &r, "b", 1, true),
            shot("e3", 3.0, &r, "b", 1, false),
        ];
        let b = row(&extract_stats(&events, &r), "b").clone();
        assert_eq!(b.free_throws_attempted, 3);
        assert_eq!(b.free_throws_made, 2);
        assert_eq!(b.field_goals_attempted, 3);
        assert_eq!(b.total_points, 2);
        assert_eq!(b.free_throw_percentage, 66.7);
    }

    #[test]
    fn zero_stat_players_have_zero_percentages() {
        let score = extract_stats(&[], &roster());
        assert_eq!(score.player_stats.len(), 3);
        for p in &score.player_stats {
            assert_eq!(p.field_goal_percentage, 0.0);
            assert_eq!(p.three_point_percentage, 0.0);
            assert_eq!(p.free_throw_percentage, 0.0);
            assert!(!p.field_goal_percentage.is_nan());
        }
        assert_eq!(score.team_stats, TeamGameStats::default());
    }

    #[test]
    fn unknown_players_are_skipped() {
        let r = roster();
        let mut orphan_miss = Event::bare("e2", 2.0, EventType::Shot);
        orphan_miss.player = Some("Ghost".into());
        orphan_miss.points = Some(2);
        orphan_miss.missed = Some(true);
        orphan_miss.rebound_player = Some("Lena Marsh".into());
        let events = vec![simple("e1", 1.0, EventType::Assist, "Ghost"), orphan_miss];

        let score = extract_stats(&events, &r);
        assert_eq!(score.team_stats.total_assists, 0);
        // rebound credit needs a resolvable shooter
        assert_eq!(row(&score, "a").rebounds, 0);
        assert_eq!(score.play_by_play.len(), 2);
    }

    #[test]
    fn counters_and_ordering() {
        let r = roster();
        let events = vec![
            simple("e5", 50.0, EventType::Turnover, "Ida Krug"),
            simple("e1", 10.0, EventType::Assist, "Lena Marsh"),
            simple("e2", 20.0, EventType::Steal, "Lena Marsh"),
            simple("e3", 30.0, EventType::Foul, "Otto Fenn"),
            simple("e4", 40.0, EventType::Block, "Ida Krug"),
            simple("e6", 60.0, EventType::Substitution, "Otto Fenn"),
            simple("e7", 70.0, EventType::Highlight, "Otto Fenn"),
        ];
        let score = extract_stats(&events, &r);

        let order: Vec<u32> = score.player_stats.iter().map(|p| p.jersey_number).collect();
        assert_eq!(order, vec![4, 11, 23]);
        let pbp: Vec<&str> = score.play_by_play.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(pbp, vec!["e1", "e2", "e3", "e4", "e5", "e6", "e7"]);

        assert_eq!(row(&score, "a").assists, 1);
        assert_eq!(row(&score, "a").steals, 1);
        assert_eq!(row(&score, "b").fouls, 1);
        assert_eq!(row(&score, "b").substitutions, 1);
        assert_eq!(row(&score, "c").blocks, 1);
        assert_eq!(row(&score, "c").efficiency(), 0);
    }

    #[test]
    fn aggregation_ignores_insertion_order() {
        let r = roster();
        let mut events = vec![
            shot("e1", 5.0, &r, "a", 3, false),
            shot("e2", 6.0, &r, "b", 2, true),
            simple("e3", 7.0, EventType::Rebound, "Ida Krug"),
        ];
        let forward = extract_stats(&events, &r);
        events.reverse();
        let backward = extract_stats(&events, &r);
        assert_eq!(forward, backward);
    }

    #[test]
    fn team_percentages_come_from_team_sums() {
        let r = roster();
        let events = vec![
            shot("e1", 1.0, &r, "a", 2, false),
            shot("e2", 2.0, &r, "b", 2, true),
            shot("e3", 3.0, &r, "b", 2, true),
        ];
        let team = extract_stats(&events, &r).team_stats;
        assert_eq!(team.field_goals_attempted, 3);
        assert_eq!(team.team_field_goal_percentage, 33.3);
        assert_eq!(team.total_points, 2);
    }

    #[test]
    fn id_join_wins_over_renamed_player() {
        let r = roster();
        let mut e = shot("e1", 1.0, &r, "a", 2, false);
        e.player = Some("Old Name".into());
        let score = extract_stats(&[e], &r);
        assert_eq!(row(&score, "a").total_points, 2);
    }

    #[test]
    fn extract_from_save_defaults_game_id() {
        let save = SaveData {
            version: "1.0.0".into(),
            timestamp: "2026-03-01T10:00:00Z".into(),
            last_modified: None,
            video_id: None,
            playlist_id: None,
            players: roster().into_players(),
            events: vec![],
            metadata: None,
            game_number: None,
            video_index: None,
        };
        let stats = extract_from_save(&save);
        assert_eq!(stats.game_id, "unknown");
        let json = serde_json::to_value(&stats).expect("serializes");
        assert!(json.get("playerStats").is_some());
        assert!(json.get("videoId").is_none());
    }
}

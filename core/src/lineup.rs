use crate::event_log::EventLog;
use crate::roster::Roster;
use crate::{EventType, Player};
use log::{debug, warn};

pub const LINEUP_SIZE: usize = 5;

/// A player on court and the video time they came on.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPlayer {
    pub player: Player,
    pub entered_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineupMode {
    /// Fewer than five on court: clicks toggle starters.
    RosterSelection,
    /// Five on court: clicks start a tagging sequence.
    Tagging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Five starters already picked; nothing changed.
    Full,
    /// The fifth starter was added and the baseline is now confirmed.
    Confirmed,
}

/// On-court tracking.
///
/// `baseline` is what the operator picked (or restored); `on_court` is derived
/// from it by folding in substitutions that happened after the baseline's
/// threshold. Rebuilding only ever reads the baseline, so it can run after
/// every log mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lineup {
    baseline: Vec<CurrentPlayer>,
    on_court: Vec<CurrentPlayer>,
}

impl Lineup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_court(&self) -> &[CurrentPlayer] {
        &self.on_court
    }

    pub fn baseline(&self) -> &[CurrentPlayer] {
        &self.baseline
    }

    pub fn is_confirmed(&self) -> bool {
        self.baseline.len() >= LINEUP_SIZE
    }

    pub fn mode(&self) -> LineupMode {
        if self.on_court.len() < LINEUP_SIZE {
            LineupMode::RosterSelection
        } else {
            LineupMode::Tagging
        }
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.on_court.iter().any(|cp| cp.player.id == player_id)
    }

    /// Latest entry time in the baseline, or 0 for an empty one.
    pub fn threshold(&self) -> f64 {
        self.baseline.iter().map(|cp| cp.entered_at).fold(0.0, f64::max)
    }

    /// Toggle `player` in or out of the starting five.
    pub fn toggle_starter(&mut self, player: &Player, at: f64) -> ToggleOutcome {
        // A confirmed baseline whose derived set lost someone (a substitute
        // that no longer resolves) is edited from what is on court now.
        if self.is_confirmed() && self.on_court.len() < LINEUP_SIZE {
            self.baseline = self.on_court.clone();
        }

        let outcome = if let Some(idx) = self.baseline.iter().position(|cp| cp.player.id == player.id) {
            self.baseline.remove(idx);
            ToggleOutcome::Removed
        } else if self.baseline.len() >= LINEUP_SIZE {
            ToggleOutcome::Full
        } else {
            self.baseline.push(CurrentPlayer { player: player.clone(), entered_at: at });
            if self.baseline.len() == LINEUP_SIZE {
                ToggleOutcome::Confirmed
            } else {
                ToggleOutcome::Added
            }
        };

        if outcome != ToggleOutcome::Full {
            self.on_court = self.baseline.clone();
        }
        debug!("lineup toggle {} -> {outcome:?} ({} picked)", player.name, self.baseline.len());
        outcome
    }

    /// Replace the baseline wholesale, e.g. when restoring a saved snapshot.
    pub fn confirm(&mut self, players: Vec<Player>, at: f64) {
        self.baseline = players
            .into_iter()
            .take(LINEUP_SIZE)
            .map(|player| CurrentPlayer { player, entered_at: at })
            .collect();
        self.on_court = self.baseline.clone();
    }

    /// Empty both sets; the operator has to pick a new starting five.
    pub fn reset(&mut self) {
        self.baseline.clear();
        self.on_court.clear();
    }

    /// Drop a player that left the roster.
    pub fn forget(&mut self, player_id: &str) {
        self.baseline.retain(|cp| cp.player.id != player_id);
        self.on_court.retain(|cp| cp.player.id != player_id);
    }

    /// Recompute the on-court set from the baseline and the log.
    pub fn rebuild(&mut self, log: &EventLog, roster: &Roster) {
        if !self.is_confirmed() {
            self.on_court = self.baseline.clone();
            return;
        }

        let threshold = self.threshold();
        let mut on_court = self.baseline.clone();
        let substitutions = log
            .sorted()
            .into_iter()
            .filter(|e| e.kind == EventType::Substitution && e.timestamp > threshold);

        for event in substitutions {
            let outgoing = roster.resolve(
                event.substitution_out_id.as_deref(),
                event.substitution_out.as_deref(),
            );
            let frees_a_spot = outgoing.is_some_and(|out| on_court.iter().any(|cp| cp.player.id == out.id));

            if let Some(incoming) = roster.resolve(event.player_id.as_deref(), event.player.as_deref()) {
                let on_court_len = on_court.len();
                match on_court.iter_mut().find(|cp| cp.player.id == incoming.id) {
                    Some(cp) => cp.entered_at = event.timestamp,
                    None if on_court_len < LINEUP_SIZE || frees_a_spot => on_court.push(CurrentPlayer {
                        player: incoming.clone(),
                        entered_at: event.timestamp,
                    }),
                    None => warn!(
                        "substitution {} skipped: {} would be a sixth player on court",
                        event.id, incoming.name
                    ),
                }
            }
            if let Some(outgoing) = outgoing {
                on_court.retain(|cp| cp.player.id != outgoing.id);
            }
        }

        self.on_court = on_court;
    }

    /// Roster minus the on-court set, by jersey number.
    pub fn bench<'a>(&self, roster: &'a Roster) -> Vec<&'a Player> {
        roster
            .sorted_by_jersey()
            .into_iter()
            .filter(|p| !self.contains(&p.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventDraft;
    use crate::{Event, Position};

    fn roster() -> Roster {
        Roster::new(
            (1..=8)
                .map(|n| Player::new(format!("p{n}"), format!("Player {n}"), n, Position::Guard))
                .collect(),
        )
    }

    fn sub(id: &str, t: f64, roster: &Roster, incoming: &str, outgoing: &str) -> Event {
        let incoming = roster.get(incoming).expect("incoming on roster");
        let outgoing = roster.get(outgoing).expect("outgoing on roster");
        EventDraft::new(EventType::Substitution)
            .player(incoming)
            .substitution_out(outgoing)
            .into_event(id, t)
            .expect("valid substitution")
    }

    fn ids(lineup: &Lineup) -> Vec<&str> {
        let mut ids: Vec<&str> = lineup.on_court().iter().map(|cp| cp.player.id.as_str()).collect();
        ids.sort();
        ids
    }

    fn pick_five(lineup: &mut Lineup, roster: &Roster, at: f64) {
        for n in 1..=5 {
            let player = roster.get(&format!("p{n}")).expect("on roster");
            lineup.toggle_starter(player, at);
        }
    }

    #[test]
    fn fifth_pick_confirms_and_switches_mode() {
        let r = roster();
        let mut lineup = Lineup::new();
        assert_eq!(lineup.mode(), LineupMode::RosterSelection);
        for n in 1..=4 {
            let p = r.get(&format!("p{n}")).expect("on roster");
            assert_eq!(lineup.toggle_starter(p, 0.0), ToggleOutcome::Added);
        }
        let p5 = r.get("p5").expect("on roster");
        assert_eq!(lineup.toggle_starter(p5, 0.0), ToggleOutcome::Confirmed);
        assert_eq!(lineup.mode(), LineupMode::Tagging);
        assert_eq!(lineup.toggle_starter(r.get("p6").expect("on roster"), 0.0), ToggleOutcome::Full);
    }

    #[test]
    fn toggling_a_picked_player_removes_them() {
        let r = roster();
        let mut lineup = Lineup::new();
        let p1 = r.get("p1").expect("on roster");
        lineup.toggle_starter(p1, 0.0);
        assert_eq!(lineup.toggle_starter(p1, 0.0), ToggleOutcome::Removed);
        assert!(lineup.on_court().is_empty());
    }

    #[test]
    fn substitutions_after_threshold_are_folded_in() {
        let r = roster();
        let log = EventLog::from_events([
            sub("s1", 60.0, &r, "p7", "p1"),
            sub("s2", 120.0, &r, "p6", "p3"),
        ]);

        // baseline confirmed at t=90: the t=60 substitution predates it
        let mut lineup = Lineup::new();
        pick_five(&mut lineup, &r, 90.0);
        lineup.rebuild(&log, &r);

        assert_eq!(ids(&lineup), vec!["p1", "p2", "p4", "p5", "p6"]);
        let p6 = lineup.on_court().iter().find(|cp| cp.player.id == "p6").expect("p6 on court");
        assert_eq!(p6.entered_at, 120.0);
    }

    #[test]
    fn substitution_at_threshold_is_ignored() {
        let r = roster();
        let log = EventLog::from_events([sub("s1", 30.0, &r, "p6", "p2")]);
        let mut lineup = Lineup::new();
        pick_five(&mut lineup, &r, 30.0);
        lineup.rebuild(&log, &r);
        assert_eq!(ids(&lineup), vec!["p1", "p2", "p3", "p4", "p5"]);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let r = roster();
        let log = EventLog::from_events([sub("s1", 10.0, &r, "p6", "p1"), sub("s2", 20.0, &r, "p1", "p6")]);
        let mut lineup = Lineup::new();
        pick_five(&mut lineup, &r, 0.0);
        lineup.rebuild(&log, &r);
        let first = lineup.clone();
        lineup.rebuild(&log, &r);
        assert_eq!(lineup, first);
        assert_eq!(ids(&lineup), vec!["p1", "p2", "p3", "p4", "p5"]);
    }

    #[test]
    fn legacy_substitution_resolves_by_name_and_unknowns_are_skipped() {
        let r = roster();
        let mut legacy = Event::bare("s1", 50.0, EventType::Substitution);
        legacy.player = Some("Player 8".into());
        legacy.substitution_out = Some("Player 4".into());
        let mut ghost = Event::bare("s2", 60.0, EventType::Substitution);
        ghost.player = Some("Nobody".into());
        ghost.substitution_out = Some("Player 5".into());
        let log = EventLog::from_events([legacy, ghost]);

        let mut lineup = Lineup::new();
        pick_five(&mut lineup, &r, 0.0);
        lineup.rebuild(&log, &r);
        assert_eq!(ids(&lineup), vec!["p1", "p2", "p3", "p8"]);
        assert_eq!(lineup.mode(), LineupMode::RosterSelection);

        // picking again starts from who is on court now
        assert_eq!(
            lineup.toggle_starter(r.get("p6").expect("on roster"), 70.0),
            ToggleOutcome::Confirmed
        );
        assert_eq!(ids(&lineup), vec!["p1", "p2", "p3", "p6", "p8"]);
    }

    #[test]
    fn unknown_outgoing_player_never_makes_six() {
        let r = roster();
        let mut orphan = Event::bare("s1", 40.0, EventType::Substitution);
        orphan.player_id = Some("p6".into());
        orphan.player = Some("Player 6".into());
        orphan.substitution_out = Some("Traded Away".into());
        let log = EventLog::from_events([orphan, sub("s2", 50.0, &r, "p7", "p2")]);

        let mut lineup = Lineup::new();
        pick_five(&mut lineup, &r, 0.0);
        lineup.rebuild(&log, &r);
        assert_eq!(ids(&lineup), vec!["p1", "p3", "p4", "p5", "p7"]);
    }

    #[test]
    fn unconfirmed_baseline_ignores_log() {
        let r = roster();
        let log = EventLog::from_events([sub("s1", 10.0, &r, "p6", "p1")]);
        let mut lineup = Lineup::new();
        lineup.toggle_starter(r.get("p1").expect("on roster"), 0.0);
        lineup.rebuild(&log, &r);
        assert_eq!(ids(&lineup), vec!["p1"]);
    }

    #[test]
    fn reset_and_bench() {
        let r = roster();
        let mut lineup = Lineup::new();
        pick_five(&mut lineup, &r, 0.0);
        let bench: Vec<&str> = lineup.bench(&r).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(bench, vec!["p6", "p7", "p8"]);
        lineup.reset();
        assert!(lineup.on_court().is_empty());
        assert_eq!(lineup.threshold(), 0.0);
        assert_eq!(lineup.bench(&r).len(), 8);
    }
}

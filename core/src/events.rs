use crate::{Event, EventType, Player, PlayerId, format_time};
use std::fmt;

/// Menu entry for one event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTemplate {
    pub kind: EventType,
    pub label: &'static str,
    pub icon: &'static str,
    pub requires_player: bool,
    pub requires_points: bool,
}

const fn template(
    kind: EventType,
    label: &'static str,
    icon: &'static str,
    requires_player: bool,
    requires_points: bool,
) -> EventTemplate {
    EventTemplate { kind, label, icon, requires_player, requires_points }
}

/// Every taggable event, in menu order.
pub const EVENT_TEMPLATES: &[EventTemplate] = &[
    template(EventType::Highlight, "Highlight", "⭐", false, false),
    template(EventType::Learning, "Learning", "💩", false, false),
    template(EventType::ActionStart, "Action Start", "🎬", false, false),
    template(EventType::ActionEnd, "Action Ende", "🛑", false, false),
    template(EventType::Substitution, "Substitution", "🔄", true, false),
    template(EventType::Shot, "Shot", "🏀", true, true),
    template(EventType::Rebound, "Rebound", "📥", true, false),
    template(EventType::Foul, "Foul", "⚠️", true, false),
    template(EventType::Assist, "Assist", "🎯", true, false),
    template(EventType::Steal, "Steal", "🔥", true, false),
    template(EventType::Block, "Block", "🛡️", true, false),
    template(EventType::Turnover, "Turnover", "❌", true, false),
    template(EventType::StartOfQuarter, "Start of Quarter", "⏱️", false, false),
    template(EventType::Timeout, "Time Out", "⏸️", false, false),
];

pub fn template_for(kind: EventType) -> Option<&'static EventTemplate> {
    EVENT_TEMPLATES.iter().find(|t| t.kind == kind)
}

/// Name plus stable id of a roster entry, as stored on events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub id: Option<PlayerId>,
    pub name: String,
}

impl PlayerRef {
    /// Reference by name only, as legacy files do.
    pub fn named(name: impl Into<String>) -> Self {
        Self { id: None, name: name.into() }
    }
}

impl From<&Player> for PlayerRef {
    fn from(player: &Player) -> Self {
        Self { id: Some(player.id.clone()), name: player.name.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    MissingPlayer(EventType),
    InvalidPoints(u8),
    MissingPoints,
    ReboundOnMadeShot,
    AndOneOnMiss,
    SamePlayerInAndOut(String),
    EmptyNote,
    EmptyLineup,
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftError::MissingPlayer(kind) => write!(f, "{kind:?} needs a player"),
            DraftError::InvalidPoints(p) => write!(f, "a shot is worth 1, 2 or 3 points, not {p}"),
            DraftError::MissingPoints => write!(f, "a shot needs a point value"),
            DraftError::ReboundOnMadeShot => write!(f, "only a missed shot can carry a rebound"),
            DraftError::AndOneOnMiss => write!(f, "only a made shot can be an and-one"),
            DraftError::SamePlayerInAndOut(name) => {
                write!(f, "{name} cannot substitute for themselves")
            }
            DraftError::EmptyNote => write!(f, "a learning note cannot be empty"),
            DraftError::EmptyLineup => write!(f, "a starting lineup needs players"),
        }
    }
}

impl std::error::Error for DraftError {}

/// An event that has not been stamped with an id and a time yet.
///
/// Built by the tagging machine, the quick actions and the manual entry form;
/// `validate` checks that the type-specific fields fit the event type.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub kind: EventType,
    pub player: Option<PlayerRef>,
    pub points: Option<u8>,
    pub missed: Option<bool>,
    pub and_one: bool,
    pub rebound: Option<PlayerRef>,
    pub substitution_out: Option<PlayerRef>,
    pub note: Option<String>,
    pub lineup: Option<Vec<PlayerRef>>,
}

impl EventDraft {
    pub fn new(kind: EventType) -> Self {
        Self {
            kind,
            player: None,
            points: None,
            missed: None,
            and_one: false,
            rebound: None,
            substitution_out: None,
            note: None,
            lineup: None,
        }
    }

    pub fn player(mut self, player: impl Into<PlayerRef>) -> Self {
        self.player = Some(player.into());
        self
    }

    pub fn shot(mut self, points: u8, missed: bool) -> Self {
        self.points = Some(points);
        self.missed = Some(missed);
        self
    }

    pub fn and_one(mut self, and_one: bool) -> Self {
        self.and_one = and_one;
        self
    }

    pub fn rebound_by(mut self, player: impl Into<PlayerRef>) -> Self {
        self.rebound = Some(player.into());
        self
    }

    pub fn substitution_out(mut self, player: impl Into<PlayerRef>) -> Self {
        self.substitution_out = Some(player.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn lineup(mut self, players: Vec<PlayerRef>) -> Self {
        self.lineup = Some(players);
        self
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        let needs_player = template_for(self.kind).is_some_and(|t| t.requires_player);
        if needs_player && self.player.is_none() {
            return Err(DraftError::MissingPlayer(self.kind));
        }

        match self.kind {
            EventType::Shot => {
                let points = self.points.ok_or(DraftError::MissingPoints)?;
                if !(1..=3).contains(&points) {
                    return Err(DraftError::InvalidPoints(points));
                }
                let missed = self.missed.unwrap_or(false);
                if !missed && self.rebound.is_some() {
                    return Err(DraftError::ReboundOnMadeShot);
                }
                if missed && self.and_one {
                    return Err(DraftError::AndOneOnMiss);
                }
            }
            EventType::Substitution => {
                if let (Some(incoming), Some(outgoing)) = (&self.player, &self.substitution_out)
                    && same_player(incoming, outgoing)
                {
                    return Err(DraftError::SamePlayerInAndOut(incoming.name.clone()));
                }
            }
            EventType::Learning => {
                if self.note.as_deref().is_none_or(|n| n.trim().is_empty()) {
                    return Err(DraftError::EmptyNote);
                }
            }
            EventType::StartingLineup => {
                if self.lineup.as_ref().is_none_or(|l| l.is_empty()) {
                    return Err(DraftError::EmptyLineup);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Stamp the draft into a committed event.
    pub fn into_event(self, id: impl Into<String>, timestamp: f64) -> Result<Event, DraftError> {
        self.validate()?;

        let mut event = Event::bare(id, timestamp, self.kind);
        event.formatted_time = format_time(timestamp);
        if let Some(player) = self.player {
            event.player = Some(player.name);
            event.player_id = player.id;
        }
        if self.kind == EventType::Shot {
            let missed = self.missed.unwrap_or(false);
            event.points = self.points;
            event.missed = Some(missed);
            if !missed && self.and_one {
                event.and_one = Some(true);
            }
        }
        if let Some(rebound) = self.rebound {
            event.rebound_player = Some(rebound.name);
            event.rebound_player_id = rebound.id;
        }
        if let Some(outgoing) = self.substitution_out {
            event.substitution_out = Some(outgoing.name);
            event.substitution_out_id = outgoing.id;
        }
        event.note = self.note.map(|n| n.trim().to_owned());
        if let Some(lineup) = &self.lineup {
            event.lineup = Some(lineup.iter().filter_map(|p| p.id.clone()).collect());
        }
        event.description = describe(&event, self.lineup.as_deref());
        Ok(event)
    }
}

fn same_player(a: &PlayerRef, b: &PlayerRef) -> bool {
    match (&a.id, &b.id) {
        (Some(x), Some(y)) => x == y,
        _ => a.name == b.name,
    }
}

fn shot_label(points: Option<u8>) -> &'static str {
    match points {
        Some(3) => "three",
        Some(2) => "two",
        _ => "free throw",
    }
}

/// Human-readable play-by-play line. Parts are joined with `. `.
pub fn describe(event: &Event, lineup: Option<&[PlayerRef]>) -> String {
    let player = event.player.as_deref().unwrap_or_default();
    let mut parts: Vec<String> = Vec::new();

    match event.kind {
        EventType::StartOfQuarter => parts.push("Start of Quarter".into()),
        EventType::Timeout => parts.push("Time Out".into()),
        EventType::Substitution => {
            parts.push(format!("Substitution {player}"));
            if let Some(out) = event.substitution_out.as_deref().filter(|out| !out.is_empty()) {
                parts.push(format!("Substitution out {out}"));
            }
        }
        EventType::Shot => {
            parts.push(format!("Shot {player}: {}", shot_label(event.points)));
            if event.is_missed() {
                parts.push("Missed".into());
                if let Some(rebound) = &event.rebound_player {
                    parts.push(format!("Rebound {rebound}"));
                }
            } else {
                parts.push("Made".into());
                if event.and_one.unwrap_or(false) {
                    parts.push("And-1".into());
                }
            }
        }
        EventType::Rebound => parts.push(format!("Rebound {player}")),
        EventType::Foul => parts.push(format!("Foul {player}")),
        EventType::Assist => parts.push(format!("Assist {player}")),
        EventType::Steal => parts.push(format!("Steal {player}")),
        EventType::Block => parts.push(format!("Block {player}")),
        EventType::Turnover => parts.push(format!("Turnover {player}")),
        EventType::Highlight => parts.push("Highlight".into()),
        EventType::Learning => {
            parts.push(format!("Learning: {}", event.note.as_deref().unwrap_or_default()))
        }
        EventType::ActionStart => parts.push("Action Start".into()),
        EventType::ActionEnd => parts.push("Action Ende".into()),
        EventType::StartingLineup => {
            let names: Vec<&str> = lineup
                .map(|l| l.iter().map(|p| p.name.as_str()).collect())
                .unwrap_or_default();
            parts.push(format!("Starting lineup: {}", names.join(", ")));
        }
        EventType::Other => {}
    }

    parts.join(". ")
}

use crate::EventType;
use crate::events::{EventDraft, PlayerRef, template_for};
use log::debug;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotType {
    FreeThrow,
    Two,
    Three,
}

impl ShotType {
    pub fn points(&self) -> u8 {
        match self {
            ShotType::FreeThrow => 1,
            ShotType::Two => 2,
            ShotType::Three => 3,
        }
    }
}

impl TryFrom<u8> for ShotType {
    type Error = TaggingError;

    fn try_from(points: u8) -> Result<Self, Self::Error> {
        match points {
            1 => Ok(ShotType::FreeThrow),
            2 => Ok(ShotType::Two),
            3 => Ok(ShotType::Three),
            other => Err(TaggingError::InvalidShotType(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotResult {
    Made,
    Missed,
}

/// The action picked for the selected player, with its menu label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedAction {
    pub kind: EventType,
    pub label: String,
    pub icon: String,
}

impl SelectedAction {
    pub fn new(kind: EventType, label: impl Into<String>, icon: impl Into<String>) -> Self {
        Self { kind, label: label.into(), icon: icon.into() }
    }

    /// Label and icon taken from the template table.
    pub fn from_kind(kind: EventType) -> Self {
        match template_for(kind) {
            Some(t) => Self::new(kind, t.label, t.icon),
            None => Self::new(kind, format!("{kind:?}"), ""),
        }
    }
}

/// Pending selection. Each variant holds exactly what is known at that point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TaggingStep {
    #[default]
    Idle,
    PlayerSelected {
        player: PlayerRef,
    },
    AwaitingShotType {
        player: PlayerRef,
        action: SelectedAction,
    },
    AwaitingShotResult {
        player: PlayerRef,
        action: SelectedAction,
        shot: ShotType,
    },
    AwaitingSubstitutionIn {
        outgoing: PlayerRef,
        action: SelectedAction,
    },
}

impl TaggingStep {
    pub fn name(&self) -> &'static str {
        match self {
            TaggingStep::Idle => "idle",
            TaggingStep::PlayerSelected { .. } => "player-selected",
            TaggingStep::AwaitingShotType { .. } => "action-selected",
            TaggingStep::AwaitingShotResult { .. } => "shot-type-selected",
            TaggingStep::AwaitingSubstitutionIn { .. } => "substitution-select-in",
        }
    }

    pub fn player(&self) -> Option<&PlayerRef> {
        match self {
            TaggingStep::Idle => None,
            TaggingStep::PlayerSelected { player }
            | TaggingStep::AwaitingShotType { player, .. }
            | TaggingStep::AwaitingShotResult { player, .. } => Some(player),
            TaggingStep::AwaitingSubstitutionIn { outgoing, .. } => Some(outgoing),
        }
    }

    pub fn action(&self) -> Option<&SelectedAction> {
        match self {
            TaggingStep::AwaitingShotType { action, .. }
            | TaggingStep::AwaitingShotResult { action, .. }
            | TaggingStep::AwaitingSubstitutionIn { action, .. } => Some(action),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggingError {
    InvalidTransition { state: &'static str, operation: &'static str },
    UnsupportedAction(EventType),
    InvalidShotType(u8),
    NotOnCourt(String),
    AlreadyOnCourt(String),
    UnknownPlayer(String),
    LineupIncomplete(usize),
}

impl fmt::Display for TaggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaggingError::InvalidTransition { state, operation } => {
                write!(f, "cannot {operation} while {state}")
            }
            TaggingError::UnsupportedAction(kind) => {
                write!(f, "{kind:?} is not a player action")
            }
            TaggingError::InvalidShotType(p) => write!(f, "no shot is worth {p} points"),
            TaggingError::NotOnCourt(name) => write!(f, "{name} is not on court"),
            TaggingError::AlreadyOnCourt(name) => write!(f, "{name} is already on court"),
            TaggingError::UnknownPlayer(who) => write!(f, "unknown player {who}"),
            TaggingError::LineupIncomplete(n) => {
                write!(f, "select a starting five first ({n}/5 on court)")
            }
        }
    }
}

impl std::error::Error for TaggingError {}

/// Outcome of a successful step.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Pending,
    Committed(EventDraft),
}

/// Multi-step player → action → detail selection. Never touches the log;
/// committed drafts are handed back to the caller.
#[derive(Debug, Clone, Default)]
pub struct TaggingMachine {
    step: TaggingStep,
}

impl TaggingMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> &TaggingStep {
        &self.step
    }

    pub fn is_idle(&self) -> bool {
        self.step == TaggingStep::Idle
    }

    /// Start a sequence for `player`. Whatever was pending is dropped.
    pub fn select_player(&mut self, player: PlayerRef) {
        debug!("tagging: player {} selected (was {})", player.name, self.step.name());
        self.step = TaggingStep::PlayerSelected { player };
    }

    pub fn select_action(&mut self, action: SelectedAction) -> Result<Transition, TaggingError> {
        let TaggingStep::PlayerSelected { player } = &self.step else {
            return Err(self.invalid("select an action"));
        };
        let player = player.clone();

        if action.kind.commits_immediately() {
            self.step = TaggingStep::Idle;
            return Ok(Transition::Committed(EventDraft::new(action.kind).player(player)));
        }

        match action.kind {
            EventType::Shot => {
                self.step = TaggingStep::AwaitingShotType { player, action };
                Ok(Transition::Pending)
            }
            EventType::Substitution => {
                self.step = TaggingStep::AwaitingSubstitutionIn { outgoing: player, action };
                Ok(Transition::Pending)
            }
            other => Err(TaggingError::UnsupportedAction(other)),
        }
    }

    pub fn select_shot_type(&mut self, shot: ShotType) -> Result<Transition, TaggingError> {
        let TaggingStep::AwaitingShotType { player, action } = &self.step else {
            return Err(self.invalid("select a shot type"));
        };
        self.step = TaggingStep::AwaitingShotResult {
            player: player.clone(),
            action: action.clone(),
            shot,
        };
        Ok(Transition::Pending)
    }

    pub fn select_shot_result(&mut self, result: ShotResult) -> Result<Transition, TaggingError> {
        let TaggingStep::AwaitingShotResult { player, shot, .. } = &self.step else {
            return Err(self.invalid("select a shot result"));
        };
        let draft = EventDraft::new(EventType::Shot)
            .player(player.clone())
            .shot(shot.points(), result == ShotResult::Missed);
        self.step = TaggingStep::Idle;
        Ok(Transition::Committed(draft))
    }

    pub fn select_substitution_in(&mut self, incoming: PlayerRef) -> Result<Transition, TaggingError> {
        let TaggingStep::AwaitingSubstitutionIn { outgoing, .. } = &self.step else {
            return Err(self.invalid("select an incoming player"));
        };
        let same = match (&incoming.id, &outgoing.id) {
            (Some(a), Some(b)) => a == b,
            _ => incoming.name == outgoing.name,
        };
        if same {
            return Err(TaggingError::AlreadyOnCourt(incoming.name));
        }
        let draft = EventDraft::new(EventType::Substitution)
            .player(incoming)
            .substitution_out(outgoing.clone());
        self.step = TaggingStep::Idle;
        Ok(Transition::Committed(draft))
    }

    /// Drop any pending selection. Returns whether something was pending.
    pub fn cancel(&mut self) -> bool {
        let was_pending = !self.is_idle();
        self.step = TaggingStep::Idle;
        was_pending
    }

    fn invalid(&self, operation: &'static str) -> TaggingError {
        TaggingError::InvalidTransition { state: self.step.name(), operation }
    }
}

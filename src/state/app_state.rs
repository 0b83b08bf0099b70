use crate::app::MenuItem;
use hooptag_core::SaveData;
use std::time::Instant;

// ---------------------------------------------------------------------------
// Text input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    LearningNote,
    /// `Name, jersey, position`
    AddPlayer,
    /// Picking who grabbed the rebound of a missed shot.
    PickRebounder { shot_id: String },
}

#[derive(Debug, Default)]
pub struct InputState {
    pub mode: InputMode,
    pub buffer: String,
    /// Cursor for list pickers.
    pub cursor: usize,
}

impl InputState {
    pub fn is_composing(&self) -> bool {
        matches!(self.mode, InputMode::LearningNote | InputMode::AddPlayer)
    }

    pub fn is_active(&self) -> bool {
        self.mode != InputMode::Normal
    }

    pub fn begin(&mut self, mode: InputMode) {
        self.mode = mode;
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Leave input mode and hand back what was typed.
    pub fn finish(&mut self) -> String {
        self.mode = InputMode::Normal;
        self.cursor = 0;
        std::mem::take(&mut self.buffer)
    }
}

// ---------------------------------------------------------------------------
// Video player link
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PlaybackState {
    pub connected: bool,
    pub playing: bool,
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub level: StatusLevel,
}

// ---------------------------------------------------------------------------
// Persistence bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SaveState {
    /// A save request is in flight.
    pub saving: bool,
    /// Last edit that has not been saved yet; arms the autosave timer.
    pub last_edit: Option<Instant>,
    pub last_saved_id: Option<String>,
    /// An earlier video's project whose save failed; the next `w` resends it.
    pub failed_flush: Option<SaveData>,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    /// Roster and project have both loaded; tagging keys are live.
    pub ready: bool,
    pub confirm_quit: bool,
    /// Row in the tagging tab's player list (whole roster or the five on court).
    pub player_cursor: usize,
    pub bench_cursor: usize,
    pub event_cursor: usize,
    pub roster_cursor: usize,
    pub input: InputState,
    pub playback: PlaybackState,
    pub save: SaveState,
    pub status: Option<StatusLine>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status = Some(StatusLine { text: text.into(), level });
    }
}

/// Move a list cursor by `delta`, staying inside `0..len`.
pub fn step_cursor(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = cursor as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}

use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use hooptag_core::{Player, ProjectKey, ProjectMeta, SaveData};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadRoster,
    LoadProject { key: ProjectKey },
    SaveProject { data: SaveData },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    RosterLoaded { players: Vec<Player> },
    /// `data` is `None` when nothing is stored under `key`.
    ProjectLoaded {
        key: ProjectKey,
        data: Option<SaveData>,
        meta: Option<ProjectMeta>,
    },
    /// `remote_meta` is what the store held right before the write.
    ProjectSaved {
        id: Option<String>,
        data: SaveData,
        remote_meta: Option<ProjectMeta>,
    },
    /// The store rejected a save. The data comes back so it can be retried.
    SaveFailed { data: SaveData, message: String },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    Tick,
}

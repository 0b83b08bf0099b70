use hooptag_core::client::{ProjectClient, RosterClient};
use hooptag_core::store::{AnyStore, FileStore};
use log::LevelFilter;
use std::path::PathBuf;

pub const DEFAULT_PLAYER_WS: &str = "ws://127.0.0.1:8788";

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// Project API base URL. Without it projects are kept as local files.
    pub store_url: Option<String>,
    pub roster_url: Option<String>,
    pub roster_file: Option<PathBuf>,
    pub player_ws: String,
    pub game_number: u32,
    /// 1-based playlist position.
    pub video_index: u32,
    pub config_dir: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            store_url: None,
            roster_url: None,
            roster_file: None,
            player_ws: DEFAULT_PLAYER_WS.to_string(),
            game_number: 1,
            video_index: 1,
            config_dir: PathBuf::from("hooptag"),
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            full_screen: false,
            log_level: get("HOOPTAG_LOG").and_then(|raw| parse_level(&raw)),
            store_url: get("HOOPTAG_STORE_URL"),
            roster_url: get("HOOPTAG_ROSTER_URL"),
            roster_file: get("HOOPTAG_ROSTER_JSON").map(PathBuf::from),
            player_ws: get("HOOPTAG_PLAYER_WS").unwrap_or_else(|| DEFAULT_PLAYER_WS.to_string()),
            game_number: get("HOOPTAG_GAME").and_then(|v| v.parse().ok()).unwrap_or(1),
            video_index: get("HOOPTAG_VIDEO_INDEX")
                .and_then(|v| v.parse().ok())
                .filter(|i| *i > 0)
                .unwrap_or(1),
            config_dir: config_dir(get("XDG_CONFIG_HOME"), get("HOME")),
        }
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.config_dir.join("projects")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.config_dir.join("exports")
    }

    pub fn project_store(&self) -> AnyStore {
        match &self.store_url {
            Some(url) => AnyStore::Remote(ProjectClient::new(url.as_str())),
            None => AnyStore::Local(FileStore::new(self.projects_dir())),
        }
    }

    pub fn roster_client(&self) -> RosterClient {
        RosterClient::new(self.roster_url.clone(), self.roster_file.clone())
    }
}

fn config_dir(xdg_config_home: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(dir) = xdg_config_home {
        return PathBuf::from(dir).join("hooptag");
    }
    if let Some(home) = home {
        return PathBuf::from(home).join(".config").join("hooptag");
    }
    PathBuf::from("hooptag")
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

use crate::client::ProjectClient;
use crate::project::last_known_modified;
use crate::{ProjectKey, ProjectMeta, SaveData};
use log::{debug, warn};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    Json(serde_json::Error, String),
    Io(std::io::Error, PathBuf),
    NotFound(String),
    Other(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            StoreError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            StoreError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            StoreError::Json(e, source) => write!(f, "Invalid JSON in {source}: {e}"),
            StoreError::Io(e, path) => write!(f, "I/O error for {}: {e}", path.display()),
            StoreError::NotFound(msg) => write!(f, "Not found: {msg}"),
            StoreError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    pub fn is_network(&self) -> bool {
        matches!(self, StoreError::Network(..))
    }
}

/// Where tagging projects live.
///
/// `load_project` resolves to `None` when there is nothing usable to load;
/// only transport failures are errors. `save_project` returns the stored id.
pub trait ProjectStore {
    fn load_project(&self, key: ProjectKey) -> impl Future<Output = StoreResult<Option<SaveData>>> + Send;

    fn save_project(&self, data: &SaveData) -> impl Future<Output = StoreResult<Option<String>>> + Send;

    fn project_meta(&self, key: ProjectKey) -> impl Future<Output = StoreResult<Option<ProjectMeta>>> + Send;
}

pub(crate) fn key_of(data: &SaveData) -> StoreResult<ProjectKey> {
    let game_number = data
        .game_number
        .ok_or_else(|| StoreError::Other("project has no game number".into()))?;
    Ok(ProjectKey::new(game_number, data.video_index.unwrap_or(1)))
}

// ---------------------------------------------------------------------------
// Local files
// ---------------------------------------------------------------------------

/// One pretty-printed JSON file per game and video.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_id(key: ProjectKey) -> String {
        format!("game-{}-video-{}", key.game_number, key.video_index)
    }

    fn path_for(&self, key: ProjectKey) -> PathBuf {
        self.root.join(format!("{}.json", Self::project_id(key)))
    }

    fn read(&self, key: ProjectKey) -> StoreResult<Option<SaveData>> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!("no local project at {}", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| StoreError::Io(e, path.clone()))?;
        match serde_json::from_str::<SaveData>(&content) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!("ignoring unreadable project {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    fn write(&self, data: &SaveData) -> StoreResult<Option<String>> {
        let key = key_of(data)?;
        std::fs::create_dir_all(&self.root).map_err(|e| StoreError::Io(e, self.root.clone()))?;
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StoreError::Json(e, path.display().to_string()))?;
        std::fs::write(&path, json).map_err(|e| StoreError::Io(e, path.clone()))?;
        debug!("saved project to {}", path.display());
        Ok(Some(Self::project_id(key)))
    }
}

impl ProjectStore for FileStore {
    async fn load_project(&self, key: ProjectKey) -> StoreResult<Option<SaveData>> {
        self.read(key)
    }

    async fn save_project(&self, data: &SaveData) -> StoreResult<Option<String>> {
        self.write(data)
    }

    async fn project_meta(&self, key: ProjectKey) -> StoreResult<Option<ProjectMeta>> {
        Ok(self.read(key)?.map(|data| ProjectMeta {
            id: Self::project_id(key),
            last_modified: last_known_modified(&data).to_owned(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Runtime choice
// ---------------------------------------------------------------------------

/// The store picked from configuration at startup.
#[derive(Debug, Clone)]
pub enum AnyStore {
    Remote(ProjectClient),
    Local(FileStore),
}

impl AnyStore {
    pub fn describe(&self) -> String {
        match self {
            AnyStore::Remote(client) => client.base_url().to_owned(),
            AnyStore::Local(files) => files.root().display().to_string(),
        }
    }
}

impl ProjectStore for AnyStore {
    async fn load_project(&self, key: ProjectKey) -> StoreResult<Option<SaveData>> {
        match self {
            AnyStore::Remote(client) => client.load_project(key).await,
            AnyStore::Local(files) => files.load_project(key).await,
        }
    }

    async fn save_project(&self, data: &SaveData) -> StoreResult<Option<String>> {
        match self {
            AnyStore::Remote(client) => client.save_project(data).await,
            AnyStore::Local(files) => files.save_project(data).await,
        }
    }

    async fn project_meta(&self, key: ProjectKey) -> StoreResult<Option<ProjectMeta>> {
        match self {
            AnyStore::Remote(client) => client.project_meta(key).await,
            AnyStore::Local(files) => files.project_meta(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectContext, build_save_data};
    use crate::{Event, EventType, Player, Position};
    use chrono::{TimeZone, Utc};

    fn save(game: Option<u32>) -> SaveData {
        let context = ProjectContext { game_number: game, video_index: 3, ..Default::default() };
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        build_save_data(
            &[Player::new("a", "Lena Marsh", 23, Position::Forward)],
            &[Event::bare("e1", 4.0, EventType::Highlight)],
            &context,
            now,
        )
    }

    #[tokio::test]
    async fn file_store_round_trips_a_project() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::new(dir.path().join("projects"));
        let key = ProjectKey::new(7, 3);

        assert_eq!(store.load_project(key).await.expect("load"), None);
        assert_eq!(store.project_meta(key).await.expect("meta"), None);

        let data = save(Some(7));
        let id = store.save_project(&data).await.expect("save");
        assert_eq!(id.as_deref(), Some("game-7-video-3"));

        assert_eq!(store.load_project(key).await.expect("load"), Some(data));
        let meta = store.project_meta(key).await.expect("meta").expect("meta present");
        assert_eq!(meta.last_modified, "2026-03-01T12:00:00.000Z");
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("game-1-video-1.json"), "{ not json").expect("write");
        let store = AnyStore::Local(FileStore::new(dir.path()));
        assert_eq!(store.load_project(ProjectKey::new(1, 1)).await.expect("load"), None);
    }

    #[tokio::test]
    async fn saving_without_game_number_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::new(dir.path());
        let err = store.save_project(&save(None)).await.expect_err("needs a game number");
        assert!(matches!(err, StoreError::Other(_)));
    }
}

use crate::store::{ProjectStore, StoreError, StoreResult, key_of};
use crate::wire::{RosterRow, SaveResponse};
use crate::{Player, ProjectKey, ProjectMeta, SaveData};
use log::{debug, warn};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

const USER_AGENT: &str = "hooptag/0.1 (terminal video tagger)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_ROSTER_JSON: &str = include_str!("../default_roster.json");

fn http_client() -> Client {
    Client::builder().user_agent(USER_AGENT).build().unwrap_or_default()
}

/// GET and decode. A 4xx answer decodes as `T::default()`.
async fn get_json<T: Default + serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> StoreResult<T> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| StoreError::Network(e, url.to_owned()))?;

    match response.error_for_status() {
        Ok(res) => res
            .json::<T>()
            .await
            .map_err(|e| StoreError::Parsing(e, url.to_owned())),
        Err(e) => {
            if e.status().map(|s| s.is_client_error()).unwrap_or(false) {
                Ok(T::default())
            } else {
                Err(StoreError::Api(e, url.to_owned()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Project store over HTTP
// ---------------------------------------------------------------------------

/// JSON project API: `GET|PUT /projects/{game}/{video}` and
/// `GET /projects/{game}/{video}/meta`.
#[derive(Debug, Clone)]
pub struct ProjectClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ProjectClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn project_url(&self, key: ProjectKey) -> String {
        format!("{}/projects/{}/{}", self.base_url, key.game_number, key.video_index)
    }
}

impl ProjectStore for ProjectClient {
    async fn load_project(&self, key: ProjectKey) -> StoreResult<Option<SaveData>> {
        let url = self.project_url(key);
        match get_json::<Option<SaveData>>(&self.client, &url, self.timeout).await {
            Ok(data) => Ok(data),
            Err(e) if e.is_network() => Err(e),
            Err(e) => {
                warn!("treating project {url} as missing: {e}");
                Ok(None)
            }
        }
    }

    async fn save_project(&self, data: &SaveData) -> StoreResult<Option<String>> {
        let url = self.project_url(key_of(data)?);
        let response = self
            .client
            .put(&url)
            .timeout(self.timeout)
            .json(data)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.clone()))?
            .error_for_status()
            .map_err(|e| StoreError::Api(e, url.clone()))?;

        let saved: SaveResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parsing(e, url.clone()))?;
        debug!("saved project to {url} as {:?}", saved.id);
        Ok(saved.id)
    }

    async fn project_meta(&self, key: ProjectKey) -> StoreResult<Option<ProjectMeta>> {
        let url = format!("{}/meta", self.project_url(key));
        get_json::<Option<ProjectMeta>>(&self.client, &url, self.timeout).await
    }
}

// ---------------------------------------------------------------------------
// Active roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RosterClient {
    client: Client,
    base_url: Option<String>,
    roster_file: Option<PathBuf>,
    timeout: Duration,
}

impl Default for RosterClient {
    fn default() -> Self {
        Self {
            client: http_client(),
            base_url: None,
            roster_file: None,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl RosterClient {
    pub fn new(base_url: Option<String>, roster_file: Option<PathBuf>) -> Self {
        Self {
            base_url: base_url.map(|u| u.trim_end_matches('/').to_owned()),
            roster_file,
            ..Self::default()
        }
    }

    /// Fetch the players to seed the session with.
    ///
    /// Fallback chain:
    /// 1) local roster file, if configured.
    /// 2) `GET {base}/players/active`, if configured and non-empty.
    /// 3) the embedded default roster.
    pub async fn fetch_active_players(&self) -> StoreResult<Vec<Player>> {
        if let Some(path) = &self.roster_file {
            match read_roster_file(path) {
                Ok(players) => return Ok(players),
                Err(e) => warn!("roster file unusable, trying the next source: {e}"),
            }
        }

        if let Some(base) = &self.base_url {
            let url = format!("{base}/players/active");
            match get_json::<Vec<RosterRow>>(&self.client, &url, self.timeout).await {
                Ok(rows) if !rows.is_empty() => {
                    return Ok(rows.into_iter().map(RosterRow::into_player).collect());
                }
                Ok(_) => warn!("roster source {url} returned no players"),
                Err(e) => warn!("roster source unavailable: {e}"),
            }
        }

        load_embedded_roster()
    }
}

fn read_roster_file(path: &Path) -> StoreResult<Vec<Player>> {
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io(e, path.to_path_buf()))?;
    let rows: Vec<RosterRow> =
        serde_json::from_str(&content).map_err(|e| StoreError::Json(e, path.display().to_string()))?;
    Ok(rows.into_iter().map(RosterRow::into_player).collect())
}

pub fn load_embedded_roster() -> StoreResult<Vec<Player>> {
    let rows: Vec<RosterRow> = serde_json::from_str(DEFAULT_ROSTER_JSON)
        .map_err(|e| StoreError::Json(e, "embedded roster".into()))?;
    Ok(rows.into_iter().map(RosterRow::into_player).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectContext, build_save_data};
    use crate::{Event, EventType, Position};
    use chrono::{TimeZone, Utc};

    fn sample_save() -> SaveData {
        let context = ProjectContext { game_number: Some(7), video_index: 2, ..Default::default() };
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        build_save_data(
            &[Player::new("a", "Lena Marsh", 4, Position::Guard)],
            &[Event::bare("e1", 4.0, EventType::Highlight)],
            &context,
            now,
        )
    }

    #[tokio::test]
    async fn load_project_decodes_saved_data() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::to_string(&sample_save()).expect("serializes");
        let mock = server
            .mock("GET", "/projects/7/2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = ProjectClient::new(format!("{}/", server.url()));
        let loaded = client.load_project(ProjectKey::new(7, 2)).await.expect("load");
        mock.assert_async().await;
        assert_eq!(loaded, Some(sample_save()));
    }

    #[tokio::test]
    async fn missing_or_broken_project_loads_as_none() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server.mock("GET", "/projects/1/1").with_status(404).create_async().await;
        let _broken = server
            .mock("GET", "/projects/1/2")
            .with_status(200)
            .with_body("{\"events\": 3}")
            .create_async()
            .await;
        let _down = server.mock("GET", "/projects/1/3").with_status(503).create_async().await;

        let client = ProjectClient::new(server.url());
        for video in 1..=3 {
            let loaded = client.load_project(ProjectKey::new(1, video)).await.expect("not an error");
            assert!(loaded.is_none(), "video {video} should load as none");
        }
    }

    #[tokio::test]
    async fn network_failure_is_surfaced() {
        let client = ProjectClient::new("http://127.0.0.1:1");
        let err = client.load_project(ProjectKey::new(1, 1)).await.expect_err("unreachable");
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn save_project_puts_json_and_returns_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/projects/7/2")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"version":"1.0.0","gameNumber":7,"videoIndex":2}"#.into(),
            ))
            .with_status(200)
            .with_body(r#"{"id":"proj-42"}"#)
            .create_async()
            .await;

        let client = ProjectClient::new(server.url());
        let id = client.save_project(&sample_save()).await.expect("save");
        mock.assert_async().await;
        assert_eq!(id.as_deref(), Some("proj-42"));
    }

    #[tokio::test]
    async fn save_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("PUT", "/projects/7/2").with_status(500).create_async().await;
        let client = ProjectClient::new(server.url());
        let err = client.save_project(&sample_save()).await.expect_err("server error");
        assert!(matches!(err, StoreError::Api(..)));
    }

    #[tokio::test]
    async fn project_meta_decodes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/projects/7/2/meta")
            .with_status(200)
            .with_body(r#"{"id":"proj-42","lastModified":"2026-03-01T12:05:00Z"}"#)
            .create_async()
            .await;
        let client = ProjectClient::new(server.url());
        let meta = client.project_meta(ProjectKey::new(7, 2)).await.expect("meta");
        assert_eq!(
            meta,
            Some(ProjectMeta { id: "proj-42".into(), last_modified: "2026-03-01T12:05:00Z".into() })
        );
    }

    #[tokio::test]
    async fn roster_prefers_http_then_falls_back_to_embedded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/players/active")
            .with_status(200)
            .with_body(r#"[{"id":"x1","first_name":"Ada","last_name":"Quist","jersey_number":5,"position":"Center"}]"#)
            .create_async()
            .await;

        let remote = RosterClient::new(Some(server.url()), None);
        let players = remote.fetch_active_players().await.expect("roster");
        assert_eq!(players, vec![Player::new("x1", "Ada Quist", 5, Position::Center)]);

        let offline = RosterClient::new(Some("http://127.0.0.1:1".into()), None);
        let fallback = offline.fetch_active_players().await.expect("embedded roster");
        assert_eq!(fallback.len(), 12);
    }

    #[tokio::test]
    async fn roster_file_wins() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("roster.json");
        std::fs::write(&path, r#"[{"id":"f1","firstName":"Mo","lastName":"Ek"}]"#).expect("write");
        let client = RosterClient::new(Some("http://127.0.0.1:1".into()), Some(path));
        let players = client.fetch_active_players().await.expect("roster");
        assert_eq!(players[0].name, "Mo Ek");
        assert_eq!(players[0].jersey_number, 0);
    }

    #[tokio::test]
    async fn missing_roster_file_falls_through_to_http() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/players/active")
            .with_status(200)
            .with_body(r#"[{"id":"h1","firstName":"Ida","lastName":"Brandt","jerseyNumber":9}]"#)
            .create_async()
            .await;

        let missing = PathBuf::from("/nonexistent/hooptag/roster.json");
        let client = RosterClient::new(Some(server.url()), Some(missing.clone()));
        let players = client.fetch_active_players().await.expect("http roster");
        assert_eq!(players[0].name, "Ida Brandt");

        let dir = tempfile::tempdir().expect("temp dir");
        let broken = dir.path().join("roster.json");
        std::fs::write(&broken, "not json").expect("write");
        for path in [missing, broken] {
            let offline = RosterClient::new(None, Some(path));
            let fallback = offline.fetch_active_players().await.expect("embedded roster");
            assert_eq!(fallback.len(), 12);
        }
    }

    #[test]
    fn embedded_roster_parses() {
        let players = load_embedded_roster().expect("embedded roster should parse");
        assert!(players.iter().all(|p| !p.name.is_empty()));
    }
}

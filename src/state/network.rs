use crate::state::messages::{NetworkRequest, NetworkResponse};
use hooptag_core::client::RosterClient;
use hooptag_core::store::{AnyStore, ProjectStore, StoreError};
use hooptag_core::{ProjectKey, ProjectMeta, SaveData};
use log::{debug, error, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Owns the project store and the roster source; answers one request at a time.
pub struct NetworkWorker {
    store: AnyStore,
    roster: RosterClient,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        store: AnyStore,
        roster: RosterClient,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            store,
            roster,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        debug!("network worker using project store {}", self.store.describe());
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let (is_ok, response) = match request {
                NetworkRequest::LoadRoster => answer(self.handle_load_roster().await),
                NetworkRequest::LoadProject { key } => answer(self.handle_load_project(key).await),
                NetworkRequest::SaveProject { data } => match self.store_project(&data).await {
                    Ok((id, remote_meta)) => (true, NetworkResponse::ProjectSaved { id, data, remote_meta }),
                    Err(e) => {
                        warn!("save failed: {e}");
                        (false, NetworkResponse::SaveFailed { data, message: e.to_string() })
                    }
                },
            };

            debug!("network request complete");
            self.stop_loading_animation(is_ok).await;

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_load_roster(&self) -> Result<NetworkResponse, StoreError> {
        debug!("loading active roster");
        let players = self.roster.fetch_active_players().await?;
        Ok(NetworkResponse::RosterLoaded { players })
    }

    async fn handle_load_project(&self, key: ProjectKey) -> Result<NetworkResponse, StoreError> {
        debug!("loading project for game {} video {}", key.game_number, key.video_index);
        let data = self.store.load_project(key).await?;
        let meta = self.fetch_meta(key).await;
        Ok(NetworkResponse::ProjectLoaded { key, data, meta })
    }

    /// Returns the stored id and the metadata the store held before the write.
    async fn store_project(&self, data: &SaveData) -> Result<(Option<String>, Option<ProjectMeta>), StoreError> {
        let (Some(game), Some(video)) = (data.game_number, data.video_index) else {
            return Err(StoreError::Other("project has no game number".into()));
        };
        let remote_meta = self.fetch_meta(ProjectKey::new(game, video)).await;
        let id = self.store.save_project(data).await?;
        Ok((id, remote_meta))
    }

    /// Conflict metadata is advisory; failures read as "no metadata".
    async fn fetch_meta(&self, key: ProjectKey) -> Option<ProjectMeta> {
        match self.store.project_meta(key).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("project metadata unavailable: {e}");
                None
            }
        }
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

fn answer(result: Result<NetworkResponse, StoreError>) -> (bool, NetworkResponse) {
    match result {
        Ok(response) => (true, response),
        Err(err) => (false, NetworkResponse::Error { message: err.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hooptag_core::client::ProjectClient;
    use hooptag_core::store::FileStore;
    use hooptag_core::{Event, EventType, Player, Position};

    fn spawn_worker(dir: &std::path::Path) -> (mpsc::Sender<NetworkRequest>, mpsc::Receiver<NetworkResponse>) {
        spawn_with_store(AnyStore::Local(FileStore::new(dir)))
    }

    fn spawn_with_store(store: AnyStore) -> (mpsc::Sender<NetworkRequest>, mpsc::Receiver<NetworkResponse>) {
        let (req_tx, req_rx) = mpsc::channel(8);
        let (resp_tx, resp_rx) = mpsc::channel(64);
        let worker = NetworkWorker::new(store, RosterClient::default(), req_rx, resp_tx);
        tokio::spawn(worker.run());
        (req_tx, resp_rx)
    }

    async fn next_answer(responses: &mut mpsc::Receiver<NetworkResponse>) -> NetworkResponse {
        loop {
            match responses.recv().await.expect("worker alive") {
                NetworkResponse::LoadingStateChanged { .. } => continue,
                other => return other,
            }
        }
    }

    fn save_data() -> SaveData {
        SaveData {
            version: "1.0.0".into(),
            timestamp: "2026-03-01T12:00:00.000Z".into(),
            last_modified: Some("2026-03-01T12:00:00.000Z".into()),
            players: vec![Player::new("a", "Lena Marsh", 4, Position::Guard)],
            events: vec![Event::bare("e1", 3.0, EventType::Highlight)],
            video_id: None,
            playlist_id: None,
            game_number: Some(4),
            video_index: Some(1),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn roster_falls_back_to_embedded_players() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (requests, mut responses) = spawn_worker(dir.path());
        requests.send(NetworkRequest::LoadRoster).await.expect("send");
        match next_answer(&mut responses).await {
            NetworkResponse::RosterLoaded { players } => assert_eq!(players.len(), 12),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn save_then_load_reports_previous_meta() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (requests, mut responses) = spawn_worker(dir.path());

        requests.send(NetworkRequest::SaveProject { data: save_data() }).await.expect("send");
        match next_answer(&mut responses).await {
            NetworkResponse::ProjectSaved { id, remote_meta, .. } => {
                assert_eq!(id.as_deref(), Some("game-4-video-1"));
                assert!(remote_meta.is_none());
            }
            other => panic!("unexpected response {other:?}"),
        }

        let key = ProjectKey::new(4, 1);
        requests.send(NetworkRequest::LoadProject { key }).await.expect("send");
        match next_answer(&mut responses).await {
            NetworkResponse::ProjectLoaded { data, meta, .. } => {
                assert_eq!(data, Some(save_data()));
                assert_eq!(meta.map(|m| m.last_modified).as_deref(), Some("2026-03-01T12:00:00.000Z"));
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_save_hands_the_data_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (requests, mut responses) = spawn_worker(dir.path());
        let data = SaveData { game_number: None, ..save_data() };
        requests.send(NetworkRequest::SaveProject { data: data.clone() }).await.expect("send");
        match next_answer(&mut responses).await {
            NetworkResponse::SaveFailed { data: returned, message } => {
                assert_eq!(returned, data);
                assert!(message.contains("game number"));
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn save_goes_ahead_when_remote_meta_is_down() {
        let mut server = mockito::Server::new_async().await;
        let meta = server
            .mock("GET", "/projects/7/2/meta")
            .with_status(500)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/projects/7/2")
            .with_status(200)
            .with_body(r#"{"id":"proj-1"}"#)
            .create_async()
            .await;

        let (requests, mut responses) = spawn_with_store(AnyStore::Remote(ProjectClient::new(server.url())));
        let data = SaveData { game_number: Some(7), video_index: Some(2), ..save_data() };
        requests.send(NetworkRequest::SaveProject { data: data.clone() }).await.expect("send");
        match next_answer(&mut responses).await {
            NetworkResponse::ProjectSaved { id, data: saved, remote_meta } => {
                assert_eq!(id.as_deref(), Some("proj-1"));
                assert_eq!(saved, data);
                assert!(remote_meta.is_none());
            }
            other => panic!("unexpected response {other:?}"),
        }
        meta.assert_async().await;
        put.assert_async().await;
    }
}

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// What the TUI asks of the video player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoCommand {
    Seek { seconds: f64 },
    Play,
    Pause,
    Next,
    Previous,
    QueryTime,
}

/// What the video link reports back to the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoEvent {
    Connected,
    Disconnected,
    Time { seconds: f64 },
    State { playing: bool },
    VideoChanged { video_id: Option<String>, index: u32 },
    Error(String),
}

/// JSON text frame exchanged through the player relay, tagged by `type`.
///
/// The relay echoes every frame to every client, so the TUI also sees its own
/// commands come back; those are dropped on receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlayerFrame {
    Time { seconds: f64 },
    State { playing: bool },
    VideoChanged {
        #[serde(default)]
        video_id: Option<String>,
        index: u32,
    },
    Seek { seconds: f64 },
    Play,
    Pause,
    Next,
    Previous,
    QueryTime,
}

impl From<VideoCommand> for PlayerFrame {
    fn from(cmd: VideoCommand) -> Self {
        match cmd {
            VideoCommand::Seek { seconds } => PlayerFrame::Seek { seconds: seconds.max(0.0) },
            VideoCommand::Play => PlayerFrame::Play,
            VideoCommand::Pause => PlayerFrame::Pause,
            VideoCommand::Next => PlayerFrame::Next,
            VideoCommand::Previous => PlayerFrame::Previous,
            VideoCommand::QueryTime => PlayerFrame::QueryTime,
        }
    }
}

impl PlayerFrame {
    /// Frames coming from the player; `None` for echoed commands.
    pub fn into_event(self) -> Option<VideoEvent> {
        match self {
            PlayerFrame::Time { seconds } => Some(VideoEvent::Time { seconds }),
            PlayerFrame::State { playing } => Some(VideoEvent::State { playing }),
            PlayerFrame::VideoChanged { video_id, index } => {
                Some(VideoEvent::VideoChanged { video_id, index: index.max(1) })
            }
            _ => None,
        }
    }
}

pub fn parse_frame(text: &str) -> Result<Option<VideoEvent>, serde_json::Error> {
    serde_json::from_str::<PlayerFrame>(text).map(PlayerFrame::into_event)
}

#[derive(Debug)]
pub struct VideoLink {
    pub url: String,
    pub commands: mpsc::Receiver<VideoCommand>,
    pub events: mpsc::Sender<VideoEvent>,
}

impl VideoLink {
    pub async fn run(mut self) {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    let _ = self.events.send(VideoEvent::Connected).await;
                    let (mut write, mut read) = stream.split();

                    loop {
                        tokio::select! {
                            maybe_cmd = self.commands.recv() => {
                                let Some(cmd) = maybe_cmd else {
                                    return;
                                };
                                if let Err(e) = send_command(&mut write, cmd).await {
                                    let _ = self.events.send(VideoEvent::Error(format!("player send failed: {e}"))).await;
                                    let _ = self.events.send(VideoEvent::Disconnected).await;
                                    break;
                                }
                            }
                            inbound = read.next() => {
                                match inbound {
                                    Some(Ok(Message::Text(text))) => {
                                        match parse_frame(&text) {
                                            Ok(Some(event)) => {
                                                let _ = self.events.send(event).await;
                                            }
                                            Ok(None) => {}
                                            Err(e) => {
                                                let _ = self.events.send(VideoEvent::Error(format!("player frame parse error: {e}"))).await;
                                            }
                                        }
                                    }
                                    Some(Ok(Message::Close(_))) | None => {
                                        let _ = self.events.send(VideoEvent::Disconnected).await;
                                        break;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        let _ = self.events.send(VideoEvent::Error(format!("player read failed: {e}"))).await;
                                        let _ = self.events.send(VideoEvent::Disconnected).await;
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    let _ = self
                        .events
                        .send(VideoEvent::Error(format!("player connect failed: {e}")))
                        .await;
                    let _ = self.events.send(VideoEvent::Disconnected).await;
                }
            }

            // Playback commands are only meaningful against a live player;
            // whatever queued up while offline is stale.
            loop {
                match self.commands.try_recv() {
                    Ok(_) => {}
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => return,
                }
            }
            sleep(Duration::from_secs(2)).await;
        }
    }
}

async fn send_command<S>(write: &mut S, cmd: VideoCommand) -> Result<(), String>
where
    S: futures_util::sink::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(&PlayerFrame::from(cmd)).map_err(|e| e.to_string())?;
    write
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_as_tagged_frames() {
        let seek = serde_json::to_string(&PlayerFrame::from(VideoCommand::Seek { seconds: 42.5 })).unwrap();
        assert_eq!(seek, r#"{"type":"seek","seconds":42.5}"#);
        let query = serde_json::to_string(&PlayerFrame::from(VideoCommand::QueryTime)).unwrap();
        assert_eq!(query, r#"{"type":"queryTime"}"#);
    }

    #[test]
    fn negative_seek_is_clamped() {
        assert_eq!(PlayerFrame::from(VideoCommand::Seek { seconds: -3.0 }), PlayerFrame::Seek { seconds: 0.0 });
    }

    #[test]
    fn player_frames_become_events() {
        assert_eq!(
            parse_frame(r#"{"type":"time","seconds":91.25}"#).unwrap(),
            Some(VideoEvent::Time { seconds: 91.25 })
        );
        assert_eq!(
            parse_frame(r#"{"type":"videoChanged","videoId":"dQw4","index":3}"#).unwrap(),
            Some(VideoEvent::VideoChanged { video_id: Some("dQw4".into()), index: 3 })
        );
        assert_eq!(
            parse_frame(r#"{"type":"videoChanged","index":0}"#).unwrap(),
            Some(VideoEvent::VideoChanged { video_id: None, index: 1 })
        );
        assert_eq!(
            parse_frame(r#"{"type":"state","playing":true}"#).unwrap(),
            Some(VideoEvent::State { playing: true })
        );
    }

    #[test]
    fn echoed_commands_are_ignored() {
        assert_eq!(parse_frame(r#"{"type":"pause"}"#).unwrap(), None);
        assert_eq!(parse_frame(r#"{"type":"seek","seconds":1.0}"#).unwrap(), None);
    }

    #[test]
    fn unknown_frames_are_errors() {
        assert!(parse_frame(r#"{"type":"volume","level":3}"#).is_err());
        assert!(parse_frame("not json").is_err());
    }
}

use futures_util::{SinkExt, StreamExt};
use std::env;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Last `videoChanged` frame seen, replayed to clients that join later.
type CurrentVideo = Arc<Mutex<Option<String>>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = env::var("HOOPTAG_RELAY_BIND").unwrap_or_else(|_| "0.0.0.0:8788".to_string());
    let listener = TcpListener::bind(&addr).await?;
    let (tx, _rx) = broadcast::channel::<String>(512);
    let current: CurrentVideo = Arc::default();

    eprintln!("player relay listening on {addr}");

    loop {
        let (stream, peer) = listener.accept().await?;
        let tx = tx.clone();
        let rx = tx.subscribe();
        let current = current.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, tx, rx, current).await {
                eprintln!("client {peer} disconnected: {e}");
            }
        });
    }
}

/// The frame's `type`, or `None` when the text is not a tagged JSON object.
fn frame_type(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("type")?.as_str().map(str::to_string)
}

async fn handle_client(
    stream: TcpStream,
    tx: broadcast::Sender<String>,
    mut rx: broadcast::Receiver<String>,
    current: CurrentVideo,
) -> anyhow::Result<()> {
    let ws = accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    let replay = current.lock().await.clone();
    if let Some(frame) = replay {
        write.send(Message::Text(frame.into())).await?;
    }

    loop {
        tokio::select! {
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let text = text.to_string();
                        match frame_type(&text).as_deref() {
                            None => eprintln!("dropping untagged frame"),
                            Some(kind) => {
                                if kind == "videoChanged" {
                                    *current.lock().await = Some(text.clone());
                                }
                                let _ = tx.send(text);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Ok(text) => {
                        write.send(Message::Text(text.into())).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        eprintln!("client lagged, skipped {skipped} frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

use crate::state::messages::UiEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Drives the UI clock: each tick polls the player for its position and gives
/// the app a chance to autosave.
pub struct TimePoller {
    ui_events: mpsc::Sender<UiEvent>,
}

impl TimePoller {
    pub fn new(ui_events: mpsc::Sender<UiEvent>) -> Self {
        Self { ui_events }
    }

    pub async fn run(self) {
        let mut ticks = interval(POLL_INTERVAL);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Skip the immediate first tick so startup loading goes first.
        ticks.tick().await;

        loop {
            ticks.tick().await;
            if self.ui_events.send(UiEvent::Tick).await.is_err() {
                break;
            }
        }
    }
}

use crate::{Event, EventType};
use log::warn;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LogError {
    NegativeTimestamp(f64),
    NonFiniteTimestamp,
    DuplicateId(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::NegativeTimestamp(t) => write!(f, "event timestamp {t} is before the video start"),
            LogError::NonFiniteTimestamp => write!(f, "event timestamp is not a number"),
            LogError::DuplicateId(id) => write!(f, "an event with id {id} already exists"),
        }
    }
}

impl std::error::Error for LogError {}

/// Append-only list of tagged events. Insertion order is kept; consumers that
/// care about video order call [`EventLog::sorted`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from loaded events, dropping the ones that would break the
    /// log invariants.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut log = Self::new();
        for event in events {
            if let Err(e) = log.append(event) {
                warn!("dropping loaded event: {e}");
            }
        }
        log
    }

    pub fn append(&mut self, event: Event) -> Result<(), LogError> {
        if !event.timestamp.is_finite() {
            return Err(LogError::NonFiniteTimestamp);
        }
        if event.timestamp < 0.0 {
            return Err(LogError::NegativeTimestamp(event.timestamp));
        }
        if self.contains(&event.id) {
            return Err(LogError::DuplicateId(event.id));
        }
        self.events.push(event);
        Ok(())
    }

    /// Remove by id. Returns the removed event, if any.
    pub fn remove(&mut self, id: &str) -> Option<Event> {
        let idx = self.events.iter().position(|e| e.id == id)?;
        Some(self.events.remove(idx))
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in ascending timestamp order; ties keep insertion order.
    pub fn sorted(&self) -> Vec<&Event> {
        sorted_events(&self.events)
    }

    /// The most recent confirmed starting five, if one was recorded.
    pub fn latest_snapshot(&self) -> Option<&Event> {
        self.sorted()
            .into_iter()
            .rev()
            .find(|e| e.kind == EventType::StartingLineup && e.lineup.as_ref().is_some_and(|l| !l.is_empty()))
    }

    /// Timestamp of the latest event, or 0 for an empty log.
    pub fn last_timestamp(&self) -> f64 {
        self.events.iter().map(|e| e.timestamp).fold(0.0, f64::max)
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

pub(crate) fn sorted_events(events: &[Event]) -> Vec<&Event> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    sorted
}

//! In-memory append-only event log

use crate::source::EventSource;
use eventually_types::{Event, StreamId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Append-only event log keyed by stream
///
/// Cloning yields another handle to the same log: hand one clone to the
/// producer and another to the waiter. Events are never mutated or removed
/// after they are appended.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Events per stream, in insertion order
    streams: Arc<RwLock<HashMap<StreamId, Vec<Event>>>>,
}

impl EventLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, assigning the next sequence number of its stream
    pub async fn append(
        &self,
        stream: &StreamId,
        event_type: impl Into<String>,
        payload: Value,
    ) -> Event {
        let mut streams = self.streams.write().await;
        let events = streams.entry(stream.clone()).or_default();

        let event = Event::new(stream.clone(), events.len() as u64, event_type, payload);
        events.push(event.clone());

        debug!(
            stream = %stream,
            sequence = event.sequence,
            event_type = %event.event_type,
            "Event appended"
        );
        event
    }

    /// Snapshot of a stream's events, in insertion order
    pub async fn events(&self, stream: &StreamId) -> Vec<Event> {
        self.streams
            .read()
            .await
            .get(stream)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of events in a stream
    pub async fn len(&self, stream: &StreamId) -> usize {
        self.streams.read().await.get(stream).map_or(0, Vec::len)
    }

    /// Whether a stream has no events yet
    pub async fn is_empty(&self, stream: &StreamId) -> bool {
        self.len(stream).await == 0
    }

    /// Streams that have received at least one event
    pub async fn streams(&self) -> Vec<StreamId> {
        let mut ids: Vec<StreamId> = self.streams.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl EventSource for EventLog {
    async fn get_events(&self, stream: &StreamId) -> anyhow::Result<Vec<Event>> {
        Ok(self.events(stream).await)
    }
}

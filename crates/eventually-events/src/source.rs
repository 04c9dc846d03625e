//! Read contract for event log owners

use eventually_types::{Event, StreamId};
use std::future::Future;
use std::sync::Arc;

/// Anything that can hand out the current contents of an event stream
///
/// Called on every poll tick, so implementations should be cheap and must
/// return a fresh snapshot each time. Unknown streams read as empty.
pub trait EventSource: Send + Sync {
    /// All events of `stream`, in insertion order
    fn get_events(
        &self,
        stream: &StreamId,
    ) -> impl Future<Output = anyhow::Result<Vec<Event>>> + Send;
}

impl<S: EventSource> EventSource for Arc<S> {
    fn get_events(
        &self,
        stream: &StreamId,
    ) -> impl Future<Output = anyhow::Result<Vec<Event>>> + Send {
        self.as_ref().get_events(stream)
    }
}

impl<S: EventSource> EventSource for &S {
    fn get_events(
        &self,
        stream: &StreamId,
    ) -> impl Future<Output = anyhow::Result<Vec<Event>>> + Send {
        (**self).get_events(stream)
    }
}

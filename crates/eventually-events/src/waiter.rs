//! Event waiter
//!
//! Each query re-reads the stream on every tick and scans it from the
//! start, so the answer is always the earliest qualifying event no matter
//! how many more arrived while polling.

use crate::source::EventSource;
use eventually_poll::{poll_until_async, Result, WaitConfig, WaitError, WaitSpec, DEFAULT_INTERVAL};
use eventually_types::{Event, StreamId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Waits for events to show up in an [`EventSource`]
///
/// Waiters only read. Any number of them may watch the same stream at once.
pub struct EventWaiter<S> {
    source: S,
    interval: Duration,
    cancel: Option<CancellationToken>,
}

impl<S: EventSource> EventWaiter<S> {
    /// Create a waiter polling every [`DEFAULT_INTERVAL`]
    pub fn new(source: S) -> Self {
        Self {
            source,
            interval: DEFAULT_INTERVAL,
            cancel: None,
        }
    }

    /// Create a waiter using the configured polling interval
    pub fn from_config(source: S, config: &WaitConfig) -> Self {
        Self::new(source).with_interval(config.interval())
    }

    /// Override the delay between reads
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Abort every wait of this waiter once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn spec(&self, description: String, timeout: Duration) -> WaitSpec {
        let spec = WaitSpec::new(description, timeout).with_interval(self.interval);
        match &self.cancel {
            Some(token) => spec.with_cancellation(token.clone()),
            None => spec,
        }
    }

    /// Wait for the first event of `event_type`
    ///
    /// # Errors
    /// [`WaitError::Timeout`] naming the type and stream if none appears in
    /// time; [`WaitError::Condition`] if the source cannot be read
    pub async fn wait_for_event(
        &self,
        stream: &StreamId,
        event_type: &str,
        timeout: Duration,
    ) -> Result<Event> {
        let spec = self.spec(format!("event '{event_type}' on stream '{stream}'"), timeout);

        poll_until_async(&spec, || async move {
            let events = self.source.get_events(stream).await?;
            Ok::<_, anyhow::Error>(events.into_iter().find(|event| event.is(event_type)))
        })
        .await
    }

    /// Wait until at least `count` events of `event_type` exist
    ///
    /// Returns the first `count` matching events in log order; events
    /// appended beyond the threshold are not included. A `count` of zero
    /// is satisfied immediately.
    ///
    /// # Errors
    /// [`WaitError::CountTimeout`] reporting how many were observed;
    /// [`WaitError::Condition`] if the source cannot be read
    pub async fn wait_for_event_count(
        &self,
        stream: &StreamId,
        event_type: &str,
        count: usize,
        timeout: Duration,
    ) -> Result<Vec<Event>> {
        let spec = self.spec(
            format!("{count} '{event_type}' event(s) on stream '{stream}'"),
            timeout,
        );
        spec.validate()?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let observed = AtomicUsize::new(0);
        let observed_ref = &observed;

        let result = poll_until_async(&spec, move || async move {
            let events = self.source.get_events(stream).await?;
            let matching: Vec<Event> = events
                .into_iter()
                .filter(|event| event.is(event_type))
                .take(count)
                .collect();

            observed_ref.store(matching.len(), Ordering::Relaxed);
            Ok::<_, anyhow::Error>((matching.len() == count).then_some(matching))
        })
        .await;

        result.map_err(|e| match e {
            WaitError::Timeout {
                timeout, elapsed, ..
            } => {
                let observed = observed.load(Ordering::Relaxed);
                debug!(%stream, event_type, count, observed, "Event count not reached");
                WaitError::CountTimeout {
                    stream: stream.to_string(),
                    event_type: event_type.to_string(),
                    expected: count,
                    observed,
                    timeout,
                    elapsed,
                }
            }
            other => other,
        })
    }

    /// Wait for the first event satisfying `predicate`
    ///
    /// `description` is reported verbatim on timeout, since a predicate
    /// cannot describe itself.
    ///
    /// # Errors
    /// [`WaitError::Timeout`] carrying `description`; [`WaitError::Condition`]
    /// if the source cannot be read
    pub async fn wait_for_event_match<P>(
        &self,
        stream: &StreamId,
        predicate: P,
        description: &str,
        timeout: Duration,
    ) -> Result<Event>
    where
        P: Fn(&Event) -> bool + Sync,
    {
        let spec = self.spec(description.to_string(), timeout);
        let predicate = &predicate;

        poll_until_async(&spec, move || async move {
            let events = self.source.get_events(stream).await?;
            Ok::<_, anyhow::Error>(events.into_iter().find(|event| predicate(event)))
        })
        .await
    }
}

use crate::config::Config;
use crate::session::{simulate_turn, SessionLog};
use anyhow::Result;
use eventually_events::{EventLog, EventWaiter};
use eventually_persistence::SqliteEventLog;
use eventually_poll::WaitError;
use eventually_types::{kinds, StreamId};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Demo service - runs a simulated agent turn and waits on its events
pub struct DemoService {
    config: Config,
}

impl DemoService {
    /// Create a new demo service
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the demo service
    pub async fn run(self) -> Result<()> {
        // Initialize logging
        eventually_logging::init_logging(&self.config.logging.level, self.config.logging.format)?;
        info!("Starting eventually demo");

        info!(
            "Wait config: timeout={:?}, interval={:?}",
            self.config.wait.timeout(),
            self.config.wait.interval()
        );

        let log = match &self.config.database.path {
            Some(path) => SessionLog::Sqlite(SqliteEventLog::new(path).await?),
            None => SessionLog::Memory(EventLog::new()),
        };

        // Ctrl+C aborts outstanding waits instead of letting them run out
        let cancel = CancellationToken::new();
        let signal_token = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                return;
            }
            info!("Received shutdown signal");
            signal_token.cancel();
        });

        let stream = StreamId::new();
        info!("Simulating agent turn on stream {}", stream);
        let producer = tokio::spawn(simulate_turn(
            log.clone(),
            stream.clone(),
            self.config.demo.clone(),
        ));

        let waiter = EventWaiter::from_config(log, &self.config.wait).with_cancellation(cancel);

        match self.observe(&waiter, &stream).await {
            Ok(()) => {
                producer.await??;
                info!("Demo finished");
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                producer.abort();
                info!("Shutting down gracefully...");
                Ok(())
            }
            Err(e) => {
                producer.abort();
                Err(e.into())
            }
        }
    }

    async fn observe(
        &self,
        waiter: &EventWaiter<SessionLog>,
        stream: &StreamId,
    ) -> Result<(), WaitError> {
        let timeout = self.config.wait.timeout();
        let expected_calls = self.config.demo.tool_calls;

        if expected_calls > 0 {
            let first = waiter.wait_for_event(stream, kinds::TOOL_CALL, timeout).await?;
            info!(
                "First tool call at sequence {}: {}",
                first.sequence, first.payload
            );
        }

        let calls = waiter
            .wait_for_event_count(stream, kinds::TOOL_CALL, expected_calls, timeout)
            .await?;
        for call in &calls {
            info!("Tool call #{}: {}", call.sequence, call.payload);
        }

        let reply = waiter
            .wait_for_event_match(
                stream,
                |e| e.is(kinds::ASSISTANT_MESSAGE) && e.payload_field("text").is_some(),
                "assistant reply with text",
                timeout,
            )
            .await?;
        info!("Assistant replied: {}", reply.payload["text"]);

        Ok(())
    }
}

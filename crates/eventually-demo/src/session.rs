use crate::config::DemoConfig;
use anyhow::Result;
use eventually_events::{EventLog, EventSource};
use eventually_persistence::SqliteEventLog;
use eventually_types::{kinds, Event, StreamId};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const TOOLS: [&str; 3] = ["read_file", "bash", "list_directory"];

/// The log a simulated session writes to
#[derive(Clone)]
pub enum SessionLog {
    Memory(EventLog),
    Sqlite(SqliteEventLog),
}

impl SessionLog {
    pub async fn append(&self, stream: &StreamId, event_type: &str, payload: Value) -> Result<Event> {
        match self {
            SessionLog::Memory(log) => Ok(log.append(stream, event_type, payload).await),
            SessionLog::Sqlite(log) => log.append(stream, event_type, payload).await,
        }
    }
}

impl EventSource for SessionLog {
    async fn get_events(&self, stream: &StreamId) -> Result<Vec<Event>> {
        match self {
            SessionLog::Memory(log) => log.get_events(stream).await,
            SessionLog::Sqlite(log) => log.get_events(stream).await,
        }
    }
}

/// Play one agent turn: a user message, tool calls with results, a reply
pub async fn simulate_turn(log: SessionLog, stream: StreamId, demo: DemoConfig) -> Result<()> {
    let delay = Duration::from_millis(demo.step_delay_ms);

    log.append(
        &stream,
        kinds::USER_MESSAGE,
        json!({ "text": "What is in this repository?" }),
    )
    .await?;

    for i in 0..demo.tool_calls {
        let call_id = format!("call_{}", i);

        tokio::time::sleep(delay).await;
        log.append(
            &stream,
            kinds::TOOL_CALL,
            json!({ "id": call_id, "name": TOOLS[i % TOOLS.len()] }),
        )
        .await?;

        tokio::time::sleep(delay).await;
        log.append(&stream, kinds::TOOL_RESULT, json!({ "id": call_id, "status": "ok" }))
            .await?;
    }

    tokio::time::sleep(delay).await;
    log.append(
        &stream,
        kinds::ASSISTANT_MESSAGE,
        json!({ "text": format!("Finished after {} tool call(s).", demo.tool_calls) }),
    )
    .await?;

    debug!(%stream, "Simulated turn complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_turn_produces_expected_sequence() {
        let log = EventLog::new();
        let stream = StreamId::from("demo");
        let demo = DemoConfig {
            step_delay_ms: 1,
            tool_calls: 2,
        };

        simulate_turn(SessionLog::Memory(log.clone()), stream.clone(), demo)
            .await
            .unwrap();

        let types: Vec<String> = log
            .events(&stream)
            .await
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(
            types,
            vec![
                kinds::USER_MESSAGE,
                kinds::TOOL_CALL,
                kinds::TOOL_RESULT,
                kinds::TOOL_CALL,
                kinds::TOOL_RESULT,
                kinds::ASSISTANT_MESSAGE,
            ]
        );
    }
}

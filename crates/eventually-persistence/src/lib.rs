use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use eventually_events::EventSource;
use eventually_types::{Event, StreamId};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

/// Event log stored in SQLite
///
/// Lets a waiter observe events written by another connection or another
/// process. Any number of handles may append concurrently; each append is a
/// single statement, so sequence numbers stay gapless per stream.
#[derive(Debug, Clone)]
pub struct SqliteEventLog {
    pool: SqlitePool,
}

impl SqliteEventLog {
    /// Open (or create) the database at `database_path`
    pub async fn new(database_path: &str) -> Result<Self> {
        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = SqlitePool::connect(&database_url)
            .await
            .with_context(|| format!("Failed to open event database {}", database_path))?;

        let log = Self { pool };
        log.run_migrations().await?;

        info!("Event log initialized with database: {}", database_path);
        Ok(log)
    }

    /// Private in-memory database, gone when the last handle is dropped
    pub async fn in_memory() -> Result<Self> {
        // Every connection to `sqlite::memory:` is its own database, so the
        // pool must hold exactly one connection and never recycle it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let log = Self { pool };
        log.run_migrations().await?;
        Ok(log)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                stream_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                event_type TEXT NOT NULL,
                payload TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (stream_id, sequence)
            );

            CREATE INDEX IF NOT EXISTS idx_events_type ON events(stream_id, event_type);
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Event log migrations completed");
        Ok(())
    }

    /// Append an event, assigning the next sequence number of its stream
    ///
    /// The sequence is computed inside the insert itself, so SQLite holds the
    /// write lock while reading the current maximum and concurrent appends
    /// from any number of connections queue behind it.
    pub async fn append(
        &self,
        stream: &StreamId,
        event_type: &str,
        payload: Value,
    ) -> Result<Event> {
        let timestamp = Utc::now();

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO events (stream_id, sequence, event_type, payload, timestamp)
            SELECT ?1, COALESCE(MAX(sequence) + 1, 0), ?2, ?3, ?4
            FROM events
            WHERE stream_id = ?1
            RETURNING sequence
            "#,
        )
        .bind(stream.as_str())
        .bind(event_type)
        .bind(serde_json::to_string(&payload)?)
        .bind(timestamp.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to append {} event to stream {}", event_type, stream))?;

        debug!(%stream, sequence, event_type, "Event persisted");
        Ok(Event {
            stream_id: stream.clone(),
            sequence: u64::try_from(sequence)?,
            event_type: event_type.to_string(),
            payload,
            timestamp,
        })
    }

    /// All events of a stream, in insertion order
    pub async fn events(&self, stream: &StreamId) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            r#"
            SELECT sequence, event_type, payload, timestamp
            FROM events
            WHERE stream_id = ?
            ORDER BY sequence ASC
            "#,
        )
        .bind(stream.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| decode_event(stream, row)).collect()
    }
}

fn decode_event(stream: &StreamId, row: &SqliteRow) -> Result<Event> {
    let sequence: i64 = row.get("sequence");
    let payload: String = row.get("payload");
    let timestamp: String = row.get("timestamp");

    Ok(Event {
        stream_id: stream.clone(),
        sequence: u64::try_from(sequence)?,
        event_type: row.get("event_type"),
        payload: serde_json::from_str(&payload)
            .with_context(|| format!("Corrupt payload for event {} of {}", sequence, stream))?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .with_context(|| format!("Corrupt timestamp for event {} of {}", sequence, stream))?
            .with_timezone(&Utc),
    })
}

impl EventSource for SqliteEventLog {
    async fn get_events(&self, stream: &StreamId) -> Result<Vec<Event>> {
        self.events(stream).await
    }
}

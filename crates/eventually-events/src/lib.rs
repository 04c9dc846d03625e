//! Eventually Events
//!
//! Answers "has the expected thing happened yet?" against an append-only
//! event log, polling it with [`eventually_poll`].
//!
//! ## Features
//!
//! - Wait for the first event of a type, for N events of a type, or for the
//!   first event matching a predicate
//! - Always returns the earliest qualifying events, in log order
//! - Re-reads the log on every tick; never answers from a stale snapshot
//! - In-memory [`EventLog`] for tests, [`EventSource`] for any other owner

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod log;
pub mod source;
pub mod waiter;

pub use eventually_poll::{WaitConfig, WaitError};
pub use eventually_types::{kinds, Event, StreamId};
pub use log::EventLog;
pub use source::EventSource;
pub use waiter::EventWaiter;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{kinds, Event, EventLog, EventSource, EventWaiter, StreamId, WaitError};
}

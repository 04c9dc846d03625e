//! Eventually Poll
//!
//! Turns "check repeatedly" into "wait once" for asynchronous tests.
//!
//! ## Features
//!
//! - Poll a synchronous or asynchronous condition until it yields a value
//! - Bounded, explicit timeouts and polling intervals on every call
//! - Early abort through a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - Errors that name what was awaited and how long the wait took
//! - Blocking variant for tests that do not run inside a runtime

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod config;
pub mod error;
pub mod poller;
pub mod spec;

pub use config::WaitConfig;
pub use error::{BoxError, Result, WaitError};
pub use poller::{poll_until, poll_until_async, poll_until_blocking, wait_for, wait_until};
pub use spec::{WaitSpec, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{poll_until, poll_until_async, wait_for, wait_until, WaitError, WaitSpec};
}

//! Eventually Types - Core types for condition-based waiting
//!
//! This module defines the event records that an asynchronous operation
//! appends to a stream, and the identifiers used to address those streams.

mod event;
mod stream;

pub use event::{kinds, Event};
pub use stream::StreamId;

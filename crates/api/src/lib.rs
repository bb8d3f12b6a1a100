//! External service adapters for the liquidation watcher.
//!
//! This crate provides the two sinks qualifying records flow into:
//! - Slack: bearer-authenticated `chat.postMessage` notifications
//! - Journal: append-only JSON-lines file with per-entry metadata
//!
//! Both implement [`RecordSink`] and are best-effort; a failed delivery is
//! logged by the caller and never stops the stream.

mod journal;
mod sink;
mod slack;

pub use journal::RecordJournal;
pub use sink::{RecordSink, SinkError};
pub use slack::SlackNotifier;

//! Block timestamp normalization.
//!
//! Node timestamps arrive as RFC 3339 strings in whatever zone the node
//! reports. Records render them in a single civil zone (US Eastern) at
//! microsecond precision so journal entries and notifications read
//! consistently regardless of where the watcher runs.

use chrono::DateTime;
use chrono_tz::America::New_York;
use thiserror::Error;

/// Rendered format: `YYYY-MM-DD HH:MM:SS.ffffff`.
const BLOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// The node-supplied timestamp could not be parsed as a date-time.
///
/// A per-block failure: the caller skips the block's dispatch and keeps the
/// session alive.
#[derive(Debug, Error)]
#[error("unparseable block timestamp {input:?}")]
pub struct TimestampParseError {
    pub input: String,
    #[source]
    source: chrono::ParseError,
}

/// Normalize a node timestamp into the fixed-zone display string.
pub fn normalize_block_time(raw: &str) -> Result<String, TimestampParseError> {
    let parsed = DateTime::parse_from_rfc3339(raw).map_err(|source| TimestampParseError {
        input: raw.to_string(),
        source,
    })?;

    Ok(parsed
        .with_timezone(&New_York)
        .format(BLOCK_TIME_FORMAT)
        .to_string())
}

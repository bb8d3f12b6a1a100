//! Liquidation watcher core logic.
//!
//! This crate provides:
//! - Startup configuration (env + optional TOML profile)
//! - Block timestamp normalization into a fixed civil zone
//! - The block processor: classify, extract, threshold-gate, and dispatch
//!   liquidation records to the registered sinks

mod config;
mod processor;
mod time;

pub use config::WatcherConfig;
pub use processor::BlockProcessor;
pub use time::{normalize_block_time, TimestampParseError};

//! Live liquidation watcher.
//!
//! Holds a WebSocket subscription to a node's new-block stream, filters each
//! block for collateral liquidation events, and forwards significant ones to
//! Slack and an append-only journal. Best-effort live tail: no backfill, no
//! cross-restart dedup, reconnects forever on a fixed delay.

use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use liqwatch_api::{RecordJournal, SlackNotifier};
use liqwatch_chain::StreamSession;
use liqwatch_core::{BlockProcessor, WatcherConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,liqwatch_core=debug,liqwatch_chain=debug")),
        )
        .init();

    let config = WatcherConfig::load()?;
    config.log_config();

    info!("Starting liquidation watcher");

    // Sinks: journal first so the durable write is attempted before the
    // network call; both are always attempted per record.
    let journal = RecordJournal::open(&config.journal_path)?;
    let notifier = SlackNotifier::new(&config.slack_token, &config.slack_channel);

    let processor = BlockProcessor::new(config.repay_threshold, &config.explorer_base)
        .with_sink(journal)
        .with_sink(notifier);

    let mut session = StreamSession::new(
        &config.node_ws_url,
        &config.chain_id,
        Duration::from_secs(config.reconnect_delay_secs),
        processor,
    );

    info!("Starting stream session");
    session.run().await;

    Ok(())
}

//! Block processing: classify, extract, gate, dispatch.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use liqwatch_api::RecordSink;
use liqwatch_chain::{
    extract, is_liquidation_event, BlockHandler, BlockMessage, LiquidationRecord,
};

use crate::time::{normalize_block_time, TimestampParseError};

/// Walks each delivered block once, in order: transactions, their logs, their
/// events. Matching events become per-event records sharing the block's
/// height and normalized timestamp; records above the significance threshold
/// go to every registered sink.
pub struct BlockProcessor {
    sinks: Vec<Box<dyn RecordSink>>,
    /// Minimum repay amount (standard units, exclusive) for dispatch.
    threshold: f64,
    explorer_base: String,
}

impl BlockProcessor {
    pub fn new(threshold: f64, explorer_base: impl Into<String>) -> Self {
        Self {
            sinks: Vec::new(),
            threshold,
            explorer_base: explorer_base.into(),
        }
    }

    /// Register a sink. Sinks are attempted in registration order for every
    /// qualifying record.
    pub fn with_sink(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    fn tx_link(&self, txhash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base, txhash)
    }

    /// Process one block message; returns how many records were dispatched.
    ///
    /// The block timestamp is normalized once per block. A timestamp that
    /// does not parse fails the whole block, not individual events; the
    /// caller logs it and skips the block.
    pub async fn process(
        &mut self,
        message: &BlockMessage,
    ) -> Result<usize, TimestampParseError> {
        let header = &message.data.block.header;
        let block_time = normalize_block_time(&header.time)?;

        let mut dispatched = 0;
        for (tx_index, tx) in message.data.txs.iter().enumerate() {
            for log in &tx.logs {
                for event in &log.events {
                    if !is_liquidation_event(event) {
                        continue;
                    }

                    let fields = extract(event);
                    let record = LiquidationRecord {
                        block_height: header.height,
                        block_time: block_time.clone(),
                        tx_link: self.tx_link(&tx.txhash),
                        tx_index,
                        liquidator: fields.liquidator,
                        borrower: fields.borrower,
                        repay_amount: fields.repay_amount,
                    };

                    if !record.is_significant(self.threshold) {
                        continue;
                    }

                    self.dispatch(&record).await;
                    dispatched += 1;
                }
            }
        }

        if dispatched > 0 {
            info!(
                height = header.height,
                dispatched, "block produced significant liquidations"
            );
        }

        Ok(dispatched)
    }

    /// Send one record to every sink. Deliveries are independent: a failure
    /// is logged and the remaining sinks are still attempted.
    async fn dispatch(&mut self, record: &LiquidationRecord) {
        info!(
            height = record.block_height,
            tx_index = record.tx_index,
            repay_amount = record.repay_amount,
            "liquidation above threshold"
        );

        for sink in &mut self.sinks {
            if let Err(e) = sink.deliver(record).await {
                warn!(sink = sink.name(), error = %e, "record delivery failed");
            }
        }
    }
}

#[async_trait]
impl BlockHandler for BlockProcessor {
    async fn handle_block(&mut self, message: BlockMessage) -> Result<()> {
        self.process(&message).await?;
        Ok(())
    }
}

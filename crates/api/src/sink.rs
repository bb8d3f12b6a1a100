//! Sink seam shared by the notification and journal backends.

use async_trait::async_trait;
use thiserror::Error;

use liqwatch_chain::LiquidationRecord;

/// Failure delivering one record to one sink. Always recoverable: the caller
/// logs it and keeps going.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Transport-level failure reaching the service.
    #[error("delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),

    /// The service answered but refused the record.
    #[error("rejected by service (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("journal write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for dispatched liquidation records.
///
/// Sinks are independent and best-effort: each is attempted for every
/// qualifying record, and one sink's failure never suppresses another's
/// delivery.
#[async_trait]
pub trait RecordSink: Send {
    async fn deliver(&mut self, record: &LiquidationRecord) -> Result<(), SinkError>;

    fn name(&self) -> &'static str;
}

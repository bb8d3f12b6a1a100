//! Node-facing layer for the liquidation watcher.
//!
//! This crate provides:
//! - Serde wire types for the node's new-block stream and two-stage frame
//!   decoding that separates malformed JSON from wrong-shape messages
//! - The liquidation event classifier and attribute extractor
//! - The `LiquidationRecord` value dispatched to the sinks
//! - A reconnecting WebSocket stream session with strictly sequential
//!   block dispatch

mod block;
mod events;
mod session;

pub use block::{
    Block, BlockData, BlockHeader, BlockMessage, EventAttribute, FrameError, RawEvent, Tx,
    TxLog, decode_frame,
};
pub use events::{LiquidationFields, LiquidationRecord, extract, is_liquidation_event};
pub use session::{BlockHandler, SessionStatus, StreamSession};

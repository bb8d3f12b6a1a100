//! Wire model for the node's new-block stream.
//!
//! The node pushes one JSON frame per block. A frame that is not valid JSON
//! and a frame that is valid JSON but not shaped like a block message are
//! different failures with different log lines, so decoding happens in two
//! stages.

use serde::Deserialize;
use thiserror::Error;

/// Frame decoding failure.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame was not valid JSON at all.
    #[error("malformed frame: {0}")]
    Parse(#[source] serde_json::Error),

    /// The frame was valid JSON but did not match the block message shape
    /// (missing `data`, `block`, or `txs`, or wrongly typed fields).
    #[error("unexpected message shape: {0}")]
    Structure(#[source] serde_json::Error),
}

/// One inbound block message.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockMessage {
    pub data: BlockData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockData {
    pub block: Block,
    pub txs: Vec<Tx>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    /// Node-supplied timestamp, passed through verbatim; normalization
    /// happens once per block at processing time.
    pub time: String,
}

/// One transaction inside a block, in delivered order.
#[derive(Debug, Clone, Deserialize)]
pub struct Tx {
    pub txhash: String,
    #[serde(default)]
    pub logs: Vec<TxLog>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxLog {
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

/// A raw on-chain event: a type key plus the node's generic key/value
/// attribute encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub key: String,
    #[serde(default)]
    pub attributes: Vec<EventAttribute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

/// Decode one text frame into a block message.
///
/// Invalid JSON yields [`FrameError::Parse`]; well-formed JSON that is not a
/// block message yields [`FrameError::Structure`]. Both are per-frame
/// failures and neither should tear down the stream.
pub fn decode_frame(text: &str) -> Result<BlockMessage, FrameError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(FrameError::Parse)?;
    serde_json::from_value(value).map_err(FrameError::Structure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> String {
        serde_json::json!({
            "data": {
                "block": { "header": { "height": 100, "time": "2021-11-05T12:34:56.789Z" } },
                "txs": [
                    {
                        "txhash": "ABC123",
                        "logs": [
                            {
                                "events": [
                                    {
                                        "key": "wasm",
                                        "attributes": [
                                            { "key": "action", "value": "liquidate_collateral" },
                                            { "key": "repay_amount", "value": "150000000" }
                                        ]
                                    }
                                ]
                            }
                        ]
                    }
                ]
            }
        })
        .to_string()
    }

    #[test]
    fn decodes_block_message() {
        let msg = decode_frame(&sample_frame()).unwrap();
        assert_eq!(msg.data.block.header.height, 100);
        assert_eq!(msg.data.block.header.time, "2021-11-05T12:34:56.789Z");
        assert_eq!(msg.data.txs.len(), 1);
        assert_eq!(msg.data.txs[0].txhash, "ABC123");
        assert_eq!(msg.data.txs[0].logs[0].events[0].attributes.len(), 2);
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = decode_frame("{not json").unwrap_err();
        assert!(matches!(err, FrameError::Parse(_)));
    }

    #[test]
    fn wrong_shape_is_structure_error() {
        // Valid JSON, but no block message inside.
        let err = decode_frame(r#"{"subscribed":"new_block"}"#).unwrap_err();
        assert!(matches!(err, FrameError::Structure(_)));

        // `data` present but `txs` missing.
        let err = decode_frame(r#"{"data":{"block":{"header":{"height":1,"time":"t"}}}}"#)
            .unwrap_err();
        assert!(matches!(err, FrameError::Structure(_)));
    }

    #[test]
    fn missing_logs_default_to_empty() {
        let frame = serde_json::json!({
            "data": {
                "block": { "header": { "height": 7, "time": "2021-01-01T00:00:00Z" } },
                "txs": [ { "txhash": "DEF456" } ]
            }
        })
        .to_string();

        let msg = decode_frame(&frame).unwrap();
        assert!(msg.data.txs[0].logs.is_empty());
    }
}

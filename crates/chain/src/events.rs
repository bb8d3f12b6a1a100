//! Liquidation event classification and field extraction.

use serde::Serialize;
use tracing::debug;

use crate::block::RawEvent;

/// Attribute value that marks a collateral liquidation.
const LIQUIDATION_ACTION: &str = "liquidate_collateral";

/// Raw repay amounts are micro-denominated; divide by 10^6 for standard units.
const MICRO_UNIT: f64 = 1_000_000.0;

/// One dispatched liquidation, scoped to a single block-processing pass.
///
/// Never persisted and never compared to previously seen records; duplicate
/// suppression across reconnects is out of scope by design.
#[derive(Debug, Clone, Serialize)]
pub struct LiquidationRecord {
    pub block_height: u64,
    /// Normalized block timestamp (fixed zone, microsecond precision).
    pub block_time: String,
    /// Explorer link for the enclosing transaction.
    pub tx_link: String,
    /// 0-based position of the transaction within the block.
    pub tx_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrower: Option<String>,
    /// Repaid value in standard units; `None` until a parseable
    /// `repay_amount` attribute is seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repay_amount: Option<f64>,
}

impl LiquidationRecord {
    /// Whether this record clears the significance threshold.
    ///
    /// An absent (or unparseable) repay amount never qualifies.
    pub fn is_significant(&self, threshold: f64) -> bool {
        self.repay_amount.is_some_and(|amount| amount > threshold)
    }
}

/// The event-level slice of a [`LiquidationRecord`]: what the extractor can
/// fill in before the block processor adds height, time, and tx context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiquidationFields {
    pub liquidator: Option<String>,
    pub borrower: Option<String>,
    pub repay_amount: Option<f64>,
}

/// Does this event represent a collateral liquidation?
///
/// True iff some attribute has key `action` and value `liquidate_collateral`;
/// attribute order is irrelevant.
pub fn is_liquidation_event(event: &RawEvent) -> bool {
    event
        .attributes
        .iter()
        .any(|attr| attr.key == "action" && attr.value == LIQUIDATION_ACTION)
}

/// Pull the liquidation fields out of a matching event's attributes.
///
/// Scans once; unrecognized attribute keys are ignored so nodes that emit
/// extra attributes keep working. A `repay_amount` that does not parse as an
/// integer leaves the field `None`, which downstream treats as "does not meet
/// threshold" rather than an error.
pub fn extract(event: &RawEvent) -> LiquidationFields {
    let mut fields = LiquidationFields::default();

    for attr in &event.attributes {
        match attr.key.as_str() {
            "liquidator" => fields.liquidator = Some(attr.value.clone()),
            "borrower" => fields.borrower = Some(attr.value.clone()),
            "repay_amount" => {
                fields.repay_amount = match attr.value.parse::<i64>() {
                    // Parse the raw integer first; unit conversion comes after.
                    Ok(raw) => Some(raw as f64 / MICRO_UNIT),
                    Err(_) => {
                        debug!(value = %attr.value, "non-integer repay_amount attribute");
                        None
                    }
                };
            }
            _ => {}
        }
    }

    fields
}

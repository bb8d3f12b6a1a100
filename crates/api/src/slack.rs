//! Slack notification client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use liqwatch_chain::LiquidationRecord;

use crate::sink::{RecordSink, SinkError};

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Fixed prefix on every notification, ahead of the pretty-printed record.
const WARNING_PREFIX: &str = "⚠️  New Liquidation! \n";

/// Posts liquidation records to a Slack channel via `chat.postMessage`,
/// bearer-token authenticated.
pub struct SlackNotifier {
    client: reqwest::Client,
    base_url: String,
    token: String,
    channel: String,
}

/// Slack replies 200 even for most errors and reports them in-band.
#[derive(Debug, Deserialize)]
struct PostMessageAck {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            channel: channel.into(),
        }
    }

    /// Point the client at a different API root (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Render the notification text for one record.
    fn format_message(record: &LiquidationRecord) -> Result<String, SinkError> {
        let body = serde_json::to_string_pretty(record)?;
        Ok(format!("{WARNING_PREFIX}{body}"))
    }

    async fn post_message(&self, text: &str) -> Result<(), SinkError> {
        let url = format!("{}/chat.postMessage", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "channel": self.channel,
                "text": text,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                detail: "non-success HTTP status".to_string(),
            });
        }

        let ack: PostMessageAck = response.json().await?;
        if !ack.ok {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                detail: ack.error.unwrap_or_else(|| "unspecified slack error".to_string()),
            });
        }

        debug!(channel = %self.channel, "notification posted");
        Ok(())
    }
}

#[async_trait]
impl RecordSink for SlackNotifier {
    async fn deliver(&mut self, record: &LiquidationRecord) -> Result<(), SinkError> {
        let text = Self::format_message(record)?;
        self.post_message(&text).await
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> LiquidationRecord {
        LiquidationRecord {
            block_height: 5_200_100,
            block_time: "2021-11-05 08:34:56.789000".to_string(),
            tx_link: "https://finder.extraterrestrial.money/mainnet/tx/ABC123".to_string(),
            tx_index: 2,
            liquidator: Some("terra1liq".to_string()),
            borrower: Some("terra1bor".to_string()),
            repay_amount: Some(150.0),
        }
    }

    #[test]
    fn message_carries_prefix_and_record() {
        let text = SlackNotifier::format_message(&sample_record()).unwrap();
        assert!(text.starts_with(WARNING_PREFIX));
        assert!(text.contains("\"block_height\": 5200100"));
        assert!(text.contains("\"liquidator\": \"terra1liq\""));
        assert!(text.contains("\"repay_amount\": 150.0"));
    }

    #[test]
    fn ack_deserializes_in_band_errors() {
        let ack: PostMessageAck =
            serde_json::from_str(r#"{"ok":false,"error":"channel_not_found"}"#).unwrap();
        assert!(!ack.ok);
        assert_eq!(ack.error.as_deref(), Some("channel_not_found"));

        let ack: PostMessageAck = serde_json::from_str(r#"{"ok":true,"ts":"1.2"}"#).unwrap();
        assert!(ack.ok);
    }
}

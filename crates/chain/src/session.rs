//! Reconnecting WebSocket session against the node's block stream.
//!
//! One connection is live at a time. Frames are read and dispatched strictly
//! sequentially: the handler is awaited before the next frame is accepted, so
//! block order is preserved and there is never a backlog of in-flight blocks.
//! Any close or transport error leads back through a fixed delay to a fresh
//! connect + subscribe; the session is designed to run forever.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::block::{decode_frame, BlockMessage, FrameError};

/// Consumer of decoded block messages.
///
/// A handler error is a per-block failure: the session logs it and moves on
/// to the next frame without reconnecting.
#[async_trait]
pub trait BlockHandler: Send {
    async fn handle_block(&mut self, message: BlockMessage) -> Result<()>;
}

/// Session lifecycle, tracked for logging and introspection. The reconnect
/// loop itself is the state machine; this mirrors where it currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Subscribed,
}

/// Owns the subscription lifecycle: connect, subscribe, receive, dispatch,
/// reconnect.
pub struct StreamSession<H> {
    url: String,
    chain_id: String,
    reconnect_delay: Duration,
    status: SessionStatus,
    handler: H,
}

impl<H: BlockHandler> StreamSession<H> {
    pub fn new(
        url: impl Into<String>,
        chain_id: impl Into<String>,
        reconnect_delay: Duration,
        handler: H,
    ) -> Self {
        Self {
            url: url.into(),
            chain_id: chain_id.into(),
            reconnect_delay,
            status: SessionStatus::Disconnected,
            handler,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Run the session until the process is terminated.
    ///
    /// Open failures and unexpected closes take the same path: log, wait the
    /// fixed delay, reconnect. No backoff and no retry cap; a flapping
    /// endpoint is retried at a constant rate indefinitely.
    pub async fn run(&mut self) {
        loop {
            self.status = SessionStatus::Connecting;
            info!(url = %self.url, chain_id = %self.chain_id, "connecting to node stream");

            match self.connect_and_stream().await {
                Ok(()) => warn!("websocket closed by remote"),
                Err(e) => warn!(error = %e, "websocket connection error"),
            }

            self.status = SessionStatus::Disconnected;
            warn!(delay = ?self.reconnect_delay, "websocket closed, reopening");
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// One connection lifetime: open, subscribe, then read frames until the
    /// stream ends.
    async fn connect_and_stream(&mut self) -> Result<()> {
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        warn!("connected to websocket, subscribing");
        write
            .send(Message::Text(subscribe_message(&self.chain_id)))
            .await?;
        self.status = SessionStatus::Subscribed;

        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => self.dispatch_frame(&text).await,
                Ok(Message::Ping(data)) => {
                    write.send(Message::Pong(data)).await?;
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "websocket read error");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Decode and hand off one text frame. Every failure mode here is
    /// per-frame: the connection stays up.
    async fn dispatch_frame(&mut self, text: &str) {
        match decode_frame(text) {
            Ok(message) => {
                debug!(height = message.data.block.header.height, "block received");
                if let Err(e) = self.handler.handle_block(message).await {
                    warn!(error = %e, "block processing failed, skipping block");
                }
            }
            Err(e @ FrameError::Parse(_)) => {
                warn!(error = %e, "skipping malformed frame");
            }
            Err(e @ FrameError::Structure(_)) => {
                warn!(error = %e, "skipping unrecognized message");
            }
        }
    }
}

/// Subscription request for new-block events on one chain.
fn subscribe_message(chain_id: &str) -> String {
    serde_json::json!({
        "subscribe": "new_block",
        "chain_id": chain_id,
    })
    .to_string()
}

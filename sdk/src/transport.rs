//! Outbound transport boundary
//!
//! Framing and delivery belong to the transport; the bridge only hands it
//! envelopes. [`ChannelTransport`] is the in-process implementation used to
//! wire a bridge to a counterpart living in the same process.

use async_trait::async_trait;
use bridge_core::Envelope;
use tokio::sync::mpsc;

use crate::error::{BridgeError, Result};

/// Sends envelopes to the counterpart
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: Envelope) -> Result<()>;
}

/// Transport writing encoded envelopes into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<Vec<u8>>,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::Sender<Vec<u8>>) -> Self {
        Self { sender }
    }

    /// A transport and the receiving end of its frames
    pub fn pair(buffer: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, envelope: Envelope) -> Result<()> {
        self.sender
            .send(envelope.encode())
            .await
            .map_err(|_| BridgeError::Transport("channel closed".to_string()))
    }
}

//! The client-library end of an in-process bridge.

use std::sync::Arc;
use std::time::Duration;

use bridge_core::{Envelope, Message, ProxyMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::engine::WorkflowEngine;
use crate::error::{BridgeError, Result};
use crate::transport::ChannelTransport;

/// How long [`Counterpart::recv`] waits by default
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Plays the client library against a bridge wired with [`loopback`]
pub struct Counterpart {
    to_bridge: mpsc::Sender<Vec<u8>>,
    from_bridge: mpsc::Receiver<Vec<u8>>,
    recv_timeout: Duration,
}

impl Counterpart {
    pub fn new(to_bridge: mpsc::Sender<Vec<u8>>, from_bridge: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            to_bridge,
            from_bridge,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Send a message to the bridge
    pub async fn send(&self, message: impl Into<Message>) -> Result<()> {
        let frame = message.into().encode()?;
        self.send_frame(frame).await
    }

    /// Send an already-encoded frame, valid or not
    pub async fn send_frame(&self, frame: Vec<u8>) -> Result<()> {
        self.to_bridge
            .send(frame)
            .await
            .map_err(|_| BridgeError::Transport("bridge inbound closed".to_string()))
    }

    /// Next envelope the bridge sent
    pub async fn recv_envelope(&mut self) -> Result<Envelope> {
        let frame = tokio::time::timeout(self.recv_timeout, self.from_bridge.recv())
            .await
            .map_err(|_| BridgeError::Transport("no frame from bridge".to_string()))?
            .ok_or_else(|| BridgeError::Transport("bridge outbound closed".to_string()))?;
        Ok(Envelope::decode(&frame)?)
    }

    /// Next message the bridge sent
    pub async fn recv(&mut self) -> Result<Message> {
        let envelope = self.recv_envelope().await?;
        Ok(Message::from_envelope(&envelope)?)
    }

    /// Next message the bridge sent, which must be a `T`
    pub async fn recv_as<T: ProxyMessage>(&mut self) -> Result<T> {
        let envelope = self.recv_envelope().await?;
        Ok(T::from_envelope(&envelope)?)
    }

    /// True if nothing arrives within `wait`
    pub async fn is_quiet(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.from_bridge.recv())
            .await
            .is_err()
    }
}

/// Wire a bridge to a [`Counterpart`] over in-process channels and start
/// serving. The join handle completes when the serve loop exits.
pub fn loopback(
    config: BridgeConfig,
    engine: Arc<dyn WorkflowEngine>,
) -> Result<(Arc<Bridge>, Counterpart, JoinHandle<()>)> {
    config
        .validate()
        .map_err(|err| BridgeError::InvalidConfiguration(err.to_string()))?;
    let (to_bridge, inbound) = mpsc::channel(config.inbound_queue_size);
    let (transport, from_bridge) = ChannelTransport::pair(config.inbound_queue_size);

    let bridge = Arc::new(Bridge::new(config, engine, Arc::new(transport))?);
    let server = Arc::clone(&bridge);
    let handle = tokio::spawn(async move { server.serve(inbound).await });

    Ok((bridge, Counterpart::new(to_bridge, from_bridge), handle))
}

//! Inbound envelope dispatcher
//!
//! Every envelope the counterpart sends is decoded into a [`Message`] and
//! routed by its type: replies settle pending operations, requests drive the
//! engine and are answered with a reply envelope. A failed dispatch is
//! reported to the caller and counted; it never affects later envelopes.

mod replies;
mod requests;

use std::sync::Arc;

use bridge_core::{Envelope, Message, ProxyMessage};
use tracing::{debug, warn};

use crate::engine::WorkflowEngine;
use crate::error::{BridgeError, Result};
use crate::state::BridgeState;
use crate::transport::Transport;

/// Routes inbound envelopes to reply and request handlers
#[derive(Clone)]
pub struct Dispatcher {
    state: Arc<BridgeState>,
    engine: Arc<dyn WorkflowEngine>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(
        state: Arc<BridgeState>,
        engine: Arc<dyn WorkflowEngine>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            state,
            engine,
            transport,
        }
    }

    pub fn state(&self) -> &Arc<BridgeState> {
        &self.state
    }

    /// Decode a raw frame and dispatch it
    pub async fn dispatch_frame(&self, frame: &[u8]) -> Result<()> {
        match Envelope::decode(frame) {
            Ok(envelope) => self.dispatch(envelope).await,
            Err(err) => {
                self.state.metrics.record_dispatched();
                let err = BridgeError::from(err);
                self.state.metrics.record_error(&err);
                warn!(error = %err, "dropping undecodable frame");
                Err(err)
            }
        }
    }

    /// Dispatch one envelope
    pub async fn dispatch(&self, envelope: Envelope) -> Result<()> {
        self.state.metrics.record_dispatched();
        let type_code = envelope.type_code();

        let outcome = self.route(envelope).await;
        if let Err(err) = &outcome {
            self.state.metrics.record_error(err);
            if err.is_protocol() || err.is_correlation() {
                warn!(type_code, error = %err, "dispatch failed");
            } else {
                debug!(type_code, error = %err, "dispatch failed");
            }
        }
        outcome
    }

    async fn route(&self, envelope: Envelope) -> Result<()> {
        let message = Message::from_envelope(&envelope)?;
        let message_type = message.message_type();
        debug!(%message_type, "dispatching");

        if message_type.is_reply() {
            replies::handle_reply(&self.state, message)
        } else {
            requests::handle_request(self, message).await
        }
    }

    /// Encode and send a reply, counting the request as handled
    pub(crate) async fn send_reply<R: ProxyMessage>(&self, reply: R) -> Result<()> {
        let envelope = reply.to_envelope()?;
        self.transport.send(envelope).await?;
        self.state.metrics.record_request_handled();
        Ok(())
    }

    pub(crate) fn engine(&self) -> &Arc<dyn WorkflowEngine> {
        &self.engine
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

//! Bridge metrics collection

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::BridgeError;

/// Point-in-time copy of the bridge counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Inbound envelopes handed to the dispatcher.
    pub envelopes_dispatched: u64,

    /// Inbound requests answered with a reply envelope.
    pub requests_handled: u64,

    /// Replies that settled a pending operation.
    pub replies_settled: u64,

    /// Unknown, malformed or unhandled messages.
    pub protocol_errors: u64,

    /// Replies or requests referencing a missing operation or context.
    pub correlation_errors: u64,

    /// Outward calls that gave up waiting for their reply.
    pub timeouts: u64,

    /// Time since the bridge was created.
    pub uptime: Duration,
}

/// Lock-free counters shared by the dispatcher and the bridge
#[derive(Debug)]
pub struct BridgeMetrics {
    started_at: Instant,
    envelopes_dispatched: AtomicU64,
    requests_handled: AtomicU64,
    replies_settled: AtomicU64,
    protocol_errors: AtomicU64,
    correlation_errors: AtomicU64,
    timeouts: AtomicU64,
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            envelopes_dispatched: AtomicU64::new(0),
            requests_handled: AtomicU64::new(0),
            replies_settled: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            correlation_errors: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        }
    }

    pub fn record_dispatched(&self) {
        self.envelopes_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_handled(&self) {
        self.requests_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reply_settled(&self) {
        self.replies_settled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a dispatch failure under its taxonomy bucket
    pub fn record_error(&self, error: &BridgeError) {
        if error.is_protocol() {
            self.protocol_errors.fetch_add(1, Ordering::Relaxed);
        } else if error.is_correlation() {
            self.correlation_errors.fetch_add(1, Ordering::Relaxed);
        } else if matches!(error, BridgeError::Timeout { .. }) {
            self.record_timeout();
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            envelopes_dispatched: self.envelopes_dispatched.load(Ordering::Relaxed),
            requests_handled: self.requests_handled.load(Ordering::Relaxed),
            replies_settled: self.replies_settled.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            correlation_errors: self.correlation_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

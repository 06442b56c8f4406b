//! Shared correlation state
//!
//! The operation table, both context registries and the worker registry are
//! the only mutable state the bridge shares between its outward-call side and
//! its dispatch side. One [`BridgeState`] is created per bridge and shared by
//! `Arc`.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::info;

use crate::context::{ActivityContexts, WorkflowContexts};
use crate::metrics::BridgeMetrics;
use crate::operation::OperationTable;
use crate::workers::WorkerRegistry;

#[derive(Debug)]
pub struct BridgeState {
    pub operations: Arc<OperationTable>,
    pub workflows: WorkflowContexts,
    pub activities: ActivityContexts,
    pub workers: WorkerRegistry,
    pub metrics: BridgeMetrics,
    library_endpoint: RwLock<Option<String>>,
    shutdown: watch::Sender<bool>,
}

impl Default for BridgeState {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeState {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            operations: Arc::new(OperationTable::new()),
            workflows: WorkflowContexts::new(),
            activities: ActivityContexts::new(),
            workers: WorkerRegistry::new(),
            metrics: BridgeMetrics::new(),
            library_endpoint: RwLock::new(None),
            shutdown,
        }
    }

    /// Record where the client library listens, as announced by `Initialize`
    pub fn set_library_endpoint(&self, endpoint: impl Into<String>) {
        *self.library_endpoint.write() = Some(endpoint.into());
    }

    pub fn library_endpoint(&self) -> Option<String> {
        self.library_endpoint.read().clone()
    }

    /// Ask the serve loop to stop. Idempotent.
    pub fn request_shutdown(&self) {
        let changed = self.shutdown.send_if_modified(|stopping| {
            let was = *stopping;
            *stopping = true;
            !was
        });
        if changed {
            info!("bridge shutdown requested");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

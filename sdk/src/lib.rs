//! Bridge SDK for Rust
//!
//! This SDK correlates calls between a workflow engine worker and a client
//! library running workflow and activity code in another process. Outward
//! calls register a pending operation and wait for the reply carrying the
//! same request id; inbound requests from the client library are served
//! against a [`WorkflowEngine`] implementation.

#![allow(clippy::result_large_err)]

pub mod bridge;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod operation;
pub mod state;
pub mod transport;
pub mod workers;

/// Testing utilities for bridges and engines.
/// Available only with the `testing` feature enabled.
#[cfg(feature = "testing")]
pub mod testing;

pub use bridge_core;

// Re-export commonly used types
pub use bridge::{Bridge, WorkflowOutcome};
pub use config::{BridgeConfig, ConfigError};
pub use context::{ActivityContext, ActivityContexts, Registry, WorkflowContext, WorkflowContexts};
pub use dispatcher::Dispatcher;
pub use engine::{
    ConnectOptions, DomainRegistration, EngineResult, EngineWorker, WorkflowEngine,
};
pub use error::{BridgeError, Entity, Result};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use operation::{Completion, Operation, OperationResult, OperationTable, PendingOperation};
pub use state::BridgeState;
pub use transport::{ChannelTransport, Transport};
pub use workers::{RegisteredWorker, WorkerRegistry};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bridge::{Bridge, WorkflowOutcome};
    pub use crate::config::BridgeConfig;
    pub use crate::engine::{
        ConnectOptions, DomainRegistration, EngineResult, EngineWorker, WorkflowEngine,
    };
    pub use crate::error::{BridgeError, Entity, Result};
    pub use crate::transport::{ChannelTransport, Transport};
    pub use async_trait::async_trait;
    pub use bridge_core::{
        ActivityInfo, ActivityOptions, ApplicationError, ApplicationErrorKind,
        ChildWorkflowOptions, ContinueAsNew, Envelope, ExecutionParams, Message, MessageType,
        ProxyMessage, ProxyReply, ProxyRequest, StartWorkflowOptions, WorkerOptions,
        WorkflowExecution, WorkflowInfo,
    };
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{json, Value};
}

//! # Bridge Core
//!
//! Transport-level building blocks for the workflow proxy bridge.
//!
//! The bridge sits between a client process running workflow and activity code
//! and a worker runtime talking to the orchestration engine. Everything that
//! crosses that boundary is a message inside an [`Envelope`]. This crate
//! defines the envelope, its binary encoding and the full message catalogue; it
//! has no runtime and no shared state.
//!
//! ## What's in Core vs SDK
//!
//! **Core** contains the wire-level pieces:
//! - Envelope and binary codec with typed property accessors
//! - Message type registry and every request/reply variant
//! - Application error payload
//! - Execution metadata, option structures and continue-as-new resolution
//!
//! **SDK** contains the runtime:
//! - Operation table and context registries
//! - Dispatcher, reply and request handlers
//! - Engine and transport traits
//! - Configuration, metrics and testing utilities
//!
//! ## Modules
//!
//! - [`envelope`] - Envelope type and binary codec
//! - [`message`] - Message types, variants and the [`Message`] union
//! - [`execution`] - Execution identifiers, options and continue-as-new
//! - [`application`] - Application error payload
//! - [`error`] - Core error types

pub mod application;
pub mod envelope;
pub mod error;
pub mod execution;
pub mod message;

pub use application::{ApplicationError, ApplicationErrorKind};
pub use envelope::Envelope;
pub use error::{CoreError, CoreResult};
pub use execution::{
    ActivityInfo, ActivityOptions, ChildWorkflowOptions, ContinueAsNew, ContinueAsNewOverrides,
    ExecutionParams, StartWorkflowOptions, WorkerOptions, WorkflowExecution, WorkflowInfo,
};
pub use message::{
    Message, MessageDomain, MessageType, ProxyMessage, ProxyReply, ProxyRequest,
};

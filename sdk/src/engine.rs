//! Orchestration engine capability surface
//!
//! The bridge never talks to the engine's wire protocol itself. Whatever
//! worker/client library drives the engine implements [`WorkflowEngine`]; the
//! request handlers call it and turn its results into reply envelopes.
//! Failures are [`ApplicationError`]s and travel back to the client verbatim.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::{
    ActivityOptions, ApplicationError, ChildWorkflowOptions, StartWorkflowOptions, WorkerOptions,
    WorkflowExecution,
};

use crate::context::{ActivityContext, WorkflowContext};

/// Result type for engine capabilities
pub type EngineResult<T> = std::result::Result<T, ApplicationError>;

/// Connection settings forwarded from a connect request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectOptions {
    pub endpoints: Vec<String>,
    pub identity: Option<String>,
    pub client_timeout: Option<std::time::Duration>,
    pub domain: Option<String>,
    pub create_domain: bool,
}

/// Domain registration forwarded from a domain-register request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainRegistration {
    pub name: String,
    pub description: Option<String>,
    pub owner_email: Option<String>,
    pub emit_metrics: bool,
    pub retention_days: i32,
}

/// A running engine worker polling one task list
#[async_trait]
pub trait EngineWorker: Send + Sync {
    async fn stop(&self) -> EngineResult<()>;
}

/// Capabilities the bridge needs from the orchestration engine
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    async fn connect(&self, options: ConnectOptions) -> EngineResult<()>;

    async fn register_domain(&self, registration: DomainRegistration) -> EngineResult<()>;

    async fn register_workflow(&self, name: &str) -> EngineResult<()>;

    async fn register_activity(&self, name: &str) -> EngineResult<()>;

    /// Start polling `task_list`. The returned handle stops the worker.
    async fn register_worker(
        &self,
        domain: &str,
        task_list: &str,
        options: WorkerOptions,
    ) -> EngineResult<Arc<dyn EngineWorker>>;

    /// Start a top-level workflow. An empty `domain` means the connection's
    /// default domain; the same holds for signals and queries.
    async fn execute_workflow(
        &self,
        domain: &str,
        workflow: &str,
        args: Option<Vec<u8>>,
        options: StartWorkflowOptions,
    ) -> EngineResult<WorkflowExecution>;

    /// Run a child workflow from inside `parent` and wait for its result
    async fn execute_child_workflow(
        &self,
        parent: &WorkflowContext,
        workflow: &str,
        args: Option<Vec<u8>>,
        options: ChildWorkflowOptions,
    ) -> EngineResult<Option<Vec<u8>>>;

    /// Run an activity from inside `workflow` and wait for its result
    async fn execute_activity(
        &self,
        workflow: &WorkflowContext,
        activity: &str,
        args: Option<Vec<u8>>,
        options: ActivityOptions,
    ) -> EngineResult<Option<Vec<u8>>>;

    async fn signal_workflow(
        &self,
        domain: &str,
        execution: &WorkflowExecution,
        signal_name: &str,
        args: Option<Vec<u8>>,
    ) -> EngineResult<()>;

    async fn query_workflow(
        &self,
        domain: &str,
        execution: &WorkflowExecution,
        query_name: &str,
        args: Option<Vec<u8>>,
    ) -> EngineResult<Option<Vec<u8>>>;

    async fn record_heartbeat(
        &self,
        activity: &ActivityContext,
        details: Option<Vec<u8>>,
    ) -> EngineResult<()>;

    /// Details recorded by the previous attempt of this activity, if any
    async fn heartbeat_details(&self, activity: &ActivityContext) -> EngineResult<Option<Vec<u8>>>;

    /// Complete an activity identified only by its task token
    async fn complete_activity(
        &self,
        task_token: &[u8],
        result: Option<Vec<u8>>,
        error: Option<ApplicationError>,
    ) -> EngineResult<()>;
}

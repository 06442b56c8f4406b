//! Scriptable in-memory engine for exercising request handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_core::{
    ActivityOptions, ApplicationError, ChildWorkflowOptions, StartWorkflowOptions, WorkerOptions,
    WorkflowExecution,
};
use parking_lot::RwLock;

use crate::context::{ActivityContext, WorkflowContext};
use crate::engine::{
    ConnectOptions, DomainRegistration, EngineResult, EngineWorker, WorkflowEngine,
};

/// Engine capability, used to script failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Connect,
    RegisterDomain,
    RegisterWorkflow,
    RegisterActivity,
    RegisterWorker,
    StopWorker,
    ExecuteWorkflow,
    ExecuteChildWorkflow,
    ExecuteActivity,
    SignalWorkflow,
    QueryWorkflow,
    RecordHeartbeat,
    HeartbeatDetails,
    CompleteActivity,
}

/// A recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Connect(ConnectOptions),
    RegisterDomain(DomainRegistration),
    RegisterWorkflow(String),
    RegisterActivity(String),
    RegisterWorker {
        domain: String,
        task_list: String,
    },
    StopWorker {
        task_list: String,
    },
    ExecuteWorkflow {
        domain: String,
        workflow: String,
        args: Option<Vec<u8>>,
    },
    ExecuteChildWorkflow {
        parent_context_id: i64,
        workflow: String,
        args: Option<Vec<u8>>,
    },
    ExecuteActivity {
        workflow_context_id: i64,
        activity: String,
        args: Option<Vec<u8>>,
    },
    SignalWorkflow {
        execution: WorkflowExecution,
        signal_name: String,
        args: Option<Vec<u8>>,
    },
    QueryWorkflow {
        execution: WorkflowExecution,
        query_name: String,
        args: Option<Vec<u8>>,
    },
    RecordHeartbeat {
        activity_context_id: i64,
        details: Option<Vec<u8>>,
    },
    HeartbeatDetails {
        activity_context_id: i64,
    },
    CompleteActivity {
        task_token: Vec<u8>,
        result: Option<Vec<u8>>,
        error: Option<ApplicationError>,
    },
}

impl EngineCall {
    pub fn capability(&self) -> Capability {
        match self {
            Self::Connect(_) => Capability::Connect,
            Self::RegisterDomain(_) => Capability::RegisterDomain,
            Self::RegisterWorkflow(_) => Capability::RegisterWorkflow,
            Self::RegisterActivity(_) => Capability::RegisterActivity,
            Self::RegisterWorker { .. } => Capability::RegisterWorker,
            Self::StopWorker { .. } => Capability::StopWorker,
            Self::ExecuteWorkflow { .. } => Capability::ExecuteWorkflow,
            Self::ExecuteChildWorkflow { .. } => Capability::ExecuteChildWorkflow,
            Self::ExecuteActivity { .. } => Capability::ExecuteActivity,
            Self::SignalWorkflow { .. } => Capability::SignalWorkflow,
            Self::QueryWorkflow { .. } => Capability::QueryWorkflow,
            Self::RecordHeartbeat { .. } => Capability::RecordHeartbeat,
            Self::HeartbeatDetails { .. } => Capability::HeartbeatDetails,
            Self::CompleteActivity { .. } => Capability::CompleteActivity,
        }
    }
}

/// In-memory [`WorkflowEngine`] that records every call.
///
/// # Example
///
/// ```ignore
/// use bridge_sdk::testing::{Capability, MockEngine};
///
/// let engine = MockEngine::builder()
///     .query_result(b"42".to_vec())
///     .fail(Capability::Connect, ApplicationError::generic("unreachable"))
///     .build();
///
/// // drive a bridge with the engine, then inspect what it was asked to do
/// assert_eq!(engine.call_count(Capability::QueryWorkflow), 1);
/// ```
#[derive(Clone)]
pub struct MockEngine {
    inner: Arc<MockEngineInner>,
}

struct MockEngineInner {
    execution: WorkflowExecution,
    child_result: Option<Vec<u8>>,
    activity_result: Option<Vec<u8>>,
    query_result: Option<Vec<u8>>,
    delay: Option<Duration>,
    failures: HashMap<Capability, ApplicationError>,
    heartbeats: RwLock<HashMap<i64, Option<Vec<u8>>>>,
    calls: RwLock<Vec<EngineCall>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a new builder
    pub fn builder() -> MockEngineBuilder {
        MockEngineBuilder::default()
    }

    /// Engine that succeeds at everything with empty results
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// All recorded calls, oldest first
    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.calls.read().clone()
    }

    pub fn calls_to(&self, capability: Capability) -> Vec<EngineCall> {
        self.inner
            .calls
            .read()
            .iter()
            .filter(|call| call.capability() == capability)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, capability: Capability) -> usize {
        self.calls_to(capability).len()
    }

    pub fn was_called(&self, capability: Capability) -> bool {
        self.call_count(capability) > 0
    }

    pub fn clear_calls(&self) {
        self.inner.calls.write().clear();
    }

    fn record(&self, call: EngineCall) -> EngineResult<()> {
        let capability = call.capability();
        self.inner.calls.write().push(call);
        match self.inner.failures.get(&capability) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.inner.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl WorkflowEngine for MockEngine {
    async fn connect(&self, options: ConnectOptions) -> EngineResult<()> {
        self.record(EngineCall::Connect(options))
    }

    async fn register_domain(&self, registration: DomainRegistration) -> EngineResult<()> {
        self.record(EngineCall::RegisterDomain(registration))
    }

    async fn register_workflow(&self, name: &str) -> EngineResult<()> {
        self.record(EngineCall::RegisterWorkflow(name.to_string()))
    }

    async fn register_activity(&self, name: &str) -> EngineResult<()> {
        self.record(EngineCall::RegisterActivity(name.to_string()))
    }

    async fn register_worker(
        &self,
        domain: &str,
        task_list: &str,
        _options: WorkerOptions,
    ) -> EngineResult<Arc<dyn EngineWorker>> {
        self.record(EngineCall::RegisterWorker {
            domain: domain.to_string(),
            task_list: task_list.to_string(),
        })?;
        Ok(Arc::new(MockWorker {
            engine: self.clone(),
            task_list: task_list.to_string(),
        }))
    }

    async fn execute_workflow(
        &self,
        domain: &str,
        workflow: &str,
        args: Option<Vec<u8>>,
        _options: StartWorkflowOptions,
    ) -> EngineResult<WorkflowExecution> {
        self.record(EngineCall::ExecuteWorkflow {
            domain: domain.to_string(),
            workflow: workflow.to_string(),
            args,
        })?;
        Ok(self.inner.execution.clone())
    }

    async fn execute_child_workflow(
        &self,
        parent: &WorkflowContext,
        workflow: &str,
        args: Option<Vec<u8>>,
        _options: ChildWorkflowOptions,
    ) -> EngineResult<Option<Vec<u8>>> {
        self.pause().await;
        self.record(EngineCall::ExecuteChildWorkflow {
            parent_context_id: parent.context_id,
            workflow: workflow.to_string(),
            args,
        })?;
        Ok(self.inner.child_result.clone())
    }

    async fn execute_activity(
        &self,
        workflow: &WorkflowContext,
        activity: &str,
        args: Option<Vec<u8>>,
        _options: ActivityOptions,
    ) -> EngineResult<Option<Vec<u8>>> {
        self.pause().await;
        self.record(EngineCall::ExecuteActivity {
            workflow_context_id: workflow.context_id,
            activity: activity.to_string(),
            args,
        })?;
        Ok(self.inner.activity_result.clone())
    }

    async fn signal_workflow(
        &self,
        _domain: &str,
        execution: &WorkflowExecution,
        signal_name: &str,
        args: Option<Vec<u8>>,
    ) -> EngineResult<()> {
        self.record(EngineCall::SignalWorkflow {
            execution: execution.clone(),
            signal_name: signal_name.to_string(),
            args,
        })
    }

    async fn query_workflow(
        &self,
        _domain: &str,
        execution: &WorkflowExecution,
        query_name: &str,
        args: Option<Vec<u8>>,
    ) -> EngineResult<Option<Vec<u8>>> {
        self.record(EngineCall::QueryWorkflow {
            execution: execution.clone(),
            query_name: query_name.to_string(),
            args,
        })?;
        Ok(self.inner.query_result.clone())
    }

    async fn record_heartbeat(
        &self,
        activity: &ActivityContext,
        details: Option<Vec<u8>>,
    ) -> EngineResult<()> {
        self.record(EngineCall::RecordHeartbeat {
            activity_context_id: activity.context_id,
            details: details.clone(),
        })?;
        self.inner
            .heartbeats
            .write()
            .insert(activity.context_id, details);
        Ok(())
    }

    async fn heartbeat_details(&self, activity: &ActivityContext) -> EngineResult<Option<Vec<u8>>> {
        self.record(EngineCall::HeartbeatDetails {
            activity_context_id: activity.context_id,
        })?;
        Ok(self
            .inner
            .heartbeats
            .read()
            .get(&activity.context_id)
            .cloned()
            .flatten())
    }

    async fn complete_activity(
        &self,
        task_token: &[u8],
        result: Option<Vec<u8>>,
        error: Option<ApplicationError>,
    ) -> EngineResult<()> {
        self.record(EngineCall::CompleteActivity {
            task_token: task_token.to_vec(),
            result,
            error,
        })
    }
}

/// Worker handle returned by [`MockEngine::register_worker`]
pub struct MockWorker {
    engine: MockEngine,
    task_list: String,
}

#[async_trait]
impl EngineWorker for MockWorker {
    async fn stop(&self) -> EngineResult<()> {
        self.engine.record(EngineCall::StopWorker {
            task_list: self.task_list.clone(),
        })
    }
}

/// Builder for [`MockEngine`]
#[derive(Default)]
pub struct MockEngineBuilder {
    execution: Option<WorkflowExecution>,
    child_result: Option<Vec<u8>>,
    activity_result: Option<Vec<u8>>,
    query_result: Option<Vec<u8>>,
    delay: Option<Duration>,
    failures: HashMap<Capability, ApplicationError>,
}

impl MockEngineBuilder {
    /// Execution returned by `execute_workflow`
    pub fn execution(mut self, execution: WorkflowExecution) -> Self {
        self.execution = Some(execution);
        self
    }

    pub fn child_result(mut self, result: Vec<u8>) -> Self {
        self.child_result = Some(result);
        self
    }

    pub fn activity_result(mut self, result: Vec<u8>) -> Self {
        self.activity_result = Some(result);
        self
    }

    pub fn query_result(mut self, result: Vec<u8>) -> Self {
        self.query_result = Some(result);
        self
    }

    /// Delay child workflow and activity executions
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every call to `capability` fail with `error`
    pub fn fail(mut self, capability: Capability, error: ApplicationError) -> Self {
        self.failures.insert(capability, error);
        self
    }

    pub fn build(self) -> MockEngine {
        MockEngine {
            inner: Arc::new(MockEngineInner {
                execution: self
                    .execution
                    .unwrap_or_else(|| WorkflowExecution::new("mock-workflow", "mock-run")),
                child_result: self.child_result,
                activity_result: self.activity_result,
                query_result: self.query_result,
                delay: self.delay,
                failures: self.failures,
                heartbeats: RwLock::new(HashMap::new()),
                calls: RwLock::new(Vec::new()),
            }),
        }
    }
}

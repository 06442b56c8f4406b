//! The bridge façade
//!
//! [`Bridge`] owns the shared state, the dispatcher and the outbound
//! transport. The engine side calls the `invoke_*` methods to push work into
//! the client library and await its replies; the inbound side feeds frames
//! through [`Bridge::serve`] or [`Bridge::on_envelope`].

use std::sync::Arc;
use std::time::Duration;

use bridge_core::message::{
    ActivityInvokeLocalRequest, ActivityInvokeRequest, ActivityStoppingRequest,
    WorkflowDisconnectContextRequest, WorkflowInvokeRequest, WorkflowQueryInvokeRequest,
    WorkflowSignalInvokeRequest,
};
use bridge_core::{
    ActivityInfo, ContinueAsNew, ExecutionParams, ProxyMessage, ProxyRequest, WorkflowInfo,
};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::context::{ActivityContext, WorkflowContext};
use crate::dispatcher::Dispatcher;
use crate::engine::WorkflowEngine;
use crate::error::{BridgeError, Result};
use crate::metrics::MetricsSnapshot;
use crate::operation::OperationResult;
use crate::state::BridgeState;
use crate::transport::Transport;

/// How a workflow invocation ended
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// The run finished with this result
    Completed(Option<Vec<u8>>),
    /// The run ended by asking for a fresh run
    ContinueAsNew(ContinueAsNew),
}

/// Correlates outward calls with inbound replies and serves inbound requests
pub struct Bridge {
    state: Arc<BridgeState>,
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    config: BridgeConfig,
}

impl Bridge {
    pub fn new(
        config: BridgeConfig,
        engine: Arc<dyn WorkflowEngine>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|err| BridgeError::InvalidConfiguration(err.to_string()))?;

        let state = Arc::new(BridgeState::new());
        let dispatcher = Dispatcher::new(Arc::clone(&state), engine, Arc::clone(&transport));
        Ok(Self {
            state,
            dispatcher,
            transport,
            config,
        })
    }

    pub fn state(&self) -> &Arc<BridgeState> {
        &self.state
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.state.metrics.snapshot()
    }

    /// Dispatch one inbound frame
    pub async fn on_envelope(&self, frame: &[u8]) -> Result<()> {
        self.dispatcher.dispatch_frame(frame).await
    }

    /// Signal the serve loop to stop. Pending calls fail once it exits.
    pub fn shutdown(&self) {
        self.state.request_shutdown();
    }

    /// Dispatch inbound frames until the channel closes or shutdown is signalled.
    ///
    /// Each frame runs in its own task, at most `max_concurrent_dispatch` at a
    /// time. On exit the bridge is marked as shutting down, the loop waits for
    /// in-flight dispatches and then fails every call still waiting for a
    /// reply. Calls made afterwards fail with `ShuttingDown`.
    pub async fn serve(&self, mut inbound: mpsc::Receiver<Vec<u8>>) {
        let limit = self.config.max_concurrent_dispatch;
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut shutdown = self.state.subscribe_shutdown();
        info!(max_concurrent_dispatch = limit, "bridge serving");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let frame = tokio::select! {
                frame = inbound.recv() => frame,
                _ = shutdown.changed() => continue,
            };
            let Some(frame) = frame else {
                debug!("inbound channel closed");
                self.state.request_shutdown();
                break;
            };

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(err) = dispatcher.dispatch_frame(&frame).await {
                    error!(error = %err, "inbound envelope failed");
                }
            });
        }

        // wait for in-flight dispatches to finish
        let drained = u32::try_from(limit)
            .ok()
            .map(|permits| semaphore.acquire_many(permits));
        if let Some(drained) = drained {
            let _ = drained.await;
        }

        let cancelled = self.state.operations.cancel_all(BridgeError::ShuttingDown);
        info!(cancelled, "bridge stopped");
    }

    /// Send `request` under a fresh request id and wait for its reply
    pub async fn call<R: ProxyRequest + Send>(
        &self,
        mut request: R,
        timeout: Option<Duration>,
    ) -> Result<OperationResult> {
        if self.state.is_shutting_down() {
            return Err(BridgeError::ShuttingDown);
        }

        let operations = &self.state.operations;
        let request_id = operations.next_request_id();
        request.set_request_id(request_id);
        let pending = operations.register(
            request_id,
            request.context_id(),
            <R::Reply as ProxyMessage>::TYPE,
        )?;

        let envelope = request.to_envelope()?;
        debug!(request_id, message_type = %R::TYPE, "sending request");
        self.transport.send(envelope).await?;

        let outcome = pending.wait(timeout).await;
        if matches!(outcome, Err(BridgeError::Timeout { .. })) {
            self.state.metrics.record_timeout();
        }
        outcome
    }

    /// Register the context for a workflow run the engine just handed over
    pub fn new_workflow_context(
        &self,
        info: WorkflowInfo,
        params: ExecutionParams,
    ) -> Arc<WorkflowContext> {
        let context = self.state.workflows.add(|context_id| WorkflowContext {
            context_id,
            info,
            params,
        });
        debug!(
            context_id = context.context_id,
            workflow_type = %context.workflow_type(),
            "workflow context created"
        );
        context
    }

    /// Run the workflow in the client library and wait for the run to end.
    ///
    /// The workflow context is gone once this returns, whatever the outcome.
    pub async fn invoke_workflow(
        &self,
        context_id: i64,
        args: Option<Vec<u8>>,
    ) -> Result<WorkflowOutcome> {
        let context = self.state.workflows.require(context_id)?;
        let request = WorkflowInvokeRequest {
            request_id: 0,
            context_id,
            info: context.info.clone(),
            args,
            execution_start_to_close_timeout: context.params.execution_start_to_close_timeout,
        };

        let outcome = self.call(request, self.config.workflow_reply_timeout).await;
        self.state.workflows.remove(context_id);

        match outcome? {
            OperationResult::ContinueAsNew(directive) => Ok(WorkflowOutcome::ContinueAsNew(directive)),
            OperationResult::Payload(result) => Ok(WorkflowOutcome::Completed(result)),
            other => Err(unexpected_result("workflow invoke", &other)),
        }
    }

    /// Deliver a signal to a running workflow
    pub async fn invoke_signal(
        &self,
        context_id: i64,
        signal_name: impl Into<String>,
        args: Option<Vec<u8>>,
    ) -> Result<()> {
        self.state.workflows.require(context_id)?;
        let request = WorkflowSignalInvokeRequest {
            request_id: 0,
            context_id,
            signal_name: signal_name.into(),
            signal_args: args,
        };
        self.call(request, Some(self.config.reply_timeout))
            .await
            .map(|_| ())
    }

    /// Ask a running workflow to answer a query
    pub async fn invoke_query(
        &self,
        context_id: i64,
        query_name: impl Into<String>,
        args: Option<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>> {
        self.state.workflows.require(context_id)?;
        let request = WorkflowQueryInvokeRequest {
            request_id: 0,
            context_id,
            query_name: query_name.into(),
            query_args: args,
        };
        match self.call(request, Some(self.config.reply_timeout)).await? {
            OperationResult::Payload(result) => Ok(result),
            other => Err(unexpected_result("workflow query", &other)),
        }
    }

    /// Tell the client library to drop a workflow run it holds.
    /// Succeeds even when the run already ended.
    pub async fn disconnect_workflow(&self, context_id: i64) -> Result<()> {
        let request = WorkflowDisconnectContextRequest {
            request_id: 0,
            context_id,
        };
        self.call(request, Some(self.config.reply_timeout))
            .await
            .map(|_| ())
    }

    /// Register the context for an activity task the engine just handed over
    pub fn new_activity_context(
        &self,
        activity_type: impl Into<String>,
        info: Option<ActivityInfo>,
        task_token: Option<Vec<u8>>,
    ) -> Arc<ActivityContext> {
        let activity_type = activity_type.into();
        self.state.activities.add(|context_id| {
            let mut context = ActivityContext::new(context_id, activity_type);
            context.info = info;
            context.task_token = task_token;
            context
        })
    }

    /// Register the context for a local activity
    pub fn new_local_activity_context(
        &self,
        activity_type: impl Into<String>,
    ) -> Arc<ActivityContext> {
        let activity_type = activity_type.into();
        self.state
            .activities
            .add(|context_id| ActivityContext::new(context_id, activity_type).local())
    }

    /// Run an activity in the client library and wait for its result
    pub async fn invoke_activity(
        &self,
        context_id: i64,
        args: Option<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>> {
        let context = self.state.activities.require(context_id)?;
        let request = ActivityInvokeRequest {
            request_id: 0,
            context_id,
            activity: context.activity_type.clone(),
            args,
            info: context.info.clone(),
        };
        let outcome = self.call(request, self.config.activity_reply_timeout).await;
        self.finish_activity(context_id, outcome)
    }

    /// Run a local activity in the client library and wait for its result
    pub async fn invoke_local_activity(
        &self,
        context_id: i64,
        args: Option<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>> {
        let context = self.state.activities.require(context_id)?;
        let request = ActivityInvokeLocalRequest {
            request_id: 0,
            context_id,
            activity: context.activity_type.clone(),
            args,
        };
        let outcome = self.call(request, self.config.activity_reply_timeout).await;
        self.finish_activity(context_id, outcome)
    }

    fn finish_activity(
        &self,
        context_id: i64,
        outcome: Result<OperationResult>,
    ) -> Result<Option<Vec<u8>>> {
        self.state.activities.remove(context_id);
        match outcome? {
            OperationResult::Payload(result) => Ok(result),
            other => Err(unexpected_result("activity invoke", &other)),
        }
    }

    /// Ask a running activity to stop. The activity's own invocation still
    /// completes through its reply.
    pub async fn stop_activity(&self, context_id: i64) -> Result<()> {
        let context = self.state.activities.require(context_id)?;
        context.cancel();
        let request = ActivityStoppingRequest {
            request_id: 0,
            context_id,
            activity_id: context.info.as_ref().map(|info| info.activity_id.clone()),
        };
        if let Err(err) = self.call(request, Some(self.config.reply_timeout)).await {
            warn!(context_id, error = %err, "activity stop not acknowledged");
            return Err(err);
        }
        Ok(())
    }
}

fn unexpected_result(call: &str, result: &OperationResult) -> BridgeError {
    BridgeError::Protocol(format!("{call} settled with unexpected result {result:?}"))
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

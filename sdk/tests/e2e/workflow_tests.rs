//! Workflow invocation, signal, query and disconnect round trips

use std::sync::Arc;
use std::time::Duration;

use bridge_sdk::bridge_core::message::{
    WorkflowDisconnectContextReply, WorkflowDisconnectContextRequest, WorkflowInvokeReply,
    WorkflowInvokeRequest, WorkflowQueryInvokeReply, WorkflowQueryInvokeRequest,
    WorkflowSignalInvokeReply, WorkflowSignalInvokeRequest,
};
use bridge_sdk::bridge_core::ContinueAsNewOverrides;
use bridge_sdk::prelude::*;
use bridge_sdk::testing::MockEngine;

use super::{start, workflow_info, TEST_TIMEOUT};

fn params() -> ExecutionParams {
    ExecutionParams::new("default", "A")
        .with_start_to_close_timeout(Duration::from_secs(30))
        .with_execution_start_to_close_timeout(Duration::from_secs(600))
}

#[tokio::test]
async fn test_workflow_invoke_completes_and_removes_context() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context = bridge.new_workflow_context(workflow_info("Billing"), params());
    let context_id = context.context_id;

    let caller = Arc::clone(&bridge);
    let invocation =
        tokio::spawn(async move { caller.invoke_workflow(context_id, Some(b"in".to_vec())).await });

    let request: WorkflowInvokeRequest = counterpart.recv_as().await.unwrap();
    assert_eq!(request.context_id, context_id);
    assert_eq!(request.info.workflow_type, "Billing");
    assert_eq!(request.args, Some(b"in".to_vec()));
    assert_eq!(
        request.execution_start_to_close_timeout,
        Some(Duration::from_secs(600))
    );
    assert!(bridge.state().operations.contains(request.request_id));

    counterpart
        .send(WorkflowInvokeReply {
            request_id: request.request_id,
            context_id,
            result: Some(b"out".to_vec()),
            ..Default::default()
        })
        .await
        .unwrap();

    let outcome = tokio::time::timeout(TEST_TIMEOUT, invocation)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, WorkflowOutcome::Completed(Some(b"out".to_vec())));
    assert!(!bridge.state().workflows.contains(context_id));
    assert!(bridge.state().operations.is_empty());
}

#[tokio::test]
async fn test_continue_as_new_uses_overrides_and_falls_back() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context = bridge.new_workflow_context(workflow_info("Billing"), params());
    let context_id = context.context_id;

    let caller = Arc::clone(&bridge);
    let invocation = tokio::spawn(async move { caller.invoke_workflow(context_id, None).await });

    let request: WorkflowInvokeRequest = counterpart.recv_as().await.unwrap();
    counterpart
        .send(WorkflowInvokeReply {
            request_id: request.request_id,
            context_id,
            continue_as_new: true,
            continue_as_new_args: Some(b"next".to_vec()),
            overrides: ContinueAsNewOverrides {
                task_list: Some("B".to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
        .await
        .unwrap();

    match invocation.await.unwrap().unwrap() {
        WorkflowOutcome::ContinueAsNew(directive) => {
            assert_eq!(directive.workflow_type, "Billing");
            assert_eq!(directive.args, Some(b"next".to_vec()));
            assert_eq!(directive.params.domain, "default");
            assert_eq!(directive.params.task_list, "B");
            assert_eq!(
                directive.params.start_to_close_timeout,
                Some(Duration::from_secs(30))
            );
        }
        other => panic!("expected continue-as-new, got {other:?}"),
    }
    assert!(!bridge.state().workflows.contains(context_id));
    assert!(!bridge.state().operations.contains(request.request_id));
}

#[tokio::test]
async fn test_workflow_failure_reaches_caller_verbatim() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), params())
        .context_id;

    let caller = Arc::clone(&bridge);
    let invocation = tokio::spawn(async move { caller.invoke_workflow(context_id, None).await });

    let request: WorkflowInvokeRequest = counterpart.recv_as().await.unwrap();
    let failure = ApplicationError::custom("insufficient funds").with_details("account 7");
    counterpart
        .send(WorkflowInvokeReply {
            request_id: request.request_id,
            context_id,
            error: Some(failure.clone()),
            ..Default::default()
        })
        .await
        .unwrap();

    match invocation.await.unwrap() {
        Err(BridgeError::Application(err)) => assert_eq!(err, failure),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(bridge.state().workflows.is_empty());
}

#[tokio::test]
async fn test_signal_and_query_keep_context_alive() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), params())
        .context_id;

    let caller = Arc::clone(&bridge);
    let signal = tokio::spawn(async move {
        caller
            .invoke_signal(context_id, "approve", Some(b"yes".to_vec()))
            .await
    });
    let request: WorkflowSignalInvokeRequest = counterpart.recv_as().await.unwrap();
    assert_eq!(request.signal_name, "approve");
    assert_eq!(request.signal_args, Some(b"yes".to_vec()));
    counterpart
        .send(WorkflowSignalInvokeReply {
            request_id: request.request_id,
            context_id,
            error: None,
        })
        .await
        .unwrap();
    signal.await.unwrap().unwrap();

    let caller = Arc::clone(&bridge);
    let query = tokio::spawn(async move { caller.invoke_query(context_id, "status", None).await });
    let request: WorkflowQueryInvokeRequest = counterpart.recv_as().await.unwrap();
    assert_eq!(request.query_name, "status");
    counterpart
        .send(WorkflowQueryInvokeReply {
            request_id: request.request_id,
            context_id,
            error: None,
            result: Some(b"pending".to_vec()),
        })
        .await
        .unwrap();
    assert_eq!(query.await.unwrap().unwrap(), Some(b"pending".to_vec()));

    assert!(bridge.state().workflows.contains(context_id));
    assert!(bridge.state().operations.is_empty());
}

#[tokio::test]
async fn test_signal_error_is_returned() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), params())
        .context_id;

    let caller = Arc::clone(&bridge);
    let signal = tokio::spawn(async move { caller.invoke_signal(context_id, "nope", None).await });
    let request: WorkflowSignalInvokeRequest = counterpart.recv_as().await.unwrap();
    counterpart
        .send(WorkflowSignalInvokeReply {
            request_id: request.request_id,
            context_id,
            error: Some(ApplicationError::custom("unknown signal")),
        })
        .await
        .unwrap();

    assert!(matches!(
        signal.await.unwrap(),
        Err(BridgeError::Application(err)) if err.message == "unknown signal"
    ));
}

#[tokio::test]
async fn test_disconnect_removes_context_and_tolerates_absence() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), params())
        .context_id;

    for _ in 0..2 {
        let caller = Arc::clone(&bridge);
        let disconnect = tokio::spawn(async move { caller.disconnect_workflow(context_id).await });
        let request: WorkflowDisconnectContextRequest = counterpart.recv_as().await.unwrap();
        assert_eq!(request.context_id, context_id);
        counterpart
            .send(WorkflowDisconnectContextReply {
                request_id: request.request_id,
                context_id,
                error: None,
            })
            .await
            .unwrap();
        disconnect.await.unwrap().unwrap();
        assert!(!bridge.state().workflows.contains(context_id));
    }
}

#[tokio::test]
async fn test_invoke_unknown_context_fails_without_sending() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());

    let err = bridge.invoke_query(404, "status", None).await.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::EntityNotExist {
            entity: Entity::WorkflowContext,
            id: 404
        }
    ));
    assert!(counterpart.is_quiet(Duration::from_millis(50)).await);
}

#[tokio::test]
async fn test_concurrent_invocations_are_correlated() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());

    let mut invocations = Vec::new();
    for n in 0..16u8 {
        let context_id = bridge
            .new_workflow_context(workflow_info("Billing"), params())
            .context_id;
        let caller = Arc::clone(&bridge);
        invocations.push(tokio::spawn(async move {
            (n, caller.invoke_workflow(context_id, Some(vec![n])).await)
        }));
    }

    // answer every request with its own argument, in arrival order
    for _ in 0..16 {
        let request: WorkflowInvokeRequest = counterpart.recv_as().await.unwrap();
        counterpart
            .send(WorkflowInvokeReply {
                request_id: request.request_id,
                context_id: request.context_id,
                result: request.args,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    for invocation in invocations {
        let (n, outcome) = invocation.await.unwrap();
        assert_eq!(outcome.unwrap(), WorkflowOutcome::Completed(Some(vec![n])));
    }
    assert!(bridge.state().workflows.is_empty());
    assert!(bridge.state().operations.is_empty());
}

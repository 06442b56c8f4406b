//! Protocol and correlation failures, timeouts and late replies

use std::sync::Arc;
use std::time::Duration;

use bridge_sdk::bridge_core::message::{
    ActivityStoppingReply, PingReply, PingRequest, WorkflowExecuteChildReply, WorkflowExecuteChildRequest,
    WorkflowInvokeReply, WorkflowInvokeRequest, WorkflowQueryInvokeReply,
    WorkflowQueryInvokeRequest, WorkflowSignalInvokeReply, WorkflowSignalInvokeRequest,
};
use bridge_sdk::prelude::*;
use bridge_sdk::testing::MockEngine;

use super::{eventually, frame, start, start_with, workflow_info, TEST_TIMEOUT};

fn params() -> ExecutionParams {
    ExecutionParams::new("default", "A")
}

#[tokio::test]
async fn test_unknown_message_type_does_not_stop_dispatch() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());

    let err = bridge
        .on_envelope(&Envelope::with_raw_type(9999).encode())
        .await
        .unwrap_err();
    assert!(err.is_protocol());

    counterpart.send(PingRequest { request_id: 1 }).await.unwrap();
    let reply: PingReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 1);
    assert_eq!(bridge.metrics().protocol_errors, 1);
}

#[tokio::test]
async fn test_malformed_frame_is_counted_and_skipped() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());

    counterpart.send_frame(vec![0xff, 0x01]).await.unwrap();
    counterpart.send(PingRequest { request_id: 2 }).await.unwrap();

    let reply: PingReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 2);
    assert!(eventually(|| bridge.metrics().protocol_errors == 1).await);
}

#[tokio::test]
async fn test_reply_for_unregistered_request() {
    let (bridge, _counterpart, _serve) = start(MockEngine::new());
    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), params())
        .context_id;

    let err = bridge
        .on_envelope(&frame(WorkflowInvokeReply {
            request_id: 12345,
            context_id,
            result: Some(b"stray".to_vec()),
            ..Default::default()
        }))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BridgeError::EntityNotExist {
            entity: Entity::Operation,
            id: 12345
        }
    ));
    assert!(bridge.state().workflows.contains(context_id));
    assert!(bridge.state().operations.is_empty());
    assert_eq!(bridge.metrics().correlation_errors, 1);
}

#[tokio::test]
async fn test_late_reply_after_timeout_is_rejected() {
    let config = BridgeConfig::default().with_reply_timeout(Duration::from_millis(50));
    let (bridge, mut counterpart, _serve) = start_with(config, MockEngine::new());
    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), params())
        .context_id;

    let caller = Arc::clone(&bridge);
    let signal = tokio::spawn(async move { caller.invoke_signal(context_id, "slow", None).await });
    let request: WorkflowSignalInvokeRequest = counterpart.recv_as().await.unwrap();

    assert!(matches!(
        signal.await.unwrap(),
        Err(BridgeError::Timeout { request_id, .. }) if request_id == request.request_id
    ));
    assert!(!bridge.state().operations.contains(request.request_id));

    let err = bridge
        .on_envelope(&frame(WorkflowSignalInvokeReply {
            request_id: request.request_id,
            context_id,
            error: None,
        }))
        .await
        .unwrap_err();
    assert!(err.is_correlation());

    let metrics = bridge.metrics();
    assert_eq!(metrics.timeouts, 1);
    assert_eq!(metrics.correlation_errors, 1);
}

#[tokio::test]
async fn test_reply_after_context_vanished_fails_the_waiter() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), params())
        .context_id;

    let caller = Arc::clone(&bridge);
    let query = tokio::spawn(async move { caller.invoke_query(context_id, "status", None).await });
    let request: WorkflowQueryInvokeRequest = counterpart.recv_as().await.unwrap();

    bridge.state().workflows.remove(context_id);
    let err = bridge
        .on_envelope(&frame(WorkflowQueryInvokeReply {
            request_id: request.request_id,
            context_id,
            error: None,
            result: Some(b"orphan".to_vec()),
        }))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BridgeError::EntityNotExist {
            entity: Entity::WorkflowContext,
            ..
        }
    ));
    assert!(matches!(
        query.await.unwrap(),
        Err(BridgeError::EntityNotExist {
            entity: Entity::WorkflowContext,
            id,
        }) if id == context_id
    ));
    assert!(bridge.state().operations.is_empty());
}

#[tokio::test]
async fn test_bridge_only_request_is_unhandled() {
    let (bridge, _counterpart, _serve) = start(MockEngine::new());

    let err = bridge
        .on_envelope(&frame(WorkflowInvokeRequest {
            request_id: 1,
            context_id: 1,
            ..Default::default()
        }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UnhandledMessage(MessageType::WorkflowInvokeRequest)
    ));
}

#[tokio::test]
async fn test_child_workflow_for_missing_context_replies_and_reports() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());

    let err = bridge
        .on_envelope(&frame(WorkflowExecuteChildRequest {
            request_id: 30,
            context_id: 77,
            workflow: "Invoice".to_string(),
            ..Default::default()
        }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::EntityNotExist {
            entity: Entity::WorkflowContext,
            id: 77
        }
    ));

    let reply: WorkflowExecuteChildReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 30);
    assert_eq!(reply.context_id, 77);
    assert!(reply.error.is_some());
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected() {
    let engine: Arc<dyn WorkflowEngine> = Arc::new(MockEngine::new());
    let (transport, _frames) = ChannelTransport::pair(1);
    let config = BridgeConfig::default().with_max_concurrent_dispatch(0);

    assert!(matches!(
        Bridge::new(config, engine, Arc::new(transport)),
        Err(BridgeError::InvalidConfiguration(_))
    ));
}

#[tokio::test]
async fn test_calls_after_inbound_closes_fail_fast() {
    let (bridge, mut counterpart, serve) = start(MockEngine::new());
    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), params())
        .context_id;

    let caller = Arc::clone(&bridge);
    let pending = tokio::spawn(async move { caller.invoke_query(context_id, "status", None).await });
    let _request: WorkflowQueryInvokeRequest = counterpart.recv_as().await.unwrap();

    drop(counterpart);
    tokio::time::timeout(TEST_TIMEOUT, serve)
        .await
        .expect("serve loop exits when inbound closes")
        .unwrap();
    assert!(bridge.state().is_shutting_down());
    assert!(matches!(
        pending.await.unwrap(),
        Err(BridgeError::ShuttingDown)
    ));

    // no reply can arrive any more, so the default unbounded wait must not start
    let outcome = tokio::time::timeout(TEST_TIMEOUT, bridge.invoke_workflow(context_id, None))
        .await
        .expect("invoke_workflow returns instead of waiting forever");
    assert!(matches!(outcome, Err(BridgeError::ShuttingDown)));
    assert!(bridge.state().operations.is_empty());
}

#[tokio::test]
async fn test_reply_of_wrong_type_does_not_settle_call() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), params())
        .context_id;

    let caller = Arc::clone(&bridge);
    let query = tokio::spawn(async move { caller.invoke_query(context_id, "status", None).await });
    let request: WorkflowQueryInvokeRequest = counterpart.recv_as().await.unwrap();

    let err = bridge
        .on_envelope(&frame(ActivityStoppingReply {
            request_id: request.request_id,
            context_id,
            error: None,
        }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UnexpectedReply {
            expected: MessageType::WorkflowQueryInvokeReply,
            actual: MessageType::ActivityStoppingReply,
            ..
        }
    ));
    assert!(bridge.state().operations.contains(request.request_id));
    assert!(!query.is_finished());

    counterpart
        .send(WorkflowQueryInvokeReply {
            request_id: request.request_id,
            context_id,
            error: None,
            result: Some(b"open".to_vec()),
        })
        .await
        .unwrap();
    assert_eq!(query.await.unwrap().unwrap(), Some(b"open".to_vec()));
    assert_eq!(bridge.metrics().protocol_errors, 1);
}

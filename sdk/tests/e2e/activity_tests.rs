//! Activity invocation, stopping and heartbeat round trips

use std::sync::Arc;
use std::time::Duration;

use bridge_sdk::bridge_core::message::{
    ActivityCompleteReply, ActivityCompleteRequest, ActivityExecuteReply, ActivityExecuteRequest,
    ActivityGetHeartbeatDetailsReply, ActivityGetHeartbeatDetailsRequest,
    ActivityHasHeartbeatDetailsReply, ActivityHasHeartbeatDetailsRequest,
    ActivityInvokeLocalReply, ActivityInvokeLocalRequest, ActivityInvokeReply,
    ActivityInvokeRequest, ActivityRecordHeartbeatReply, ActivityRecordHeartbeatRequest,
    ActivityStoppingReply, ActivityStoppingRequest,
};
use bridge_sdk::prelude::*;
use bridge_sdk::testing::{Capability, EngineCall, MockEngine};

use super::{start, workflow_info};

fn activity_info() -> ActivityInfo {
    ActivityInfo {
        activity_id: "act-1".to_string(),
        activity_type: "charge".to_string(),
        workflow_type: "Billing".to_string(),
        workflow_execution: WorkflowExecution::new("wf-1", "run-1"),
        task_list: "A".to_string(),
        attempt: 1,
    }
}

#[tokio::test]
async fn test_activity_invoke_round_trip() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context = bridge.new_activity_context("charge", Some(activity_info()), Some(vec![1, 2, 3]));
    let context_id = context.context_id;

    let caller = Arc::clone(&bridge);
    let invocation = tokio::spawn(async move {
        caller
            .invoke_activity(context_id, Some(b"amount=5".to_vec()))
            .await
    });

    let request: ActivityInvokeRequest = counterpart.recv_as().await.unwrap();
    assert_eq!(request.context_id, context_id);
    assert_eq!(request.activity, "charge");
    assert_eq!(request.info, Some(activity_info()));
    counterpart
        .send(ActivityInvokeReply {
            request_id: request.request_id,
            context_id,
            error: None,
            result: Some(b"receipt".to_vec()),
        })
        .await
        .unwrap();

    assert_eq!(invocation.await.unwrap().unwrap(), Some(b"receipt".to_vec()));
    assert!(!bridge.state().activities.contains(context_id));
    assert!(bridge.state().operations.is_empty());
}

#[tokio::test]
async fn test_local_activity_failure_still_removes_context() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context_id = bridge.new_local_activity_context("lookup").context_id;
    assert!(bridge.state().activities.get(context_id).unwrap().local);

    let caller = Arc::clone(&bridge);
    let invocation =
        tokio::spawn(async move { caller.invoke_local_activity(context_id, None).await });

    let request: ActivityInvokeLocalRequest = counterpart.recv_as().await.unwrap();
    assert_eq!(request.activity, "lookup");
    counterpart
        .send(ActivityInvokeLocalReply {
            request_id: request.request_id,
            context_id,
            error: Some(ApplicationError::generic("not found")),
            result: None,
        })
        .await
        .unwrap();

    assert!(matches!(
        invocation.await.unwrap(),
        Err(BridgeError::Application(err)) if err.message == "not found"
    ));
    assert!(bridge.state().activities.is_empty());
}

#[tokio::test]
async fn test_stop_activity_marks_cancelled() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());
    let context = bridge.new_activity_context("charge", Some(activity_info()), None);
    let context_id = context.context_id;

    let caller = Arc::clone(&bridge);
    let stop = tokio::spawn(async move { caller.stop_activity(context_id).await });

    let request: ActivityStoppingRequest = counterpart.recv_as().await.unwrap();
    assert_eq!(request.activity_id.as_deref(), Some("act-1"));
    counterpart
        .send(ActivityStoppingReply {
            request_id: request.request_id,
            context_id,
            error: None,
        })
        .await
        .unwrap();

    stop.await.unwrap().unwrap();
    assert!(context.is_cancelled());
    assert!(bridge.state().activities.contains(context_id));
}

#[tokio::test]
async fn test_heartbeat_requests_use_activity_context() {
    let engine = MockEngine::new();
    let (bridge, mut counterpart, _serve) = start(engine.clone());
    let context_id = bridge.new_activity_context("charge", None, None).context_id;

    counterpart
        .send(ActivityHasHeartbeatDetailsRequest {
            request_id: 1,
            context_id,
        })
        .await
        .unwrap();
    let reply: ActivityHasHeartbeatDetailsReply = counterpart.recv_as().await.unwrap();
    assert!(!reply.has_details);

    counterpart
        .send(ActivityRecordHeartbeatRequest {
            request_id: 2,
            context_id,
            details: Some(b"50%".to_vec()),
        })
        .await
        .unwrap();
    let reply: ActivityRecordHeartbeatReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 2);
    assert!(reply.error.is_none());

    counterpart
        .send(ActivityGetHeartbeatDetailsRequest {
            request_id: 3,
            context_id,
        })
        .await
        .unwrap();
    let reply: ActivityGetHeartbeatDetailsReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.details, Some(b"50%".to_vec()));

    assert_eq!(
        engine.calls_to(Capability::RecordHeartbeat),
        vec![EngineCall::RecordHeartbeat {
            activity_context_id: context_id,
            details: Some(b"50%".to_vec()),
        }]
    );
}

#[tokio::test]
async fn test_heartbeat_for_unknown_activity_is_answered_with_error() {
    let (_bridge, mut counterpart, _serve) = start(MockEngine::new());

    counterpart
        .send(ActivityRecordHeartbeatRequest {
            request_id: 8,
            context_id: 99,
            details: None,
        })
        .await
        .unwrap();
    let reply: ActivityRecordHeartbeatReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 8);
    assert!(reply.error.unwrap().message.contains("activity context 99"));
}

#[tokio::test]
async fn test_activity_execute_from_workflow() {
    let engine = MockEngine::builder()
        .activity_result(b"charged".to_vec())
        .delay(Duration::from_millis(200))
        .build();
    let (bridge, mut counterpart, _serve) = start(engine.clone());
    let workflow_id = bridge
        .new_workflow_context(workflow_info("Billing"), ExecutionParams::new("default", "A"))
        .context_id;

    counterpart
        .send(ActivityExecuteRequest {
            request_id: 10,
            context_id: workflow_id,
            activity: "charge".to_string(),
            args: Some(b"5".to_vec()),
            options: Some(ActivityOptions {
                start_to_close_timeout: Some(Duration::from_secs(10)),
                ..Default::default()
            }),
        })
        .await
        .unwrap();

    // a ping sent later is answered while the activity is still running
    counterpart
        .send(bridge_sdk::bridge_core::message::PingRequest { request_id: 11 })
        .await
        .unwrap();
    let first = counterpart.recv().await.unwrap();
    assert_eq!(first.message_type(), MessageType::PingReply);

    let reply: ActivityExecuteReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 10);
    assert_eq!(reply.result, Some(b"charged".to_vec()));
    assert_eq!(
        engine.calls_to(Capability::ExecuteActivity),
        vec![EngineCall::ExecuteActivity {
            workflow_context_id: workflow_id,
            activity: "charge".to_string(),
            args: Some(b"5".to_vec()),
        }]
    );
}

#[tokio::test]
async fn test_activity_complete_by_task_token() {
    let engine = MockEngine::new();
    let (_bridge, mut counterpart, _serve) = start(engine.clone());

    counterpart
        .send(ActivityCompleteRequest {
            request_id: 4,
            task_token: vec![0xde, 0xad, 0xbe, 0xef],
            result: Some(b"done".to_vec()),
            error: None,
        })
        .await
        .unwrap();
    let reply: ActivityCompleteReply = counterpart.recv_as().await.unwrap();
    assert!(reply.error.is_none());
    assert_eq!(
        engine.calls_to(Capability::CompleteActivity),
        vec![EngineCall::CompleteActivity {
            task_token: vec![0xde, 0xad, 0xbe, 0xef],
            result: Some(b"done".to_vec()),
            error: None,
        }]
    );
}

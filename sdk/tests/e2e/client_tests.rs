//! Client-domain requests served against the engine

use std::time::Duration;

use bridge_sdk::bridge_core::message::{
    ConnectReply, ConnectRequest, DomainRegisterReply, DomainRegisterRequest, InitializeReply,
    InitializeRequest, NewWorkerReply, NewWorkerRequest, PingReply, PingRequest, StopWorkerReply,
    StopWorkerRequest, TerminateReply, TerminateRequest, WorkflowExecuteReply,
    WorkflowExecuteRequest, WorkflowQueryReply, WorkflowQueryRequest, WorkflowRegisterReply,
    WorkflowRegisterRequest, WorkflowSignalReply, WorkflowSignalRequest,
};
use bridge_sdk::prelude::*;
use bridge_sdk::testing::{Capability, EngineCall, MockEngine};

use super::{eventually, start, workflow_info, TEST_TIMEOUT};

#[tokio::test]
async fn test_initialize_records_library_endpoint() {
    let (bridge, mut counterpart, _serve) = start(MockEngine::new());

    counterpart
        .send(InitializeRequest {
            request_id: 1,
            library_address: Some("127.0.0.1".to_string()),
            library_port: 5001,
        })
        .await
        .unwrap();
    let reply: InitializeReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 1);
    assert_eq!(
        bridge.state().library_endpoint().as_deref(),
        Some("127.0.0.1:5001")
    );
}

#[tokio::test]
async fn test_connect_forwards_endpoints() {
    let engine = MockEngine::new();
    let (_bridge, mut counterpart, _serve) = start(engine.clone());

    counterpart
        .send(ConnectRequest {
            request_id: 2,
            endpoints: Some("engine-a:7933, engine-b:7933".to_string()),
            identity: Some("worker-1".to_string()),
            client_timeout: Some(Duration::from_secs(10)),
            domain: Some("default".to_string()),
            create_domain: true,
        })
        .await
        .unwrap();
    let reply: ConnectReply = counterpart.recv_as().await.unwrap();
    assert!(reply.error.is_none());

    match engine.calls_to(Capability::Connect).as_slice() {
        [EngineCall::Connect(options)] => {
            assert_eq!(options.endpoints, vec!["engine-a:7933", "engine-b:7933"]);
            assert_eq!(options.identity.as_deref(), Some("worker-1"));
            assert_eq!(options.client_timeout, Some(Duration::from_secs(10)));
            assert!(options.create_domain);
        }
        other => panic!("unexpected calls: {other:?}"),
    }
}

#[tokio::test]
async fn test_engine_failure_is_returned_in_reply() {
    let engine = MockEngine::builder()
        .fail(
            Capability::RegisterDomain,
            ApplicationError::generic("domain already exists"),
        )
        .build();
    let (bridge, mut counterpart, _serve) = start(engine);

    counterpart
        .send(DomainRegisterRequest {
            request_id: 3,
            name: Some("billing".to_string()),
            retention_days: 7,
            ..Default::default()
        })
        .await
        .unwrap();
    let reply: DomainRegisterReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.error.unwrap().message, "domain already exists");
    assert!(eventually(|| bridge.metrics().requests_handled == 1).await);
}

#[tokio::test]
async fn test_worker_lifecycle() {
    let engine = MockEngine::new();
    let (bridge, mut counterpart, _serve) = start(engine.clone());

    counterpart
        .send(NewWorkerRequest {
            request_id: 4,
            domain: Some("default".to_string()),
            task_list: Some("billing".to_string()),
            options: Some(WorkerOptions::default()),
        })
        .await
        .unwrap();
    let reply: NewWorkerReply = counterpart.recv_as().await.unwrap();
    assert!(reply.error.is_none());
    let worker_id = reply.worker_id;
    assert!(worker_id > 0);
    assert!(bridge.state().workers.contains(worker_id));

    counterpart
        .send(StopWorkerRequest {
            request_id: 5,
            worker_id,
        })
        .await
        .unwrap();
    let reply: StopWorkerReply = counterpart.recv_as().await.unwrap();
    assert!(reply.error.is_none());
    assert!(bridge.state().workers.is_empty());
    assert_eq!(
        engine.calls_to(Capability::StopWorker),
        vec![EngineCall::StopWorker {
            task_list: "billing".to_string()
        }]
    );

    // stopping again finds nothing
    counterpart
        .send(StopWorkerRequest {
            request_id: 6,
            worker_id,
        })
        .await
        .unwrap();
    let reply: StopWorkerReply = counterpart.recv_as().await.unwrap();
    assert!(reply.error.unwrap().message.contains("worker"));
}

#[tokio::test]
async fn test_workflow_client_requests() {
    let engine = MockEngine::builder()
        .execution(WorkflowExecution::new("order-7", "run-9"))
        .query_result(b"shipped".to_vec())
        .build();
    let (_bridge, mut counterpart, _serve) = start(engine.clone());

    counterpart
        .send(WorkflowRegisterRequest {
            request_id: 1,
            name: "Order".to_string(),
        })
        .await
        .unwrap();
    let reply: WorkflowRegisterReply = counterpart.recv_as().await.unwrap();
    assert!(reply.error.is_none());

    counterpart
        .send(WorkflowExecuteRequest {
            request_id: 2,
            domain: Some("default".to_string()),
            workflow: "Order".to_string(),
            args: Some(b"{}".to_vec()),
            options: Some(StartWorkflowOptions {
                task_list: Some("orders".to_string()),
                ..Default::default()
            }),
        })
        .await
        .unwrap();
    let reply: WorkflowExecuteReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.execution, Some(WorkflowExecution::new("order-7", "run-9")));

    let execution = WorkflowExecution::new("order-7", "run-9");
    counterpart
        .send(WorkflowSignalRequest {
            request_id: 3,
            domain: None,
            execution: execution.clone(),
            signal_name: "cancel".to_string(),
            signal_args: None,
        })
        .await
        .unwrap();
    let reply: WorkflowSignalReply = counterpart.recv_as().await.unwrap();
    assert!(reply.error.is_none());

    counterpart
        .send(WorkflowQueryRequest {
            request_id: 4,
            domain: None,
            execution: execution.clone(),
            query_name: "status".to_string(),
            query_args: None,
        })
        .await
        .unwrap();
    let reply: WorkflowQueryReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.result, Some(b"shipped".to_vec()));

    assert_eq!(engine.call_count(Capability::ExecuteWorkflow), 1);
    assert_eq!(
        engine.calls_to(Capability::SignalWorkflow),
        vec![EngineCall::SignalWorkflow {
            execution,
            signal_name: "cancel".to_string(),
            args: None,
        }]
    );
}

#[tokio::test]
async fn test_child_workflow_without_parent_context() {
    let engine = MockEngine::new();
    let (bridge, mut counterpart, _serve) = start(engine.clone());
    let parent =
        bridge.new_workflow_context(workflow_info("Billing"), ExecutionParams::new("default", "A"));

    counterpart
        .send(bridge_sdk::bridge_core::message::WorkflowExecuteChildRequest {
            request_id: 20,
            context_id: parent.context_id + 100,
            workflow: "Invoice".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let reply: bridge_sdk::bridge_core::message::WorkflowExecuteChildReply =
        counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 20);
    assert!(reply.error.is_some());
    assert!(!engine.was_called(Capability::ExecuteChildWorkflow));
}

#[tokio::test]
async fn test_ping_and_terminate() {
    let (bridge, mut counterpart, serve) = start(MockEngine::new());

    counterpart.send(PingRequest { request_id: 1 }).await.unwrap();
    let reply: PingReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 1);

    counterpart
        .send(TerminateRequest { request_id: 2 })
        .await
        .unwrap();
    let reply: TerminateReply = counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 2);

    tokio::time::timeout(TEST_TIMEOUT, serve)
        .await
        .expect("serve loop exits after terminate")
        .unwrap();
    assert!(bridge.state().is_shutting_down());

    let context_id = bridge
        .new_workflow_context(workflow_info("Billing"), ExecutionParams::new("default", "A"))
        .context_id;
    assert!(matches!(
        bridge.invoke_signal(context_id, "late", None).await,
        Err(BridgeError::ShuttingDown)
    ));
}

#[tokio::test]
async fn test_child_workflow_runs_under_parent() {
    let engine = MockEngine::builder().child_result(b"invoice-1".to_vec()).build();
    let (bridge, mut counterpart, _serve) = start(engine.clone());
    let parent =
        bridge.new_workflow_context(workflow_info("Billing"), ExecutionParams::new("default", "A"));

    counterpart
        .send(bridge_sdk::bridge_core::message::WorkflowExecuteChildRequest {
            request_id: 21,
            context_id: parent.context_id,
            workflow: "Invoice".to_string(),
            args: Some(b"order-7".to_vec()),
            options: None,
        })
        .await
        .unwrap();
    let reply: bridge_sdk::bridge_core::message::WorkflowExecuteChildReply =
        counterpart.recv_as().await.unwrap();
    assert_eq!(reply.request_id, 21);
    assert_eq!(reply.context_id, parent.context_id);
    assert_eq!(reply.result, Some(b"invoice-1".to_vec()));
    assert_eq!(
        engine.calls_to(Capability::ExecuteChildWorkflow),
        vec![EngineCall::ExecuteChildWorkflow {
            parent_context_id: parent.context_id,
            workflow: "Invoice".to_string(),
            args: Some(b"order-7".to_vec()),
        }]
    );
}

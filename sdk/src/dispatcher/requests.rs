//! Request handlers
//!
//! Requests originate in the client library and ask the bridge to act on the
//! engine. Each handler calls one engine capability and answers with the
//! matching reply; engine failures travel back in the reply's `error` field.
//! Child workflows and activities run for as long as the engine needs, so
//! their handlers reply from a spawned task.

use bridge_core::message::*;
use bridge_core::{ApplicationError, Message, ProxyMessage};
use tracing::{debug, info, warn};

use super::Dispatcher;
use crate::engine::{ConnectOptions, DomainRegistration, EngineResult};
use crate::error::{BridgeError, Entity, Result};
use crate::workers::RegisteredWorker;

/// Split an engine outcome into reply fields
fn split<T: Default>(result: EngineResult<T>) -> (T, Option<ApplicationError>) {
    match result {
        Ok(value) => (value, None),
        Err(error) => (T::default(), Some(error)),
    }
}

fn ack(result: EngineResult<()>) -> Option<ApplicationError> {
    result.err()
}

/// Answer with an error reply and report `error` to the dispatcher
async fn reject<R: ProxyMessage>(dispatcher: &Dispatcher, reply: R, error: BridgeError) -> Result<()> {
    dispatcher.send_reply(reply).await?;
    Err(error)
}

fn endpoints(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) async fn handle_request(dispatcher: &Dispatcher, message: Message) -> Result<()> {
    let engine = dispatcher.engine();
    let state = dispatcher.state();

    match message {
        Message::InitializeRequest(request) => {
            if let Some(address) = request.library_address.as_deref() {
                let endpoint = format!("{}:{}", address, request.library_port);
                info!(%endpoint, "client library initialized");
                state.set_library_endpoint(endpoint);
            }
            dispatcher
                .send_reply(InitializeReply {
                    request_id: request.request_id,
                    error: None,
                })
                .await
        }

        Message::ConnectRequest(request) => {
            let options = ConnectOptions {
                endpoints: endpoints(request.endpoints.as_deref()),
                identity: request.identity,
                client_timeout: request.client_timeout,
                domain: request.domain,
                create_domain: request.create_domain,
            };
            info!(endpoints = ?options.endpoints, domain = ?options.domain, "connecting to engine");
            let error = ack(engine.connect(options).await);
            dispatcher
                .send_reply(ConnectReply {
                    request_id: request.request_id,
                    error,
                })
                .await
        }

        Message::PingRequest(request) => {
            dispatcher
                .send_reply(PingReply {
                    request_id: request.request_id,
                    error: None,
                })
                .await
        }

        Message::HeartbeatRequest(request) => {
            dispatcher
                .send_reply(HeartbeatReply {
                    request_id: request.request_id,
                    error: None,
                })
                .await
        }

        Message::TerminateRequest(request) => {
            let sent = dispatcher
                .send_reply(TerminateReply {
                    request_id: request.request_id,
                    error: None,
                })
                .await;
            state.request_shutdown();
            sent
        }

        Message::DomainRegisterRequest(request) => {
            let registration = DomainRegistration {
                name: request.name.unwrap_or_default(),
                description: request.description,
                owner_email: request.owner_email,
                emit_metrics: request.emit_metrics,
                retention_days: request.retention_days,
            };
            debug!(domain = %registration.name, "registering domain");
            let error = ack(engine.register_domain(registration).await);
            dispatcher
                .send_reply(DomainRegisterReply {
                    request_id: request.request_id,
                    error,
                })
                .await
        }

        Message::NewWorkerRequest(request) => {
            let domain = request.domain.unwrap_or_default();
            let task_list = request.task_list.unwrap_or_default();
            let started = engine
                .register_worker(&domain, &task_list, request.options.unwrap_or_default())
                .await;

            let reply = match started {
                Ok(handle) => {
                    let worker = state.workers.add(|worker_id| RegisteredWorker {
                        worker_id,
                        domain,
                        task_list,
                        handle,
                    });
                    info!(
                        worker_id = worker.worker_id,
                        domain = %worker.domain,
                        task_list = %worker.task_list,
                        "worker started"
                    );
                    NewWorkerReply {
                        request_id: request.request_id,
                        error: None,
                        worker_id: worker.worker_id,
                    }
                }
                Err(error) => NewWorkerReply {
                    request_id: request.request_id,
                    error: Some(error),
                    worker_id: 0,
                },
            };
            dispatcher.send_reply(reply).await
        }

        Message::StopWorkerRequest(request) => {
            let Some(worker) = state.workers.remove(request.worker_id) else {
                let error = BridgeError::not_exist(Entity::Worker, request.worker_id);
                let reply = StopWorkerReply {
                    request_id: request.request_id,
                    error: Some(error.to_application_error()),
                };
                return reject(dispatcher, reply, error).await;
            };
            info!(worker_id = worker.worker_id, "stopping worker");
            let error = ack(worker.handle.stop().await);
            dispatcher
                .send_reply(StopWorkerReply {
                    request_id: request.request_id,
                    error,
                })
                .await
        }

        Message::WorkflowRegisterRequest(request) => {
            let error = ack(engine.register_workflow(&request.name).await);
            dispatcher
                .send_reply(WorkflowRegisterReply {
                    request_id: request.request_id,
                    error,
                })
                .await
        }

        Message::WorkflowExecuteRequest(request) => {
            let domain = request.domain.unwrap_or_default();
            let (execution, error) = split(
                engine
                    .execute_workflow(
                        &domain,
                        &request.workflow,
                        request.args,
                        request.options.unwrap_or_default(),
                    )
                    .await
                    .map(Some),
            );
            dispatcher
                .send_reply(WorkflowExecuteReply {
                    request_id: request.request_id,
                    error,
                    execution,
                })
                .await
        }

        Message::WorkflowSignalRequest(request) => {
            let domain = request.domain.unwrap_or_default();
            let error = ack(
                engine
                    .signal_workflow(
                        &domain,
                        &request.execution,
                        &request.signal_name,
                        request.signal_args,
                    )
                    .await,
            );
            dispatcher
                .send_reply(WorkflowSignalReply {
                    request_id: request.request_id,
                    error,
                })
                .await
        }

        Message::WorkflowQueryRequest(request) => {
            let domain = request.domain.unwrap_or_default();
            let (result, error) = split(
                engine
                    .query_workflow(
                        &domain,
                        &request.execution,
                        &request.query_name,
                        request.query_args,
                    )
                    .await,
            );
            dispatcher
                .send_reply(WorkflowQueryReply {
                    request_id: request.request_id,
                    error,
                    result,
                })
                .await
        }

        Message::WorkflowExecuteChildRequest(request) => {
            let parent = match state.workflows.require(request.context_id) {
                Ok(parent) => parent,
                Err(error) => {
                    let reply = WorkflowExecuteChildReply {
                        request_id: request.request_id,
                        context_id: request.context_id,
                        error: Some(error.to_application_error()),
                        result: None,
                    };
                    return reject(dispatcher, reply, error).await;
                }
            };

            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let (result, error) = split(
                    dispatcher
                        .engine()
                        .execute_child_workflow(
                            &parent,
                            &request.workflow,
                            request.args,
                            request.options.unwrap_or_default(),
                        )
                        .await,
                );
                let reply = WorkflowExecuteChildReply {
                    request_id: request.request_id,
                    context_id: request.context_id,
                    error,
                    result,
                };
                if let Err(err) = dispatcher.send_reply(reply).await {
                    warn!(request_id = request.request_id, error = %err, "child workflow reply not sent");
                }
            });
            Ok(())
        }

        Message::ActivityRegisterRequest(request) => {
            let error = ack(engine.register_activity(&request.name).await);
            dispatcher
                .send_reply(ActivityRegisterReply {
                    request_id: request.request_id,
                    error,
                })
                .await
        }

        Message::ActivityExecuteRequest(request) => {
            let workflow = match state.workflows.require(request.context_id) {
                Ok(workflow) => workflow,
                Err(error) => {
                    let reply = ActivityExecuteReply {
                        request_id: request.request_id,
                        error: Some(error.to_application_error()),
                        result: None,
                    };
                    return reject(dispatcher, reply, error).await;
                }
            };

            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let (result, error) = split(
                    dispatcher
                        .engine()
                        .execute_activity(
                            &workflow,
                            &request.activity,
                            request.args,
                            request.options.unwrap_or_default(),
                        )
                        .await,
                );
                let reply = ActivityExecuteReply {
                    request_id: request.request_id,
                    error,
                    result,
                };
                if let Err(err) = dispatcher.send_reply(reply).await {
                    warn!(request_id = request.request_id, error = %err, "activity reply not sent");
                }
            });
            Ok(())
        }

        Message::ActivityRecordHeartbeatRequest(request) => {
            let activity = match state.activities.require(request.context_id) {
                Ok(activity) => activity,
                Err(error) => {
                    let reply = ActivityRecordHeartbeatReply {
                        request_id: request.request_id,
                        error: Some(error.to_application_error()),
                    };
                    return reject(dispatcher, reply, error).await;
                }
            };
            let error = ack(engine.record_heartbeat(&activity, request.details).await);
            dispatcher
                .send_reply(ActivityRecordHeartbeatReply {
                    request_id: request.request_id,
                    error,
                })
                .await
        }

        Message::ActivityHasHeartbeatDetailsRequest(request) => {
            let activity = match state.activities.require(request.context_id) {
                Ok(activity) => activity,
                Err(error) => {
                    let reply = ActivityHasHeartbeatDetailsReply {
                        request_id: request.request_id,
                        error: Some(error.to_application_error()),
                        has_details: false,
                    };
                    return reject(dispatcher, reply, error).await;
                }
            };
            let (details, error) = split(engine.heartbeat_details(&activity).await);
            dispatcher
                .send_reply(ActivityHasHeartbeatDetailsReply {
                    request_id: request.request_id,
                    error,
                    has_details: details.is_some(),
                })
                .await
        }

        Message::ActivityGetHeartbeatDetailsRequest(request) => {
            let activity = match state.activities.require(request.context_id) {
                Ok(activity) => activity,
                Err(error) => {
                    let reply = ActivityGetHeartbeatDetailsReply {
                        request_id: request.request_id,
                        error: Some(error.to_application_error()),
                        details: None,
                    };
                    return reject(dispatcher, reply, error).await;
                }
            };
            let (details, error) = split(engine.heartbeat_details(&activity).await);
            dispatcher
                .send_reply(ActivityGetHeartbeatDetailsReply {
                    request_id: request.request_id,
                    error,
                    details,
                })
                .await
        }

        Message::ActivityCompleteRequest(request) => {
            let error = ack(
                engine
                    .complete_activity(&request.task_token, request.result, request.error)
                    .await,
            );
            dispatcher
                .send_reply(ActivityCompleteReply {
                    request_id: request.request_id,
                    error,
                })
                .await
        }

        // only ever sent by the bridge
        other => Err(BridgeError::UnhandledMessage(other.message_type())),
    }
}

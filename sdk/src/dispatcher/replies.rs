//! Reply handlers
//!
//! Each handler finds the pending operation for the reply's request id, finds
//! the execution context through the operation's context id where the reply
//! needs one, and settles the operation. Terminal replies remove their
//! context before the waiter wakes, so a caller that observes the result also
//! observes the context gone.
//!
//! A reply only settles an operation registered for its own type. A reply of
//! another type carrying a live request id is a protocol error and leaves the
//! operation pending.

use std::sync::Arc;

use bridge_core::message::{
    ActivityStoppingReply, WorkflowDisconnectContextReply, WorkflowInvokeReply,
    WorkflowQueryInvokeReply, WorkflowSignalInvokeReply,
};
use bridge_core::{ApplicationError, ContinueAsNew, Message, MessageType};
use tracing::{debug, warn};

use crate::error::{BridgeError, Entity, Result};
use crate::operation::{Completion, Operation, OperationResult};
use crate::state::BridgeState;

/// Route a decoded reply to its handler
pub(crate) fn handle_reply(state: &BridgeState, message: Message) -> Result<()> {
    match message {
        Message::WorkflowInvokeReply(reply) => on_workflow_invoke(state, reply),
        Message::WorkflowSignalInvokeReply(reply) => on_workflow_signal_invoke(state, reply),
        Message::WorkflowQueryInvokeReply(reply) => on_workflow_query_invoke(state, reply),
        Message::WorkflowDisconnectContextReply(reply) => on_workflow_disconnect(state, reply),
        Message::ActivityInvokeReply(reply) => on_activity_invoke(
            state,
            MessageType::ActivityInvokeReply,
            reply.request_id,
            reply.error,
            reply.result,
        ),
        Message::ActivityInvokeLocalReply(reply) => on_activity_invoke(
            state,
            MessageType::ActivityInvokeLocalReply,
            reply.request_id,
            reply.error,
            reply.result,
        ),
        Message::ActivityStoppingReply(reply) => on_activity_stopping(state, reply),
        other if other.message_type().is_reply() => {
            acknowledge(other.message_type());
            Ok(())
        }
        other => Err(BridgeError::UnhandledMessage(other.message_type())),
    }
}

fn completion(error: Option<ApplicationError>, value: OperationResult) -> Completion {
    match error {
        Some(error) => Err(BridgeError::Application(error)),
        None => Ok(value),
    }
}

/// Find the operation `request_id` names, provided it waits for `reply_type`
fn lookup_operation(
    state: &BridgeState,
    request_id: i64,
    reply_type: MessageType,
) -> Result<Arc<Operation>> {
    let operation = state
        .operations
        .get(request_id)
        .ok_or_else(|| BridgeError::not_exist(Entity::Operation, request_id))?;
    if operation.reply_type() != reply_type {
        return Err(BridgeError::UnexpectedReply {
            request_id,
            expected: operation.reply_type(),
            actual: reply_type,
        });
    }
    Ok(operation)
}

fn settle(state: &BridgeState, request_id: i64, completion: Completion) -> Result<()> {
    state.operations.resolve(request_id, completion)?;
    state.metrics.record_reply_settled();
    Ok(())
}

/// The operation exists but its context is gone: evict the operation and
/// fail its waiter with the same correlation error.
fn orphaned(state: &BridgeState, request_id: i64, error: BridgeError) -> Result<()> {
    warn!(request_id, %error, "reply for an execution that no longer exists");
    // ignore a concurrent eviction; the error below is reported either way
    let _ = state.operations.resolve(request_id, Err(error.clone()));
    Err(error)
}

fn on_workflow_invoke(state: &BridgeState, reply: WorkflowInvokeReply) -> Result<()> {
    let request_id = reply.request_id;
    let operation = lookup_operation(state, request_id, MessageType::WorkflowInvokeReply)?;
    let context_id = operation.context_id();

    let Some(context) = state.workflows.get(context_id) else {
        return orphaned(
            state,
            request_id,
            BridgeError::not_exist(Entity::WorkflowContext, context_id),
        );
    };

    let completion = if reply.continue_as_new {
        let directive = ContinueAsNew::resolve(
            context.workflow_type(),
            &context.params,
            &reply.overrides,
            reply.continue_as_new_args,
        );
        debug!(
            request_id,
            context_id,
            workflow_type = %directive.workflow_type,
            task_list = %directive.params.task_list,
            "workflow continuing as new"
        );
        Ok(OperationResult::ContinueAsNew(directive))
    } else {
        completion(reply.error, OperationResult::Payload(reply.result))
    };

    state.workflows.remove(context_id);
    settle(state, request_id, completion)
}

fn on_workflow_signal_invoke(state: &BridgeState, reply: WorkflowSignalInvokeReply) -> Result<()> {
    let request_id = reply.request_id;
    let operation = lookup_operation(state, request_id, MessageType::WorkflowSignalInvokeReply)?;
    let context_id = operation.context_id();

    if !state.workflows.contains(context_id) {
        return orphaned(
            state,
            request_id,
            BridgeError::not_exist(Entity::WorkflowContext, context_id),
        );
    }

    settle(
        state,
        request_id,
        completion(reply.error, OperationResult::Ack(true)),
    )
}

fn on_workflow_query_invoke(state: &BridgeState, reply: WorkflowQueryInvokeReply) -> Result<()> {
    let request_id = reply.request_id;
    let operation = lookup_operation(state, request_id, MessageType::WorkflowQueryInvokeReply)?;
    let context_id = operation.context_id();

    if !state.workflows.contains(context_id) {
        return orphaned(
            state,
            request_id,
            BridgeError::not_exist(Entity::WorkflowContext, context_id),
        );
    }

    settle(
        state,
        request_id,
        completion(reply.error, OperationResult::Payload(reply.result)),
    )
}

fn on_workflow_disconnect(
    state: &BridgeState,
    reply: WorkflowDisconnectContextReply,
) -> Result<()> {
    let request_id = reply.request_id;
    let operation = lookup_operation(
        state,
        request_id,
        MessageType::WorkflowDisconnectContextReply,
    )?;
    let context_id = operation.context_id();

    if state.workflows.remove(context_id).is_none() {
        debug!(request_id, context_id, "workflow context already gone");
    }

    settle(
        state,
        request_id,
        completion(reply.error, OperationResult::Ack(true)),
    )
}

fn on_activity_invoke(
    state: &BridgeState,
    reply_type: MessageType,
    request_id: i64,
    error: Option<ApplicationError>,
    result: Option<Vec<u8>>,
) -> Result<()> {
    let operation = lookup_operation(state, request_id, reply_type)?;
    let context_id = operation.context_id();

    if state.activities.remove(context_id).is_none() {
        return orphaned(
            state,
            request_id,
            BridgeError::not_exist(Entity::ActivityContext, context_id),
        );
    }

    settle(
        state,
        request_id,
        completion(error, OperationResult::Payload(result)),
    )
}

fn on_activity_stopping(state: &BridgeState, reply: ActivityStoppingReply) -> Result<()> {
    let request_id = reply.request_id;
    lookup_operation(state, request_id, MessageType::ActivityStoppingReply)?;

    settle(
        state,
        request_id,
        completion(reply.error, OperationResult::Ack(true)),
    )
}

/// Replies with no waiting caller on this side
fn acknowledge(message_type: MessageType) {
    debug!(%message_type, "acknowledged reply");
}

//! Workflow-domain messages
//!
//! `*InvokeRequest` / `*InvokeReply` pairs flow from the bridge to the client
//! (the engine calling into workflow code); the rest flow from the client to
//! the bridge (workflow code calling into the engine).

use super::keys;
use super::{read_error, read_request_id, write_reply_header, write_request_header};
use super::{MessageType, ProxyMessage};
use crate::application::ApplicationError;
use crate::envelope::Envelope;
use crate::error::CoreResult;
use crate::execution::{
    ChildWorkflowOptions, ContinueAsNewOverrides, StartWorkflowOptions, WorkflowExecution,
    WorkflowInfo,
};

const WORKFLOW_ID: &str = "WorkflowId";
const RUN_ID: &str = "RunId";
const TASK_LIST: &str = "TaskList";
const SIGNAL_NAME: &str = "SignalName";
const SIGNAL_ARGS: &str = "SignalArgs";
const QUERY_NAME: &str = "QueryName";
const QUERY_ARGS: &str = "QueryArgs";

fn write_execution(envelope: &mut Envelope, execution: &WorkflowExecution) {
    envelope.set_string(WORKFLOW_ID, Some(&execution.workflow_id));
    envelope.set_string(RUN_ID, Some(&execution.run_id));
}

fn read_execution(envelope: &Envelope) -> WorkflowExecution {
    WorkflowExecution {
        workflow_id: envelope.get_string(WORKFLOW_ID).unwrap_or_default(),
        run_id: envelope.get_string(RUN_ID).unwrap_or_default(),
    }
}

/// Register a workflow type with the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowRegisterRequest {
    pub request_id: i64,
    pub name: String,
}

impl ProxyMessage for WorkflowRegisterRequest {
    const TYPE: MessageType = MessageType::WorkflowRegisterRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_string(keys::NAME, Some(&self.name));
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            name: envelope.get_string(keys::NAME).unwrap_or_default(),
        })
    }
}

impl_request!(WorkflowRegisterRequest => WorkflowRegisterReply);
ack_reply!(WorkflowRegisterReply);

/// Start a top-level workflow run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowExecuteRequest {
    pub request_id: i64,
    pub domain: Option<String>,
    pub workflow: String,
    pub args: Option<Vec<u8>>,
    pub options: Option<StartWorkflowOptions>,
}

impl ProxyMessage for WorkflowExecuteRequest {
    const TYPE: MessageType = MessageType::WorkflowExecuteRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_string(keys::DOMAIN, self.domain.as_deref());
        envelope.set_string("Workflow", Some(&self.workflow));
        envelope.set_bytes(keys::ARGS, self.args.as_deref());
        envelope.set_json(keys::OPTIONS, self.options.as_ref())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            domain: envelope.get_string(keys::DOMAIN),
            workflow: envelope.get_string("Workflow").unwrap_or_default(),
            args: envelope.get_bytes(keys::ARGS)?,
            options: envelope.get_json(keys::OPTIONS)?,
        })
    }
}

impl_request!(WorkflowExecuteRequest => WorkflowExecuteReply);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowExecuteReply {
    pub request_id: i64,
    pub error: Option<ApplicationError>,
    pub execution: Option<WorkflowExecution>,
}

impl ProxyMessage for WorkflowExecuteReply {
    const TYPE: MessageType = MessageType::WorkflowExecuteReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_json("Execution", self.execution.as_ref())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            error: read_error(envelope)?,
            execution: envelope.get_json("Execution")?,
        })
    }
}

impl_reply!(WorkflowExecuteReply);

/// Run a workflow's code in the client for one engine invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowInvokeRequest {
    pub request_id: i64,
    pub context_id: i64,
    pub info: WorkflowInfo,
    pub args: Option<Vec<u8>>,
    pub execution_start_to_close_timeout: Option<std::time::Duration>,
}

impl ProxyMessage for WorkflowInvokeRequest {
    const TYPE: MessageType = MessageType::WorkflowInvokeRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_string(keys::NAME, Some(&self.info.workflow_type));
        envelope.set_string(keys::DOMAIN, Some(&self.info.domain));
        envelope.set_string(TASK_LIST, Some(&self.info.task_list));
        write_execution(envelope, &self.info.execution);
        envelope.set_bytes(keys::ARGS, self.args.as_deref());
        envelope.set_duration(
            "ExecutionStartToCloseTimeout",
            self.execution_start_to_close_timeout,
        );
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            info: WorkflowInfo {
                domain: envelope.get_string(keys::DOMAIN).unwrap_or_default(),
                workflow_type: envelope.get_string(keys::NAME).unwrap_or_default(),
                execution: read_execution(envelope),
                task_list: envelope.get_string(TASK_LIST).unwrap_or_default(),
            },
            args: envelope.get_bytes(keys::ARGS)?,
            execution_start_to_close_timeout: envelope
                .get_duration("ExecutionStartToCloseTimeout")?,
        })
    }
}

impl_request!(WorkflowInvokeRequest => WorkflowInvokeReply, context);

/// Outcome of one workflow invocation, possibly asking to continue as new
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowInvokeReply {
    pub request_id: i64,
    pub context_id: i64,
    pub error: Option<ApplicationError>,
    pub result: Option<Vec<u8>>,
    pub continue_as_new: bool,
    pub continue_as_new_args: Option<Vec<u8>>,
    pub overrides: ContinueAsNewOverrides,
}

const CAN: &str = "ContinueAsNew";
const CAN_ARGS: &str = "ContinueAsNewArgs";
const CAN_DOMAIN: &str = "ContinueAsNewDomain";
const CAN_TASK_LIST: &str = "ContinueAsNewTaskList";
const CAN_SCHEDULE_TO_START: &str = "ContinueAsNewScheduleToStartTimeout";
const CAN_SCHEDULE_TO_CLOSE: &str = "ContinueAsNewScheduleToCloseTimeout";
const CAN_START_TO_CLOSE: &str = "ContinueAsNewStartToCloseTimeout";
const CAN_EXECUTION_START_TO_CLOSE: &str = "ContinueAsNewExecutionStartToCloseTimeout";

impl ProxyMessage for WorkflowInvokeReply {
    const TYPE: MessageType = MessageType::WorkflowInvokeReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_bytes(keys::RESULT, self.result.as_deref());
        envelope.set_bool(CAN, self.continue_as_new);
        envelope.set_bytes(CAN_ARGS, self.continue_as_new_args.as_deref());

        let o = &self.overrides;
        envelope.set_string(CAN_DOMAIN, o.domain.as_deref());
        envelope.set_string(CAN_TASK_LIST, o.task_list.as_deref());
        envelope.set_duration(CAN_SCHEDULE_TO_START, o.schedule_to_start_timeout);
        envelope.set_duration(CAN_SCHEDULE_TO_CLOSE, o.schedule_to_close_timeout);
        envelope.set_duration(CAN_START_TO_CLOSE, o.start_to_close_timeout);
        envelope.set_duration(
            CAN_EXECUTION_START_TO_CLOSE,
            o.execution_start_to_close_timeout,
        );
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            error: read_error(envelope)?,
            result: envelope.get_bytes(keys::RESULT)?,
            continue_as_new: envelope.get_bool(CAN)?,
            continue_as_new_args: envelope.get_bytes(CAN_ARGS)?,
            overrides: ContinueAsNewOverrides {
                domain: envelope.get_string(CAN_DOMAIN),
                task_list: envelope.get_string(CAN_TASK_LIST),
                schedule_to_start_timeout: envelope.get_duration(CAN_SCHEDULE_TO_START)?,
                schedule_to_close_timeout: envelope.get_duration(CAN_SCHEDULE_TO_CLOSE)?,
                start_to_close_timeout: envelope.get_duration(CAN_START_TO_CLOSE)?,
                execution_start_to_close_timeout: envelope
                    .get_duration(CAN_EXECUTION_START_TO_CLOSE)?,
            },
        })
    }
}

impl_reply!(WorkflowInvokeReply);

/// Signal an external workflow run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowSignalRequest {
    pub request_id: i64,
    pub domain: Option<String>,
    pub execution: WorkflowExecution,
    pub signal_name: String,
    pub signal_args: Option<Vec<u8>>,
}

impl ProxyMessage for WorkflowSignalRequest {
    const TYPE: MessageType = MessageType::WorkflowSignalRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_string(keys::DOMAIN, self.domain.as_deref());
        write_execution(envelope, &self.execution);
        envelope.set_string(SIGNAL_NAME, Some(&self.signal_name));
        envelope.set_bytes(SIGNAL_ARGS, self.signal_args.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            domain: envelope.get_string(keys::DOMAIN),
            execution: read_execution(envelope),
            signal_name: envelope.get_string(SIGNAL_NAME).unwrap_or_default(),
            signal_args: envelope.get_bytes(SIGNAL_ARGS)?,
        })
    }
}

impl_request!(WorkflowSignalRequest => WorkflowSignalReply);
ack_reply!(WorkflowSignalReply);

/// Deliver a signal into a running workflow's code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowSignalInvokeRequest {
    pub request_id: i64,
    pub context_id: i64,
    pub signal_name: String,
    pub signal_args: Option<Vec<u8>>,
}

impl ProxyMessage for WorkflowSignalInvokeRequest {
    const TYPE: MessageType = MessageType::WorkflowSignalInvokeRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_string(SIGNAL_NAME, Some(&self.signal_name));
        envelope.set_bytes(SIGNAL_ARGS, self.signal_args.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            signal_name: envelope.get_string(SIGNAL_NAME).unwrap_or_default(),
            signal_args: envelope.get_bytes(SIGNAL_ARGS)?,
        })
    }
}

impl_request!(WorkflowSignalInvokeRequest => WorkflowSignalInvokeReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowSignalInvokeReply {
    pub request_id: i64,
    pub context_id: i64,
    pub error: Option<ApplicationError>,
}

impl ProxyMessage for WorkflowSignalInvokeReply {
    const TYPE: MessageType = MessageType::WorkflowSignalInvokeReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            error: read_error(envelope)?,
        })
    }
}

impl_reply!(WorkflowSignalInvokeReply);

/// Query an external workflow run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowQueryRequest {
    pub request_id: i64,
    pub domain: Option<String>,
    pub execution: WorkflowExecution,
    pub query_name: String,
    pub query_args: Option<Vec<u8>>,
}

impl ProxyMessage for WorkflowQueryRequest {
    const TYPE: MessageType = MessageType::WorkflowQueryRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_string(keys::DOMAIN, self.domain.as_deref());
        write_execution(envelope, &self.execution);
        envelope.set_string(QUERY_NAME, Some(&self.query_name));
        envelope.set_bytes(QUERY_ARGS, self.query_args.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            domain: envelope.get_string(keys::DOMAIN),
            execution: read_execution(envelope),
            query_name: envelope.get_string(QUERY_NAME).unwrap_or_default(),
            query_args: envelope.get_bytes(QUERY_ARGS)?,
        })
    }
}

impl_request!(WorkflowQueryRequest => WorkflowQueryReply);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowQueryReply {
    pub request_id: i64,
    pub error: Option<ApplicationError>,
    pub result: Option<Vec<u8>>,
}

impl ProxyMessage for WorkflowQueryReply {
    const TYPE: MessageType = MessageType::WorkflowQueryReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_bytes(keys::RESULT, self.result.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            error: read_error(envelope)?,
            result: envelope.get_bytes(keys::RESULT)?,
        })
    }
}

impl_reply!(WorkflowQueryReply);

/// Run a query handler inside a running workflow's code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowQueryInvokeRequest {
    pub request_id: i64,
    pub context_id: i64,
    pub query_name: String,
    pub query_args: Option<Vec<u8>>,
}

impl ProxyMessage for WorkflowQueryInvokeRequest {
    const TYPE: MessageType = MessageType::WorkflowQueryInvokeRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_string(QUERY_NAME, Some(&self.query_name));
        envelope.set_bytes(QUERY_ARGS, self.query_args.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            query_name: envelope.get_string(QUERY_NAME).unwrap_or_default(),
            query_args: envelope.get_bytes(QUERY_ARGS)?,
        })
    }
}

impl_request!(WorkflowQueryInvokeRequest => WorkflowQueryInvokeReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowQueryInvokeReply {
    pub request_id: i64,
    pub context_id: i64,
    pub error: Option<ApplicationError>,
    pub result: Option<Vec<u8>>,
}

impl ProxyMessage for WorkflowQueryInvokeReply {
    const TYPE: MessageType = MessageType::WorkflowQueryInvokeReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_bytes(keys::RESULT, self.result.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            error: read_error(envelope)?,
            result: envelope.get_bytes(keys::RESULT)?,
        })
    }
}

impl_reply!(WorkflowQueryInvokeReply);

/// Tell the client a workflow context is gone (evicted from the engine cache)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDisconnectContextRequest {
    pub request_id: i64,
    pub context_id: i64,
}

impl ProxyMessage for WorkflowDisconnectContextRequest {
    const TYPE: MessageType = MessageType::WorkflowDisconnectContextRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
        })
    }
}

impl_request!(WorkflowDisconnectContextRequest => WorkflowDisconnectContextReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDisconnectContextReply {
    pub request_id: i64,
    pub context_id: i64,
    pub error: Option<ApplicationError>,
}

impl ProxyMessage for WorkflowDisconnectContextReply {
    const TYPE: MessageType = MessageType::WorkflowDisconnectContextReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            error: read_error(envelope)?,
        })
    }
}

impl_reply!(WorkflowDisconnectContextReply);

/// Start a child workflow from inside a running workflow and wait for it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowExecuteChildRequest {
    pub request_id: i64,
    pub context_id: i64,
    pub workflow: String,
    pub args: Option<Vec<u8>>,
    pub options: Option<ChildWorkflowOptions>,
}

impl ProxyMessage for WorkflowExecuteChildRequest {
    const TYPE: MessageType = MessageType::WorkflowExecuteChildRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_string("Workflow", Some(&self.workflow));
        envelope.set_bytes(keys::ARGS, self.args.as_deref());
        envelope.set_json(keys::OPTIONS, self.options.as_ref())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            workflow: envelope.get_string("Workflow").unwrap_or_default(),
            args: envelope.get_bytes(keys::ARGS)?,
            options: envelope.get_json(keys::OPTIONS)?,
        })
    }
}

impl_request!(WorkflowExecuteChildRequest => WorkflowExecuteChildReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowExecuteChildReply {
    pub request_id: i64,
    pub context_id: i64,
    pub error: Option<ApplicationError>,
    pub result: Option<Vec<u8>>,
}

impl ProxyMessage for WorkflowExecuteChildReply {
    const TYPE: MessageType = MessageType::WorkflowExecuteChildReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_bytes(keys::RESULT, self.result.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            error: read_error(envelope)?,
            result: envelope.get_bytes(keys::RESULT)?,
        })
    }
}

impl_reply!(WorkflowExecuteChildReply);

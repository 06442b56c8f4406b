//! Activity-domain messages

use super::keys;
use super::{read_error, read_request_id, write_reply_header, write_request_header};
use super::{MessageType, ProxyMessage};
use crate::application::ApplicationError;
use crate::envelope::Envelope;
use crate::error::CoreResult;
use crate::execution::{ActivityInfo, ActivityOptions};

const ACTIVITY: &str = "Activity";

/// Register an activity type with the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityRegisterRequest {
    pub request_id: i64,
    pub name: String,
}

impl ProxyMessage for ActivityRegisterRequest {
    const TYPE: MessageType = MessageType::ActivityRegisterRequest;

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

impl_request!(ActivityRegisterRequest => ActivityRegisterReply);
ack_reply!(ActivityRegisterReply);

/// Schedule an activity from inside a workflow and wait for its result.
///
/// `context_id` names the calling workflow's context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityExecuteRequest {
    pub request_id: i64,
    pub context_id: i64,
    pub activity: String,
    pub args: Option<Vec<u8>>,
    pub options: Option<ActivityOptions>,
}

impl ProxyMessage for ActivityExecuteRequest {
    const TYPE: MessageType = MessageType::ActivityExecuteRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_string(ACTIVITY, Some(&self.activity));
        envelope.set_bytes(keys::ARGS, self.args.as_deref());
        envelope.set_json(keys::OPTIONS, self.options.as_ref())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            activity: envelope.get_string(ACTIVITY).unwrap_or_default(),
            args: envelope.get_bytes(keys::ARGS)?,
            options: envelope.get_json(keys::OPTIONS)?,
        })
    }
}

impl_request!(ActivityExecuteRequest => ActivityExecuteReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityExecuteReply {
    pub request_id: i64,
    pub error: Option<ApplicationError>,
    pub result: Option<Vec<u8>>,
}

impl ProxyMessage for ActivityExecuteReply {
    const TYPE: MessageType = MessageType::ActivityExecuteReply;

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

impl_reply!(ActivityExecuteReply);

/// Run an activity's code in the client for one engine task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityInvokeRequest {
    pub request_id: i64,
    pub context_id: i64,
    pub activity: String,
    pub args: Option<Vec<u8>>,
    pub info: Option<ActivityInfo>,
}

impl ProxyMessage for ActivityInvokeRequest {
    const TYPE: MessageType = MessageType::ActivityInvokeRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_string(ACTIVITY, Some(&self.activity));
        envelope.set_bytes(keys::ARGS, self.args.as_deref());
        envelope.set_json("Info", self.info.as_ref())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            activity: envelope.get_string(ACTIVITY).unwrap_or_default(),
            args: envelope.get_bytes(keys::ARGS)?,
            info: envelope.get_json("Info")?,
        })
    }
}

impl_request!(ActivityInvokeRequest => ActivityInvokeReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityInvokeReply {
    pub request_id: i64,
    pub context_id: i64,
    pub error: Option<ApplicationError>,
    pub result: Option<Vec<u8>>,
}

impl ProxyMessage for ActivityInvokeReply {
    const TYPE: MessageType = MessageType::ActivityInvokeReply;

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

impl_reply!(ActivityInvokeReply);

/// Run a local activity's code in the client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityInvokeLocalRequest {
    pub request_id: i64,
    pub context_id: i64,
    pub activity: String,
    pub args: Option<Vec<u8>>,
}

impl ProxyMessage for ActivityInvokeLocalRequest {
    const TYPE: MessageType = MessageType::ActivityInvokeLocalRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_string(ACTIVITY, Some(&self.activity));
        envelope.set_bytes(keys::ARGS, self.args.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            activity: envelope.get_string(ACTIVITY).unwrap_or_default(),
            args: envelope.get_bytes(keys::ARGS)?,
        })
    }
}

impl_request!(ActivityInvokeLocalRequest => ActivityInvokeLocalReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityInvokeLocalReply {
    pub request_id: i64,
    pub context_id: i64,
    pub error: Option<ApplicationError>,
    pub result: Option<Vec<u8>>,
}

impl ProxyMessage for ActivityInvokeLocalReply {
    const TYPE: MessageType = MessageType::ActivityInvokeLocalReply;

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

impl_reply!(ActivityInvokeLocalReply);

/// Record a heartbeat for the activity running in `context_id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityRecordHeartbeatRequest {
    pub request_id: i64,
    pub context_id: i64,
    pub details: Option<Vec<u8>>,
}

impl ProxyMessage for ActivityRecordHeartbeatRequest {
    const TYPE: MessageType = MessageType::ActivityRecordHeartbeatRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_bytes(keys::DETAILS, self.details.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            details: envelope.get_bytes(keys::DETAILS)?,
        })
    }
}

impl_request!(ActivityRecordHeartbeatRequest => ActivityRecordHeartbeatReply, context);
ack_reply!(ActivityRecordHeartbeatReply);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityHasHeartbeatDetailsRequest {
    pub request_id: i64,
    pub context_id: i64,
}

impl ProxyMessage for ActivityHasHeartbeatDetailsRequest {
    const TYPE: MessageType = MessageType::ActivityHasHeartbeatDetailsRequest;

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

impl_request!(ActivityHasHeartbeatDetailsRequest => ActivityHasHeartbeatDetailsReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityHasHeartbeatDetailsReply {
    pub request_id: i64,
    pub error: Option<ApplicationError>,
    pub has_details: bool,
}

impl ProxyMessage for ActivityHasHeartbeatDetailsReply {
    const TYPE: MessageType = MessageType::ActivityHasHeartbeatDetailsReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_bool("HasDetails", self.has_details);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            error: read_error(envelope)?,
            has_details: envelope.get_bool("HasDetails")?,
        })
    }
}

impl_reply!(ActivityHasHeartbeatDetailsReply);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityGetHeartbeatDetailsRequest {
    pub request_id: i64,
    pub context_id: i64,
}

impl ProxyMessage for ActivityGetHeartbeatDetailsRequest {
    const TYPE: MessageType = MessageType::ActivityGetHeartbeatDetailsRequest;

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

impl_request!(ActivityGetHeartbeatDetailsRequest => ActivityGetHeartbeatDetailsReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityGetHeartbeatDetailsReply {
    pub request_id: i64,
    pub error: Option<ApplicationError>,
    pub details: Option<Vec<u8>>,
}

impl ProxyMessage for ActivityGetHeartbeatDetailsReply {
    const TYPE: MessageType = MessageType::ActivityGetHeartbeatDetailsReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_bytes(keys::DETAILS, self.details.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            error: read_error(envelope)?,
            details: envelope.get_bytes(keys::DETAILS)?,
        })
    }
}

impl_reply!(ActivityGetHeartbeatDetailsReply);

/// Tell the client an activity is being cancelled or its worker is stopping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityStoppingRequest {
    pub request_id: i64,
    pub context_id: i64,
    pub activity_id: Option<String>,
}

impl ProxyMessage for ActivityStoppingRequest {
    const TYPE: MessageType = MessageType::ActivityStoppingRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64(keys::CONTEXT_ID, self.context_id);
        envelope.set_string("ActivityId", self.activity_id.as_deref());
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            context_id: envelope.get_i64(keys::CONTEXT_ID)?,
            activity_id: envelope.get_string("ActivityId"),
        })
    }
}

impl_request!(ActivityStoppingRequest => ActivityStoppingReply, context);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityStoppingReply {
    pub request_id: i64,
    pub context_id: i64,
    pub error: Option<ApplicationError>,
}

impl ProxyMessage for ActivityStoppingReply {
    const TYPE: MessageType = MessageType::ActivityStoppingReply;

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

impl_reply!(ActivityStoppingReply);

/// Complete an activity out of band, identified by its task token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityCompleteRequest {
    pub request_id: i64,
    pub task_token: Vec<u8>,
    pub result: Option<Vec<u8>>,
    pub error: Option<ApplicationError>,
}

impl ProxyMessage for ActivityCompleteRequest {
    const TYPE: MessageType = MessageType::ActivityCompleteRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_bytes(keys::TASK_TOKEN, Some(&self.task_token));
        envelope.set_bytes(keys::RESULT, self.result.as_deref());
        envelope.set_json(keys::ERROR, self.error.as_ref())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            task_token: envelope.get_bytes(keys::TASK_TOKEN)?.unwrap_or_default(),
            result: envelope.get_bytes(keys::RESULT)?,
            error: read_error(envelope)?,
        })
    }
}

impl_request!(ActivityCompleteRequest => ActivityCompleteReply);
ack_reply!(ActivityCompleteReply);

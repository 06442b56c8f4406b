//! Typed message catalogue
//!
//! One struct per wire message, grouped by protocol domain. Every struct
//! implements [`ProxyMessage`] for conversion to and from an [`Envelope`];
//! requests additionally implement [`ProxyRequest`] and replies
//! [`ProxyReply`]. [`Message`] is the tagged union selected by the envelope's
//! type discriminator.

#[macro_use]
mod macros;

mod activity;
mod client;
mod types;
mod workflow;

pub use activity::*;
pub use client::*;
pub use types::{MessageDomain, MessageType};
pub use workflow::*;

use crate::application::ApplicationError;
use crate::envelope::Envelope;
use crate::error::{CoreError, CoreResult};

/// Property keys shared by many messages
pub mod keys {
    pub const REQUEST_ID: &str = "RequestId";
    pub const CONTEXT_ID: &str = "ContextId";
    pub const ERROR: &str = "Error";
    pub const RESULT: &str = "Result";
    pub const ARGS: &str = "Args";
    pub const NAME: &str = "Name";
    pub const DOMAIN: &str = "Domain";
    pub const OPTIONS: &str = "Options";
    pub const TASK_TOKEN: &str = "TaskToken";
    pub const DETAILS: &str = "Details";
}

/// Conversion between a typed message and its envelope
pub trait ProxyMessage: Sized {
    const TYPE: MessageType;

    /// Write this message's fields into `envelope`
    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()>;

    /// Read this message's fields from `envelope`
    fn read_fields(envelope: &Envelope) -> CoreResult<Self>;

    fn to_envelope(&self) -> CoreResult<Envelope> {
        let mut envelope = Envelope::new(Self::TYPE);
        self.write_fields(&mut envelope)?;
        Ok(envelope)
    }

    fn from_envelope(envelope: &Envelope) -> CoreResult<Self> {
        let actual = envelope.message_type()?;
        if actual != Self::TYPE {
            return Err(CoreError::TypeMismatch {
                expected: Self::TYPE,
                actual,
            });
        }
        Self::read_fields(envelope)
    }
}

/// A message that expects a reply
pub trait ProxyRequest: ProxyMessage {
    type Reply: ProxyReply;

    fn request_id(&self) -> i64;

    fn set_request_id(&mut self, request_id: i64);

    /// Execution context this request targets, or 0 when context-free
    fn context_id(&self) -> i64 {
        0
    }
}

/// A message answering a request
pub trait ProxyReply: ProxyMessage {
    fn request_id(&self) -> i64;

    fn error(&self) -> Option<&ApplicationError>;
}

pub(crate) fn write_request_header(envelope: &mut Envelope, request_id: i64) {
    envelope.set_i64(keys::REQUEST_ID, request_id);
}

pub(crate) fn write_reply_header(
    envelope: &mut Envelope,
    request_id: i64,
    error: Option<&ApplicationError>,
) -> CoreResult<()> {
    envelope.set_i64(keys::REQUEST_ID, request_id);
    envelope.set_json(keys::ERROR, error)
}

pub(crate) fn read_request_id(envelope: &Envelope) -> CoreResult<i64> {
    envelope.get_i64(keys::REQUEST_ID)
}

pub(crate) fn read_error(envelope: &Envelope) -> CoreResult<Option<ApplicationError>> {
    envelope.get_json(keys::ERROR)
}

/// Read the correlation id without decoding the full message
pub fn peek_request_id(envelope: &Envelope) -> CoreResult<i64> {
    read_request_id(envelope)
}

macro_rules! message_union {
    ($($variant:ident),+ $(,)?) => {
        /// Every wire message, selected by type discriminator
        #[derive(Debug, Clone, PartialEq)]
        pub enum Message {
            $($variant($variant),)+
        }

        impl Message {
            /// Decode the typed message the envelope's discriminator names
            pub fn from_envelope(envelope: &Envelope) -> CoreResult<Self> {
                let message_type = envelope.message_type()?;
                match message_type {
                    $(MessageType::$variant => {
                        Ok(Self::$variant($variant::read_fields(envelope)?))
                    })+
                    MessageType::Unspecified => {
                        Err(CoreError::UnknownMessageType(envelope.type_code()))
                    }
                }
            }

            pub fn to_envelope(&self) -> CoreResult<Envelope> {
                match self {
                    $(Self::$variant(m) => m.to_envelope(),)+
                }
            }

            pub fn message_type(&self) -> MessageType {
                match self {
                    $(Self::$variant(_) => <$variant as ProxyMessage>::TYPE,)+
                }
            }
        }

        $(
            impl From<$variant> for Message {
                fn from(m: $variant) -> Self {
                    Self::$variant(m)
                }
            }
        )+
    };
}

message_union! {
    InitializeRequest,
    InitializeReply,
    ConnectRequest,
    ConnectReply,
    TerminateRequest,
    TerminateReply,
    DomainRegisterRequest,
    DomainRegisterReply,
    HeartbeatRequest,
    HeartbeatReply,
    NewWorkerRequest,
    NewWorkerReply,
    StopWorkerRequest,
    StopWorkerReply,
    PingRequest,
    PingReply,
    WorkflowRegisterRequest,
    WorkflowRegisterReply,
    WorkflowExecuteRequest,
    WorkflowExecuteReply,
    WorkflowInvokeRequest,
    WorkflowInvokeReply,
    WorkflowSignalRequest,
    WorkflowSignalReply,
    WorkflowSignalInvokeRequest,
    WorkflowSignalInvokeReply,
    WorkflowQueryRequest,
    WorkflowQueryReply,
    WorkflowQueryInvokeRequest,
    WorkflowQueryInvokeReply,
    WorkflowDisconnectContextRequest,
    WorkflowDisconnectContextReply,
    WorkflowExecuteChildRequest,
    WorkflowExecuteChildReply,
    ActivityRegisterRequest,
    ActivityRegisterReply,
    ActivityExecuteRequest,
    ActivityExecuteReply,
    ActivityInvokeRequest,
    ActivityInvokeReply,
    ActivityInvokeLocalRequest,
    ActivityInvokeLocalReply,
    ActivityRecordHeartbeatRequest,
    ActivityRecordHeartbeatReply,
    ActivityHasHeartbeatDetailsRequest,
    ActivityHasHeartbeatDetailsReply,
    ActivityGetHeartbeatDetailsRequest,
    ActivityGetHeartbeatDetailsReply,
    ActivityStoppingRequest,
    ActivityStoppingReply,
    ActivityCompleteRequest,
    ActivityCompleteReply,
}

impl Message {
    /// Decode a raw frame straight into a typed message
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        Self::from_envelope(&Envelope::decode(bytes)?)
    }

    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        Ok(self.to_envelope()?.encode())
    }
}

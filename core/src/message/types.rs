//! Message type registry
//!
//! Every message on the wire carries an `i32` discriminator. Requests use odd
//! codes and the matching reply is always the next even code, so the pairing
//! can be computed rather than looked up.

use crate::error::{CoreError, CoreResult};

/// Which part of the protocol a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageDomain {
    /// Connection, domain and worker management
    Client,
    /// Workflow execution, signals and queries
    Workflow,
    /// Activity execution and heartbeating
    Activity,
}

/// Numeric message type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum MessageType {
    /// Never valid on the wire
    Unspecified = 0,

    // client domain
    InitializeRequest = 1,
    InitializeReply = 2,
    ConnectRequest = 3,
    ConnectReply = 4,
    TerminateRequest = 5,
    TerminateReply = 6,
    DomainRegisterRequest = 7,
    DomainRegisterReply = 8,
    HeartbeatRequest = 9,
    HeartbeatReply = 10,
    NewWorkerRequest = 11,
    NewWorkerReply = 12,
    StopWorkerRequest = 13,
    StopWorkerReply = 14,
    PingRequest = 15,
    PingReply = 16,

    // workflow domain
    WorkflowRegisterRequest = 101,
    WorkflowRegisterReply = 102,
    WorkflowExecuteRequest = 103,
    WorkflowExecuteReply = 104,
    WorkflowInvokeRequest = 105,
    WorkflowInvokeReply = 106,
    WorkflowSignalRequest = 107,
    WorkflowSignalReply = 108,
    WorkflowSignalInvokeRequest = 109,
    WorkflowSignalInvokeReply = 110,
    WorkflowQueryRequest = 111,
    WorkflowQueryReply = 112,
    WorkflowQueryInvokeRequest = 113,
    WorkflowQueryInvokeReply = 114,
    WorkflowDisconnectContextRequest = 115,
    WorkflowDisconnectContextReply = 116,
    WorkflowExecuteChildRequest = 117,
    WorkflowExecuteChildReply = 118,

    // activity domain
    ActivityRegisterRequest = 201,
    ActivityRegisterReply = 202,
    ActivityExecuteRequest = 203,
    ActivityExecuteReply = 204,
    ActivityInvokeRequest = 205,
    ActivityInvokeReply = 206,
    ActivityInvokeLocalRequest = 207,
    ActivityInvokeLocalReply = 208,
    ActivityRecordHeartbeatRequest = 209,
    ActivityRecordHeartbeatReply = 210,
    ActivityHasHeartbeatDetailsRequest = 211,
    ActivityHasHeartbeatDetailsReply = 212,
    ActivityGetHeartbeatDetailsRequest = 213,
    ActivityGetHeartbeatDetailsReply = 214,
    ActivityStoppingRequest = 215,
    ActivityStoppingReply = 216,
    ActivityCompleteRequest = 217,
    ActivityCompleteReply = 218,
}

impl MessageType {
    /// Every valid wire type, in code order
    pub const ALL: [MessageType; 52] = [
        Self::InitializeRequest,
        Self::InitializeReply,
        Self::ConnectRequest,
        Self::ConnectReply,
        Self::TerminateRequest,
        Self::TerminateReply,
        Self::DomainRegisterRequest,
        Self::DomainRegisterReply,
        Self::HeartbeatRequest,
        Self::HeartbeatReply,
        Self::NewWorkerRequest,
        Self::NewWorkerReply,
        Self::StopWorkerRequest,
        Self::StopWorkerReply,
        Self::PingRequest,
        Self::PingReply,
        Self::WorkflowRegisterRequest,
        Self::WorkflowRegisterReply,
        Self::WorkflowExecuteRequest,
        Self::WorkflowExecuteReply,
        Self::WorkflowInvokeRequest,
        Self::WorkflowInvokeReply,
        Self::WorkflowSignalRequest,
        Self::WorkflowSignalReply,
        Self::WorkflowSignalInvokeRequest,
        Self::WorkflowSignalInvokeReply,
        Self::WorkflowQueryRequest,
        Self::WorkflowQueryReply,
        Self::WorkflowQueryInvokeRequest,
        Self::WorkflowQueryInvokeReply,
        Self::WorkflowDisconnectContextRequest,
        Self::WorkflowDisconnectContextReply,
        Self::WorkflowExecuteChildRequest,
        Self::WorkflowExecuteChildReply,
        Self::ActivityRegisterRequest,
        Self::ActivityRegisterReply,
        Self::ActivityExecuteRequest,
        Self::ActivityExecuteReply,
        Self::ActivityInvokeRequest,
        Self::ActivityInvokeReply,
        Self::ActivityInvokeLocalRequest,
        Self::ActivityInvokeLocalReply,
        Self::ActivityRecordHeartbeatRequest,
        Self::ActivityRecordHeartbeatReply,
        Self::ActivityHasHeartbeatDetailsRequest,
        Self::ActivityHasHeartbeatDetailsReply,
        Self::ActivityGetHeartbeatDetailsRequest,
        Self::ActivityGetHeartbeatDetailsReply,
        Self::ActivityStoppingRequest,
        Self::ActivityStoppingReply,
        Self::ActivityCompleteRequest,
        Self::ActivityCompleteReply,
    ];

    /// Wire code of this type
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Resolve a wire code. `Unspecified` and unassigned codes are errors.
    pub fn from_code(code: i32) -> CoreResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or(CoreError::UnknownMessageType(code))
    }

    pub fn is_request(self) -> bool {
        self != Self::Unspecified && self.code() % 2 == 1
    }

    pub fn is_reply(self) -> bool {
        self != Self::Unspecified && self.code() % 2 == 0
    }

    /// The reply type answering this request
    pub fn reply_type(self) -> Option<Self> {
        if !self.is_request() {
            return None;
        }
        Self::from_code(self.code() + 1).ok()
    }

    /// The request type this reply answers
    pub fn request_type(self) -> Option<Self> {
        if !self.is_reply() {
            return None;
        }
        Self::from_code(self.code() - 1).ok()
    }

    pub fn domain(self) -> Option<MessageDomain> {
        match self.code() {
            1..=99 => Some(MessageDomain::Client),
            100..=199 => Some(MessageDomain::Workflow),
            200..=299 => Some(MessageDomain::Activity),
            _ => None,
        }
    }
}

impl TryFrom<i32> for MessageType {
    type Error = CoreError;

    fn try_from(code: i32) -> CoreResult<Self> {
        Self::from_code(code)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

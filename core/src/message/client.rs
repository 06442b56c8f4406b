//! Client-domain messages: connection, domains and workers

use std::time::Duration;

use super::keys;
use super::{read_error, read_request_id, write_reply_header, write_request_header};
use super::{MessageType, ProxyMessage};
use crate::application::ApplicationError;
use crate::envelope::Envelope;
use crate::error::CoreResult;
use crate::execution::WorkerOptions;

/// First message from the client: tells the bridge where the client listens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitializeRequest {
    pub request_id: i64,
    pub library_address: Option<String>,
    pub library_port: i32,
}

impl ProxyMessage for InitializeRequest {
    const TYPE: MessageType = MessageType::InitializeRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_string("LibraryAddress", self.library_address.as_deref());
        envelope.set_i32("LibraryPort", self.library_port);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            library_address: envelope.get_string("LibraryAddress"),
            library_port: envelope.get_i32("LibraryPort")?,
        })
    }
}

impl_request!(InitializeRequest => InitializeReply);
ack_reply!(InitializeReply);

/// Connect the bridge to the orchestration engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectRequest {
    pub request_id: i64,
    /// Comma separated `host:port` list
    pub endpoints: Option<String>,
    pub identity: Option<String>,
    pub client_timeout: Option<Duration>,
    /// Default domain for subsequent requests
    pub domain: Option<String>,
    pub create_domain: bool,
}

impl ProxyMessage for ConnectRequest {
    const TYPE: MessageType = MessageType::ConnectRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_string("Endpoints", self.endpoints.as_deref());
        envelope.set_string("Identity", self.identity.as_deref());
        envelope.set_duration("ClientTimeout", self.client_timeout);
        envelope.set_string(keys::DOMAIN, self.domain.as_deref());
        envelope.set_bool("CreateDomain", self.create_domain);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            endpoints: envelope.get_string("Endpoints"),
            identity: envelope.get_string("Identity"),
            client_timeout: envelope.get_duration("ClientTimeout")?,
            domain: envelope.get_string(keys::DOMAIN),
            create_domain: envelope.get_bool("CreateDomain")?,
        })
    }
}

impl_request!(ConnectRequest => ConnectReply);
ack_reply!(ConnectReply);

/// Ask the bridge to shut down
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerminateRequest {
    pub request_id: i64,
}

impl ProxyMessage for TerminateRequest {
    const TYPE: MessageType = MessageType::TerminateRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
        })
    }
}

impl_request!(TerminateRequest => TerminateReply);
ack_reply!(TerminateReply);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainRegisterRequest {
    pub request_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_email: Option<String>,
    pub emit_metrics: bool,
    pub retention_days: i32,
}

impl ProxyMessage for DomainRegisterRequest {
    const TYPE: MessageType = MessageType::DomainRegisterRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_string(keys::NAME, self.name.as_deref());
        envelope.set_string("Description", self.description.as_deref());
        envelope.set_string("OwnerEmail", self.owner_email.as_deref());
        envelope.set_bool("EmitMetrics", self.emit_metrics);
        envelope.set_i32("RetentionDays", self.retention_days);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            name: envelope.get_string(keys::NAME),
            description: envelope.get_string("Description"),
            owner_email: envelope.get_string("OwnerEmail"),
            emit_metrics: envelope.get_bool("EmitMetrics")?,
            retention_days: envelope.get_i32("RetentionDays")?,
        })
    }
}

impl_request!(DomainRegisterRequest => DomainRegisterReply);
ack_reply!(DomainRegisterReply);

/// Liveness check from the client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeartbeatRequest {
    pub request_id: i64,
}

impl ProxyMessage for HeartbeatRequest {
    const TYPE: MessageType = MessageType::HeartbeatRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
        })
    }
}

impl_request!(HeartbeatRequest => HeartbeatReply);
ack_reply!(HeartbeatReply);

/// Start a worker polling a task list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewWorkerRequest {
    pub request_id: i64,
    pub domain: Option<String>,
    pub task_list: Option<String>,
    pub options: Option<WorkerOptions>,
}

impl ProxyMessage for NewWorkerRequest {
    const TYPE: MessageType = MessageType::NewWorkerRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_string(keys::DOMAIN, self.domain.as_deref());
        envelope.set_string("TaskList", self.task_list.as_deref());
        envelope.set_json(keys::OPTIONS, self.options.as_ref())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            domain: envelope.get_string(keys::DOMAIN),
            task_list: envelope.get_string("TaskList"),
            options: envelope.get_json(keys::OPTIONS)?,
        })
    }
}

impl_request!(NewWorkerRequest => NewWorkerReply);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewWorkerReply {
    pub request_id: i64,
    pub error: Option<ApplicationError>,
    /// Bridge-assigned handle used by `StopWorkerRequest`
    pub worker_id: i64,
}

impl ProxyMessage for NewWorkerReply {
    const TYPE: MessageType = MessageType::NewWorkerReply;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_reply_header(envelope, self.request_id, self.error.as_ref())?;
        envelope.set_i64("WorkerId", self.worker_id);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            error: read_error(envelope)?,
            worker_id: envelope.get_i64("WorkerId")?,
        })
    }
}

impl_reply!(NewWorkerReply);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopWorkerRequest {
    pub request_id: i64,
    pub worker_id: i64,
}

impl ProxyMessage for StopWorkerRequest {
    const TYPE: MessageType = MessageType::StopWorkerRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        envelope.set_i64("WorkerId", self.worker_id);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
            worker_id: envelope.get_i64("WorkerId")?,
        })
    }
}

impl_request!(StopWorkerRequest => StopWorkerReply);
ack_reply!(StopWorkerReply);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PingRequest {
    pub request_id: i64,
}

impl ProxyMessage for PingRequest {
    const TYPE: MessageType = MessageType::PingRequest;

    fn write_fields(&self, envelope: &mut Envelope) -> CoreResult<()> {
        write_request_header(envelope, self.request_id);
        Ok(())
    }

    fn read_fields(envelope: &Envelope) -> CoreResult<Self> {
        Ok(Self {
            request_id: read_request_id(envelope)?,
        })
    }
}

impl_request!(PingRequest => PingReply);
ack_reply!(PingReply);

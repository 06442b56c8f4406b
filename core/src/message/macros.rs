//! Trait boilerplate shared by the message structs

/// Plain acknowledgement reply carrying only the request id and an error
macro_rules! ack_reply {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            pub request_id: i64,
            pub error: Option<$crate::application::ApplicationError>,
        }

        impl $crate::message::ProxyMessage for $name {
            const TYPE: $crate::message::MessageType = $crate::message::MessageType::$name;

            fn write_fields(
                &self,
                envelope: &mut $crate::envelope::Envelope,
            ) -> $crate::error::CoreResult<()> {
                $crate::message::write_reply_header(envelope, self.request_id, self.error.as_ref())
            }

            fn read_fields(
                envelope: &$crate::envelope::Envelope,
            ) -> $crate::error::CoreResult<Self> {
                Ok(Self {
                    request_id: $crate::message::read_request_id(envelope)?,
                    error: $crate::message::read_error(envelope)?,
                })
            }
        }

        impl_reply!($name);
    };
}

/// `ProxyReply` for a struct with `request_id` and `error` fields
macro_rules! impl_reply {
    ($name:ident) => {
        impl $crate::message::ProxyReply for $name {
            fn request_id(&self) -> i64 {
                self.request_id
            }

            fn error(&self) -> Option<&$crate::application::ApplicationError> {
                self.error.as_ref()
            }
        }
    };
}

/// `ProxyRequest` for a struct with a `request_id` field, and optionally a
/// `context_id` field
macro_rules! impl_request {
    ($name:ident => $reply:ident) => {
        impl $crate::message::ProxyRequest for $name {
            type Reply = $reply;

            fn request_id(&self) -> i64 {
                self.request_id
            }

            fn set_request_id(&mut self, request_id: i64) {
                self.request_id = request_id;
            }
        }
    };
    ($name:ident => $reply:ident, context) => {
        impl $crate::message::ProxyRequest for $name {
            type Reply = $reply;

            fn request_id(&self) -> i64 {
                self.request_id
            }

            fn set_request_id(&mut self, request_id: i64) {
                self.request_id = request_id;
            }

            fn context_id(&self) -> i64 {
                self.context_id
            }
        }
    };
}

//! Property-based tests for the envelope codec
//!
//! Decoding an encoded envelope yields the same envelope, including properties
//! no message variant knows about, and a message decoded from an envelope
//! keeps its correlation ids.

use bridge_sdk::bridge_core::message::{WorkflowInvokeReply, WorkflowQueryInvokeRequest};
use bridge_sdk::prelude::*;
use proptest::prelude::*;

fn arb_envelope() -> impl Strategy<Value = Envelope> {
    (
        prop::sample::select(MessageType::ALL.to_vec()),
        prop::collection::btree_map("[A-Za-z]{1,12}", ".{0,24}", 0..8),
        prop::collection::vec(prop::option::of(prop::collection::vec(any::<u8>(), 0..32)), 0..4),
    )
        .prop_map(|(message_type, properties, attachments)| {
            let mut envelope = Envelope::new(message_type);
            for (key, value) in properties {
                envelope.set_property(key, value);
            }
            for attachment in attachments {
                envelope.push_attachment(attachment);
            }
            envelope
        })
}

proptest! {
    #[test]
    fn prop_envelope_survives_encoding(envelope in arb_envelope()) {
        let decoded = Envelope::decode(&envelope.encode()).unwrap();
        prop_assert_eq!(decoded, envelope);
    }

    #[test]
    fn prop_truncated_frames_are_rejected(envelope in arb_envelope(), cut in 1usize..16) {
        let frame = envelope.encode();
        prop_assume!(cut <= frame.len());
        let truncated = &frame[..frame.len() - cut];
        prop_assert!(Envelope::decode(truncated).is_err());
    }

    #[test]
    fn prop_unknown_properties_are_preserved(
        request_id in 1i64..i64::MAX,
        context_id in 1i64..i64::MAX,
        extra in "[a-z]{1,16}",
    ) {
        let request = WorkflowQueryInvokeRequest {
            request_id,
            context_id,
            query_name: "status".to_string(),
            query_args: None,
        };
        let mut envelope = request.to_envelope().unwrap();
        envelope.set_property("XFutureField", extra.clone());

        let decoded = Envelope::decode(&envelope.encode()).unwrap();
        prop_assert_eq!(decoded.property("XFutureField"), Some(extra.as_str()));

        match Message::from_envelope(&decoded).unwrap() {
            Message::WorkflowQueryInvokeRequest(parsed) => {
                prop_assert_eq!(parsed.request_id, request_id);
                prop_assert_eq!(parsed.context_id, context_id);
            }
            other => prop_assert!(false, "decoded as {:?}", other.message_type()),
        }
    }

    #[test]
    fn prop_reply_error_survives_encoding(message in ".{0,40}", request_id in 1i64..1_000_000) {
        let reply = WorkflowInvokeReply {
            request_id,
            context_id: 1,
            error: Some(ApplicationError::custom(message.clone())),
            ..Default::default()
        };
        let frame = reply.to_envelope().unwrap().encode();
        let decoded = WorkflowInvokeReply::from_envelope(&Envelope::decode(&frame).unwrap()).unwrap();
        prop_assert_eq!(decoded.error.map(|e| e.message), Some(message));
    }
}

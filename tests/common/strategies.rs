//! proptest strategies for inbound messages.

use order_svc::messaging::InboundMessage;
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

use super::builders::{CREATED_TOPIC, STATUS_TOPIC};

pub fn topic_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(CREATED_TOPIC.to_string()),
        Just(STATUS_TOPIC.to_string()),
        "[a-z.]{1,20}",
    ]
}

/// Arbitrary bytes, arbitrary JSON-ish text, or near-valid payloads
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        vec(any::<u8>(), 0..128),
        ".{0,64}".prop_map(String::into_bytes),
        btree_map("[a-z0-9_]{1,8}", 0u32..20, 0..5).prop_map(|items| {
            serde_json::json!({ "items": items }).to_string().into_bytes()
        }),
        "[a-z0-9-]{0,40}".prop_map(|id| {
            serde_json::json!({ "id": id, "status": "confirmed" })
                .to_string()
                .into_bytes()
        }),
    ]
}

pub fn inbound_message_strategy() -> impl Strategy<Value = InboundMessage> {
    (
        topic_strategy(),
        proptest::option::of(vec(any::<u8>(), 0..16)),
        payload_strategy(),
        0i32..16,
        0i64..1_000_000,
    )
        .prop_map(|(topic, key, value, partition, offset)| {
            let message = InboundMessage::new(topic, value).with_position(partition, offset);
            match key {
                Some(key) => message.with_key(key),
                None => message,
            }
        })
}

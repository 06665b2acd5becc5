//! WAMP 1.0 framing used by the client API WebSocket.
//!
//! The socket speaks a small subset of WAMP 1.0. After the upgrade the client
//! sends a subscribe frame for `OnJsonApiEvent`, after which the server pushes
//! every JSON API change as an event frame:
//!
//! ```text
//! -> [5, "OnJsonApiEvent"]
//! <- [8, "OnJsonApiEvent", {"uri": "/lol-gameflow/v1/gameflow-phase", "eventType": "Update", "data": "Lobby"}]
//! ```
//!
//! Anything else (welcome frames, empty keepalive texts, other topics) is
//! surfaced as [`WampFrame::Other`] and ignored by the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Topic carrying every JSON API change.
pub const JSON_API_EVENT_TOPIC: &str = "OnJsonApiEvent";

/// WAMP opcode for subscribe.
pub const OPCODE_SUBSCRIBE: u8 = 5;

/// WAMP opcode for unsubscribe.
pub const OPCODE_UNSUBSCRIBE: u8 = 6;

/// WAMP opcode for a pushed event.
pub const OPCODE_EVENT: u8 = 8;

/// Payload of an `OnJsonApiEvent` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
	/// Resource path that changed.
	pub uri: String,
	/// `Create`, `Update` or `Delete`.
	#[serde(default)]
	pub event_type: String,
	/// New resource value (`null` on delete).
	#[serde(default)]
	pub data: Value,
}

/// A decoded inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum WampFrame {
	/// JSON API change event.
	Event(ApiEvent),
	/// Any frame the transport does not act on.
	Other,
}

impl WampFrame {
	/// Decodes a text frame. Never fails: malformed input becomes [`WampFrame::Other`].
	pub fn decode(text: &str) -> Self {
		let text = text.trim();
		if text.is_empty() {
			return Self::Other;
		}

		let Ok(Value::Array(mut items)) = serde_json::from_str::<Value>(text) else {
			return Self::Other;
		};

		if items.len() != 3 || items[0].as_u64() != Some(OPCODE_EVENT as u64) {
			return Self::Other;
		}

		let is_api_topic = items[1]
			.as_str()
			.is_some_and(|topic| topic.starts_with(JSON_API_EVENT_TOPIC));
		if !is_api_topic {
			return Self::Other;
		}

		match serde_json::from_value::<ApiEvent>(items.remove(2)) {
			Ok(event) => Self::Event(event),
			Err(_) => Self::Other,
		}
	}
}

/// Encodes a subscribe frame for `topic`.
pub fn subscribe_frame(topic: &str) -> String {
	Value::Array(vec![OPCODE_SUBSCRIBE.into(), topic.into()]).to_string()
}

/// Encodes an unsubscribe frame for `topic`.
pub fn unsubscribe_frame(topic: &str) -> String {
	Value::Array(vec![OPCODE_UNSUBSCRIBE.into(), topic.into()]).to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_gameflow_event() {
		let text = r#"[8,"OnJsonApiEvent",{"data":"ChampSelect","eventType":"Update","uri":"/lol-gameflow/v1/gameflow-phase"}]"#;
		match WampFrame::decode(text) {
			WampFrame::Event(event) => {
				assert_eq!(event.uri, "/lol-gameflow/v1/gameflow-phase");
				assert_eq!(event.event_type, "Update");
				assert_eq!(event.data, Value::String("ChampSelect".into()));
			}
			other => panic!("Expected event, got {other:?}"),
		}
	}

	#[test]
	fn empty_and_foreign_frames_are_ignored() {
		assert_eq!(WampFrame::decode(""), WampFrame::Other);
		assert_eq!(WampFrame::decode("   "), WampFrame::Other);
		assert_eq!(WampFrame::decode("not json"), WampFrame::Other);
		assert_eq!(WampFrame::decode(r#"[0,"session",1,"server"]"#), WampFrame::Other);
		assert_eq!(WampFrame::decode(r#"[8,"OnServiceProxy",{"uri":"/x"}]"#), WampFrame::Other);
	}

	#[test]
	fn delete_event_without_data_decodes_as_null() {
		let text = r#"[8,"OnJsonApiEvent",{"eventType":"Delete","uri":"/lol-lobby/v2/lobby"}]"#;
		let WampFrame::Event(event) = WampFrame::decode(text) else {
			panic!("Expected event");
		};
		assert_eq!(event.data, Value::Null);
	}

	#[test]
	fn subscribe_frame_matches_wamp_layout() {
		assert_eq!(subscribe_frame(JSON_API_EVENT_TOPIC), r#"[5,"OnJsonApiEvent"]"#);
		assert_eq!(unsubscribe_frame(JSON_API_EVENT_TOPIC), r#"[6,"OnJsonApiEvent"]"#);
	}
}

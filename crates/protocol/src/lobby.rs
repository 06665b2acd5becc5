//! Messages exchanged with the custom-lobby coordination server.
//!
//! Each player holds one WebSocket at `/ws/{puuid}`. The protocol is small:
//!
//! 1. Client connects with its puuid as the path key
//! 2. Client sends [`LobbyClientMessage::Select`] with its owned champions
//! 3. Server pushes `{"uri": "/ChampSelect", "data": {...}}` to every team member
//!    whose assignment changed
//! 4. When a peer disconnects the server broadcasts `{"user": ..., "action": "leave"}`
//!
//! # Main Types
//!
//! - [`LobbyEvent`] - Server frames, routed by `uri`
//! - [`LobbyClientMessage`] - Client frames
//! - [`ChampSelectRequest`] - Payload of a champion pool submission
//! - [`ChampSelectAssignment`] - Payload of a `/ChampSelect` push

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame pushed by the lobby server.
///
/// Routable frames carry a `uri`. Presence broadcasts do not and are kept
/// as raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyEvent {
	/// Frame addressed to a subscription path.
	Routed {
		/// Subscription path, e.g. `/ChampSelect`.
		uri: String,
		/// Frame payload.
		data: Value,
	},
	/// Frame without a `uri` field.
	Unrouted(Value),
}

impl LobbyEvent {
	/// Decodes a text frame, returning `None` for non-JSON input.
	pub fn decode(text: &str) -> Option<Self> {
		let mut value: Value = serde_json::from_str(text).ok()?;
		let uri = value.get("uri").and_then(Value::as_str).map(str::to_owned);
		match uri {
			Some(uri) => {
				let data = value
					.as_object_mut()
					.and_then(|obj| obj.remove("data"))
					.unwrap_or(Value::Null);
				Some(Self::Routed { uri, data })
			}
			None => Some(Self::Unrouted(value)),
		}
	}
}

/// Frame sent from the companion to the lobby server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "datas", rename_all = "snake_case")]
pub enum LobbyClientMessage {
	/// Submit the owned champion pool for a party.
	Select(ChampSelectRequest),
}

/// Champion pool submission for random team assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampSelectRequest {
	/// Party identifier shared by every member of the custom game.
	pub party_id: String,
	/// Team id, `100` or `200`.
	pub my_team: u16,
	/// Champion ids owned by the sender.
	pub my_champs: Vec<u32>,
}

/// `/ChampSelect` payload: the champions assigned to a team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChampSelectAssignment {
	/// Every champion id assigned to the team, sorted.
	#[serde(default)]
	pub team_champs: Vec<u32>,
	/// Per-member assignments keyed by puuid.
	#[serde(default)]
	pub team_members: BTreeMap<String, Vec<u32>>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn select_message_serializes_with_type_tag() {
		let msg = LobbyClientMessage::Select(ChampSelectRequest {
			party_id: "a".into(),
			my_team: 100,
			my_champs: vec![1, 2, 3],
		});
		let json = serde_json::to_value(&msg).unwrap();
		assert_eq!(json["type"], "select");
		assert_eq!(json["datas"]["party_id"], "a");
		assert_eq!(json["datas"]["my_team"], 100);
	}

	#[test]
	fn champ_select_push_is_routed() {
		let text = r#"{"uri":"/ChampSelect","data":{"team_champs":[1,2,3],"team_members":{"p1":[1,2,3]}}}"#;
		let Some(LobbyEvent::Routed { uri, data }) = LobbyEvent::decode(text) else {
			panic!("Expected routed frame");
		};
		assert_eq!(uri, "/ChampSelect");
		let assignment: ChampSelectAssignment = serde_json::from_value(data).unwrap();
		assert_eq!(assignment.team_champs, vec![1, 2, 3]);
		assert_eq!(assignment.team_members["p1"], vec![1, 2, 3]);
	}

	#[test]
	fn leave_broadcast_is_unrouted() {
		let text = r#"{"user":"p2","action":"leave"}"#;
		match LobbyEvent::decode(text) {
			Some(LobbyEvent::Unrouted(value)) => assert_eq!(value["action"], "leave"),
			other => panic!("Expected unrouted frame, got {other:?}"),
		}
		assert!(LobbyEvent::decode("garbage").is_none());
	}
}

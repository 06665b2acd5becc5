//! Events delivered to the UI boundary.
//!
//! The boundary is one-way and best-effort. Every event has a stable channel
//! name so a front end can route it without matching on Rust types.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Connectivity of the client API as presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
	Connecting,
	Connected,
	Disconnected,
}

/// A notification for the UI boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
	/// Connectivity transition of the client API.
	Status(ConnectionStatus),
	/// Game-flow phase pushed by the client API.
	GameflowPhase(Value),
	/// Local lobby state pushed by the client API.
	Lobby(Value),
	/// Champion-select relay pushed by the lobby server.
	LobbyChampSelect(Value),
	/// A transport kept closing and will not be reopened before the next process start.
	/// Carries `{"transport": ..., "repairs": ...}`.
	ReconnectAbandoned(Value),
}

impl UiEvent {
	/// Channel name the front end listens on.
	pub fn channel(&self) -> &'static str {
		match self {
			Self::Status(ConnectionStatus::Connecting) => "connecting",
			Self::Status(ConnectionStatus::Connected) => "connected",
			Self::Status(ConnectionStatus::Disconnected) => "disconnect",
			Self::GameflowPhase(_) => "gameFlowPhase",
			Self::Lobby(_) => "lobby",
			Self::LobbyChampSelect(_) => "lobbyChampSelect",
			Self::ReconnectAbandoned(_) => "reconnectAbandoned",
		}
	}

	/// Payload, `None` for status events.
	pub fn data(&self) -> Option<&Value> {
		match self {
			Self::Status(_) => None,
			Self::GameflowPhase(data)
			| Self::Lobby(data)
			| Self::LobbyChampSelect(data)
			| Self::ReconnectAbandoned(data) => Some(data),
		}
	}

	/// Returns the status if this is a connectivity transition.
	pub fn status(&self) -> Option<ConnectionStatus> {
		match self {
			Self::Status(status) => Some(*status),
			_ => None,
		}
	}
}

/// Serialized as `{"channel": ..., "data": ...}`; `data` is omitted for status events.
impl Serialize for UiEvent {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		use serde::ser::SerializeMap;

		let data = self.data();
		let mut map = serializer.serialize_map(Some(if data.is_some() { 2 } else { 1 }))?;
		map.serialize_entry("channel", self.channel())?;
		if let Some(data) = data {
			map.serialize_entry("data", data)?;
		}
		map.end()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn status_event_has_no_data_field() {
		let json = serde_json::to_value(UiEvent::Status(ConnectionStatus::Disconnected)).unwrap();
		assert_eq!(json, json!({"channel": "disconnect"}));
	}

	#[test]
	fn lobby_and_gameflow_channels_are_distinct() {
		let gameflow = UiEvent::GameflowPhase(json!("ChampSelect"));
		let relay = UiEvent::LobbyChampSelect(json!({"team_champs": [1]}));
		assert_ne!(gameflow.channel(), relay.channel());
		assert_eq!(
			serde_json::to_value(&relay).unwrap(),
			json!({"channel": "lobbyChampSelect", "data": {"team_champs": [1]}})
		);
	}

	#[test]
	fn abandoned_reconnect_carries_transport() {
		let event = UiEvent::ReconnectAbandoned(json!({"transport": "lobby", "repairs": 5}));
		assert_eq!(event.status(), None);
		assert_eq!(
			serde_json::to_value(&event).unwrap(),
			json!({"channel": "reconnectAbandoned", "data": {"transport": "lobby", "repairs": 5}})
		);
	}
}

//! Identity returned by `/lol-summoner/v1/current-summoner`.

use serde::{Deserialize, Serialize};

/// The logged-in player. Only the fields the core reads are typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
	/// Stable player identity, used to key the lobby socket.
	pub puuid: String,
	#[serde(default)]
	pub summoner_id: u64,
	#[serde(default)]
	pub game_name: String,
	#[serde(default)]
	pub tag_line: String,
	#[serde(default)]
	pub display_name: String,
	#[serde(default)]
	pub summoner_level: u32,
}

impl Summoner {
	/// Riot id (`name#tag`), falling back to the legacy display name.
	pub fn riot_id(&self) -> String {
		if self.game_name.is_empty() {
			self.display_name.clone()
		} else {
			format!("{}#{}", self.game_name, self.tag_line)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_partial_payload() {
		let json = r#"{"puuid":"abc-123","gameName":"Foo","tagLine":"EUW","accountId":42}"#;
		let summoner: Summoner = serde_json::from_str(json).unwrap();
		assert_eq!(summoner.puuid, "abc-123");
		assert_eq!(summoner.riot_id(), "Foo#EUW");
		assert_eq!(summoner.summoner_level, 0);
	}
}

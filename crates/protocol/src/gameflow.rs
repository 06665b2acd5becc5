//! Game-flow phase reported by the client.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Phase pushed on `/lol-gameflow/v1/gameflow-phase`.
///
/// Unrecognised phase names deserialize to [`GameflowPhase::Unknown`] so a
/// client update never breaks event fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameflowPhase {
	None,
	Lobby,
	Matchmaking,
	CheckedIntoTournament,
	ReadyCheck,
	ChampSelect,
	GameStart,
	FailedToLaunch,
	InProgress,
	Reconnect,
	WaitingForStats,
	PreEndOfGame,
	EndOfGame,
	TerminatedInError,
	#[serde(other)]
	Unknown,
}

impl GameflowPhase {
	/// Reads the phase from an event payload (a bare JSON string).
	pub fn from_payload(payload: &Value) -> Self {
		serde_json::from_value(payload.clone()).unwrap_or(Self::Unknown)
	}
}

impl fmt::Display for GameflowPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

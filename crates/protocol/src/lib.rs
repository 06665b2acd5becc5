//! Wire types shared by the League client companion crates.
//!
//! This crate has no I/O. It only describes what travels over the two
//! sockets and what the core hands to the UI boundary:
//!
//! - [`wamp`] - WAMP 1.0 frames spoken by the client API WebSocket
//! - [`lobby`] - JSON messages of the custom-lobby coordination server
//! - [`gameflow`] - the game-flow phase carried by `/lol-gameflow/v1/gameflow-phase`
//! - [`summoner`] - the identity returned by the identity probe
//! - [`ui`] - status and payload events delivered to the UI boundary

pub mod gameflow;
pub mod lobby;
pub mod summoner;
pub mod ui;
pub mod wamp;

pub use gameflow::GameflowPhase;
pub use lobby::{ChampSelectRequest, LobbyClientMessage, LobbyEvent};
pub use summoner::Summoner;
pub use ui::{ConnectionStatus, UiEvent};
pub use wamp::{ApiEvent, WampFrame};

/// Client API path carrying the current game-flow phase.
pub const GAMEFLOW_PHASE_PATH: &str = "/lol-gameflow/v1/gameflow-phase";

/// Client API path carrying the local lobby state.
pub const LOBBY_PATH: &str = "/lol-lobby/v2/lobby";

/// Client API path used as the identity probe.
pub const CURRENT_SUMMONER_PATH: &str = "/lol-summoner/v1/current-summoner";

/// Client API path accepting a pending ready check.
pub const READY_CHECK_ACCEPT_PATH: &str = "/lol-matchmaking/v1/ready-check/accept";

/// Lobby server path relaying champion-select assignments.
pub const LOBBY_CHAMP_SELECT_PATH: &str = "/ChampSelect";

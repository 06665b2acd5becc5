//! League client runtime - process detection, credentials, retry, and transports
//!
//! This crate provides the I/O building blocks the connection orchestrator in
//! `lcu` drives:
//!
//! - **Process monitoring**: edge-triggered running/stopped events for the client executable
//! - **Credentials**: per-session port and token discovery with ordered fallbacks
//! - **Retry**: bounded-attempt retry with a fixed delay for flaky local IPC
//! - **TLS**: `rustls` configuration for the client's self-signed loopback endpoint
//! - **Transports**: the client API socket (WAMP) and the lobby server socket,
//!   each with a path-keyed subscription table and a one-shot close signal
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │       lcu        │  Connection orchestrator
//! └────────┬─────────┘
//!          │ drives
//! ┌────────▼─────────┐
//! │   lcu-runtime    │  This crate
//! │  ┌────────────┐  │
//! │  │  Process   │  │  Polling + edge detection
//! │  └────────────┘  │
//! │  ┌────────────┐  │
//! │  │ Credential │  │  Command line / lockfile
//! │  └────────────┘  │
//! │  ┌────────────┐  │
//! │  │ Transport  │  │  Client (WAMP) / Lobby WebSocket + REST
//! │  └────────────┘  │
//! └──────────────────┘
//! ```

pub mod credentials;
pub mod error;
pub mod process;
pub mod retry;
pub mod tls;
pub mod transport;

pub use credentials::{
	ChainResolver, CommandLineResolver, CredentialResolver, Credentials, LockfileResolver, StaticResolver,
};
pub use error::{Error, Result};
pub use process::{EdgeDetector, ProcessEvent, ProcessMonitor, ProcessProbe, SystemProbe};
pub use retry::{RetryPolicy, retry, retry_while};
pub use tls::TransportSecurity;
pub use transport::{
	ApiResponse, ClientTransport, CloseCallback, CloseReason, CloseSignal, EventCallback, LobbyTransport, Method,
	SubscriptionId, Subscriptions, Transport, TransportKind,
};

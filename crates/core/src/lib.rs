//! League client companion core
//!
//! Watches for the game client process, connects to its local API and to the
//! custom-lobby server, and fans pushed events out to the UI boundary and to
//! registered domain handlers.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use lcu::{ChannelSink, LiveConnector, Orchestrator, OrchestratorConfig};
//! use lcu_runtime::process::UX_PROCESS_NAME;
//! use lcu_runtime::{ChainResolver, TransportSecurity};
//!
//! let config = OrchestratorConfig::default();
//! let resolver = Arc::new(ChainResolver::standard(UX_PROCESS_NAME, None, TransportSecurity::Insecure));
//! let connector = Arc::new(LiveConnector::new(config.process_name.clone(), resolver));
//! let (sink, mut events) = ChannelSink::new();
//!
//! let monitor = config.system_monitor()?;
//! let orchestrator = Orchestrator::new(config, connector, Arc::new(sink))
//!     .with_handler(lcu::auto_accept_ready_check());
//! orchestrator.start(monitor, true);
//!
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.channel());
//! }
//! ```
//!
//! # Main Types
//!
//! - [`Orchestrator`] - connection state machine, the single owner of both transports
//! - [`Connector`] / [`LiveConnector`] - single-attempt I/O operations a connect cycle uses
//! - [`UiSink`] - one-way UI boundary
//! - [`PhaseHandler`] - async reaction to game-flow phase changes
//! - [`OrchestratorConfig`] - timings and retry policies

pub mod api;
pub mod config;
pub mod connector;
pub mod handlers;
pub mod orchestrator;
pub mod ui;

pub use config::OrchestratorConfig;
pub use connector::{Connector, LiveConnector};
pub use handlers::{HandlerRegistry, PhaseContext, PhaseHandler, auto_accept_ready_check};
pub use lcu_protocol as protocol;
pub use lcu_runtime::{Credentials, Error, ProcessEvent, ProcessMonitor, Result, RetryPolicy, Transport};
pub use orchestrator::{LinkSnapshot, LinkState, Orchestrator, Snapshot};
pub use ui::{ChannelSink, UiSink};

//! Shared connection state.
//!
//! Everything here is guarded by one `parking_lot::Mutex` in the orchestrator
//! and is never held across an `.await`. Staleness is tracked with per-slot
//! epochs: a reset bumps the epoch, and a connect cycle that captured an older
//! epoch must discard whatever it produced.

use std::fmt;
use std::sync::Arc;

use lcu_runtime::{Credentials, Transport, TransportKind};
use tokio::time::{Duration, Instant};

/// Lifecycle of one transport as seen by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkState {
	/// Never connected, or a connect attempt gave up.
	#[default]
	Idle,
	/// A connect cycle is running (grace period, credentials, socket).
	Connecting,
	/// The client socket is open and the identity probe is running.
	ConfirmingIdentity,
	Connected,
	/// Torn down by a process stop or a socket close.
	Disconnected,
}

impl fmt::Display for LinkState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

/// An installed transport with the id its close callback refers to.
#[derive(Debug, Clone)]
pub(super) struct Link {
	pub id: u64,
	pub transport: Arc<dyn Transport>,
	pub opened_at: Instant,
}

impl Link {
	pub fn new(id: u64, transport: Arc<dyn Transport>) -> Self {
		Self {
			id,
			transport,
			opened_at: Instant::now(),
		}
	}
}

#[derive(Debug, Default)]
pub(super) struct Slot {
	pub link: Option<Link>,
	pub connecting: bool,
	pub state: LinkState,
	pub epoch: u64,
	/// Repairs started since the last link that stayed open long enough. Survives resets.
	pub repairs: u32,
}

impl Slot {
	/// Drops the handle and invalidates in-flight cycles. Returns the handle for closing outside the lock.
	pub fn reset(&mut self, state: LinkState) -> Option<Link> {
		self.epoch += 1;
		self.connecting = false;
		self.state = state;
		self.link.take()
	}

	pub fn is_current(&self, epoch: u64) -> bool {
		self.epoch == epoch
	}

	pub fn holds(&self, id: u64) -> bool {
		self.link.as_ref().is_some_and(|link| link.id == id)
	}

	/// True if the installed link has been open for at least `age`.
	pub fn link_outlived(&self, age: Duration) -> bool {
		self.link.as_ref().is_some_and(|link| link.opened_at.elapsed() >= age)
	}

	fn snapshot(&self) -> LinkSnapshot {
		LinkSnapshot {
			state: self.state,
			connecting: self.connecting,
			has_handle: self.link.is_some(),
		}
	}
}

#[derive(Debug, Default)]
pub(super) struct SharedState {
	pub process_running: bool,
	pub shut_down: bool,
	pub client: Slot,
	pub lobby: Slot,
	/// Credentials of the installed client transport.
	pub credentials: Option<Credentials>,
}

impl SharedState {
	pub fn slot(&self, kind: TransportKind) -> &Slot {
		match kind {
			TransportKind::Client => &self.client,
			TransportKind::Lobby => &self.lobby,
		}
	}

	pub fn slot_mut(&mut self, kind: TransportKind) -> &mut Slot {
		match kind {
			TransportKind::Client => &mut self.client,
			TransportKind::Lobby => &mut self.lobby,
		}
	}

	/// Tears down both transports. The lobby cannot outlive the client.
	pub fn reset_all(&mut self, state: LinkState) -> Vec<Link> {
		self.credentials = None;
		let client = self.client.reset(state);
		let lobby = self.lobby.reset(state);
		client.into_iter().chain(lobby).collect()
	}

	/// Restores both repair budgets. Called when the process stops.
	pub fn forget_repairs(&mut self) {
		self.client.repairs = 0;
		self.lobby.repairs = 0;
	}

	pub fn snapshot(&self) -> Snapshot {
		Snapshot {
			process_running: self.process_running,
			client: self.client.snapshot(),
			lobby: self.lobby.snapshot(),
		}
	}
}

/// Per-transport view in a [`Snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSnapshot {
	pub state: LinkState,
	pub connecting: bool,
	pub has_handle: bool,
}

/// Point-in-time view of the orchestrator, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
	/// Last process edge seen.
	pub process_running: bool,
	pub client: LinkSnapshot,
	pub lobby: LinkSnapshot,
}

impl Snapshot {
	pub fn link(&self, kind: TransportKind) -> LinkSnapshot {
		match kind {
			TransportKind::Client => self.client,
			TransportKind::Lobby => self.lobby,
		}
	}
}

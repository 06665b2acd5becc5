//! Connection orchestrator.
//!
//! Owns the client API and lobby transports and drives them from process
//! edges and socket closes:
//!
//! ```text
//! running edge ─► grace ─► re-check process ─► "connecting"
//!     ─► credentials (retried) ─► client socket (retried)
//!     ─► identity probe (retried) ─► "connected"
//!     ─► grace ─► re-check ─► identity ─► lobby socket (retried)
//!
//! stopped edge ─► both handles dropped and closed ─► "disconnect"
//! client close ─► both handles dropped ─► "disconnect" ─► optional new cycle
//! lobby close  ─► lobby handle dropped ─► optional new lobby cycle
//! ```
//!
//! Repairs after a close are budgeted per transport: consecutive closes of
//! short-lived links back off linearly, and once the budget is spent the
//! transport stays down and the UI gets "reconnectAbandoned" until the next
//! stopped edge.
//!
//! All shared state sits behind one mutex that is never held across an
//! `.await`. A connect cycle sets its slot's `connecting` flag before its
//! first suspension point and re-checks its captured epoch after every one;
//! any reset bumps the epoch, so a stale cycle closes what it opened and
//! returns without touching state.

mod state;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lcu_protocol::{
	ChampSelectRequest, ConnectionStatus, GAMEFLOW_PHASE_PATH, GameflowPhase, LOBBY_CHAMP_SELECT_PATH, LOBBY_PATH,
	Summoner, UiEvent,
};
use lcu_runtime::{
	CloseReason, Credentials, Error, LobbyTransport, ProcessEvent, ProcessMonitor, Result, RetryPolicy, Transport,
	TransportKind, retry_while,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use self::state::{LinkSnapshot, LinkState, Snapshot};
use self::state::{Link, SharedState};
use crate::api;
use crate::config::OrchestratorConfig;
use crate::connector::Connector;
use crate::handlers::{HandlerRegistry, PhaseContext, PhaseHandler};
use crate::ui::UiSink;

/// How a connect cycle ended without an error.
enum Outcome {
	Connected,
	/// The process vanished during the grace period.
	ProcessGone,
}

/// What a transport close leads to.
enum Repair {
	None,
	/// Start a new cycle after the delay.
	After(Duration),
	/// The budget is spent; carries the number of repairs made.
	GiveUp(u32),
}

/// Single owner of the connection state for one client process.
#[derive(Clone)]
pub struct Orchestrator {
	inner: Arc<Inner>,
}

impl std::fmt::Debug for Orchestrator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Orchestrator").field("state", &self.snapshot()).finish()
	}
}

struct Inner {
	config: OrchestratorConfig,
	connector: Arc<dyn Connector>,
	ui: Arc<dyn UiSink>,
	handlers: Mutex<HandlerRegistry>,
	state: Mutex<SharedState>,
	next_link_id: AtomicU64,
	monitor: Mutex<Option<(ProcessMonitor, JoinHandle<()>)>>,
}

impl Orchestrator {
	pub fn new(config: OrchestratorConfig, connector: Arc<dyn Connector>, ui: Arc<dyn UiSink>) -> Self {
		Self {
			inner: Arc::new(Inner {
				config,
				connector,
				ui,
				handlers: Mutex::new(HandlerRegistry::new()),
				state: Mutex::new(SharedState::default()),
				next_link_id: AtomicU64::new(1),
				monitor: Mutex::new(None),
			}),
		}
	}

	/// Registers a game-flow phase handler.
	pub fn with_handler(self, handler: PhaseHandler) -> Self {
		self.inner.handlers.lock().insert(handler);
		self
	}

	pub fn config(&self) -> &OrchestratorConfig {
		&self.inner.config
	}

	/// Starts `monitor` and reacts to its events until [`Orchestrator::shutdown`].
	///
	/// Replaces a previously started monitor.
	pub fn start(&self, monitor: ProcessMonitor, immediate: bool) {
		self.inner.state.lock().shut_down = false;
		let mut events = monitor.start(immediate);
		let weak = Arc::downgrade(&self.inner);
		let task = tokio::spawn(async move {
			while let Some(event) = events.recv().await {
				let Some(inner) = weak.upgrade() else {
					break;
				};
				inner.handle_process_event(event);
			}
		});

		info!(target = "lcu", process = monitor.name(), immediate, "orchestrator started");
		if let Some((previous, task)) = self.inner.monitor.lock().replace((monitor, task)) {
			previous.stop();
			task.abort();
		}
	}

	/// Feeds one process edge, as the monitor would.
	pub fn handle_process_event(&self, event: ProcessEvent) {
		self.inner.handle_process_event(event);
	}

	/// Stops the monitor and tears down both transports.
	///
	/// In-flight connect cycles notice the reset and exit on their own.
	pub fn shutdown(&self) {
		if let Some((monitor, task)) = self.inner.monitor.lock().take() {
			monitor.stop();
			task.abort();
		}
		let (links, was_active) = {
			let mut state = self.inner.state.lock();
			state.shut_down = true;
			state.process_running = false;
			state.forget_repairs();
			let was_active = state.client.connecting
				|| !matches!(state.client.state, LinkState::Idle | LinkState::Disconnected);
			(state.reset_all(LinkState::Disconnected), was_active)
		};
		self.inner.close_links(links);
		if was_active {
			self.inner.notify_status(ConnectionStatus::Disconnected);
		}
		info!(target = "lcu", "orchestrator shut down");
	}

	pub fn snapshot(&self) -> Snapshot {
		self.inner.state.lock().snapshot()
	}

	/// The confirmed client API transport.
	pub fn client(&self) -> Result<Arc<dyn Transport>> {
		self.inner.connected(TransportKind::Client)
	}

	/// The connected lobby transport.
	pub fn lobby(&self) -> Result<Arc<dyn Transport>> {
		self.inner.connected(TransportKind::Lobby)
	}

	/// Credentials of the confirmed client connection.
	pub fn credentials(&self) -> Result<Credentials> {
		let state = self.inner.state.lock();
		match (&state.credentials, state.client.state) {
			(Some(credentials), LinkState::Connected) => Ok(credentials.clone()),
			_ => Err(Error::CredentialsUnavailable("not connected to the client".into())),
		}
	}

	/// Submits the owned champion pool over the lobby transport.
	pub fn select_champions(&self, request: ChampSelectRequest) -> Result<()> {
		let lobby = self
			.lobby()?
			.downcast_arc::<LobbyTransport>()
			.map_err(|_| Error::InvalidArgument("lobby transport does not support champion select".into()))?;
		lobby.select_champions(request)
	}
}

impl Inner {
	fn handle_process_event(self: &Arc<Self>, event: ProcessEvent) {
		match event {
			ProcessEvent::Running => self.on_running(),
			ProcessEvent::Stopped => self.on_stopped(),
		}
	}

	fn on_running(self: &Arc<Self>) {
		let client_connected = {
			let mut state = self.state.lock();
			if state.shut_down {
				return;
			}
			state.process_running = true;
			state.client.state == LinkState::Connected
		};
		if client_connected {
			self.spawn_lobby_cycle(Duration::ZERO);
		} else {
			self.spawn_client_cycle(Duration::ZERO);
		}
	}

	fn on_stopped(&self) {
		let links = {
			let mut state = self.state.lock();
			state.process_running = false;
			state.forget_repairs();
			state.reset_all(LinkState::Disconnected)
		};
		info!(target = "lcu", closed = links.len(), "client process exited");
		self.close_links(links);
		self.notify_status(ConnectionStatus::Disconnected);
	}

	fn spawn_client_cycle(self: &Arc<Self>, delay: Duration) {
		let epoch = {
			let mut state = self.state.lock();
			if state.shut_down || state.client.link.is_some() || state.client.connecting {
				debug!(target = "lcu", state = %state.client.state, "client connect already in progress or established");
				return;
			}
			state.client.connecting = true;
			state.client.state = LinkState::Connecting;
			state.client.epoch
		};
		let inner = Arc::clone(self);
		tokio::spawn(async move { inner.client_cycle(epoch, delay).await });
	}

	fn spawn_lobby_cycle(self: &Arc<Self>, delay: Duration) {
		if !self.connector.lobby_enabled() {
			return;
		}
		let epoch = {
			let mut state = self.state.lock();
			if state.shut_down
				|| state.client.state != LinkState::Connected
				|| state.lobby.link.is_some()
				|| state.lobby.connecting
			{
				return;
			}
			state.lobby.connecting = true;
			state.lobby.state = LinkState::Connecting;
			state.lobby.epoch
		};
		let inner = Arc::clone(self);
		tokio::spawn(async move { inner.lobby_cycle(epoch, delay).await });
	}

	async fn client_cycle(self: Arc<Self>, epoch: u64, delay: Duration) {
		match self.connect_client(epoch, delay).await {
			Ok(Outcome::Connected) => self.spawn_lobby_cycle(Duration::ZERO),
			Ok(Outcome::ProcessGone) => {
				let mut state = self.state.lock();
				if state.client.is_current(epoch) {
					state.client.connecting = false;
					state.client.state = LinkState::Idle;
				}
				debug!(target = "lcu", "client process gone after grace period");
			}
			Err(err) => {
				let link = {
					let mut state = self.state.lock();
					if state.client.is_current(epoch) {
						state.credentials = None;
						Some(state.client.reset(LinkState::Idle))
					} else {
						None
					}
				};
				let Some(link) = link else {
					debug!(target = "lcu", error = %err, "stale client connect attempt discarded");
					return;
				};
				warn!(target = "lcu", error = %err, "client connect failed");
				self.close_links(link);
				self.notify_status(ConnectionStatus::Disconnected);
			}
		}
	}

	async fn connect_client(self: &Arc<Self>, epoch: u64, delay: Duration) -> Result<Outcome> {
		let kind = TransportKind::Client;
		tokio::time::sleep(delay + self.config.grace_period).await;
		self.ensure_current(kind, epoch)?;
		if !self.process_still_running().await {
			return Ok(Outcome::ProcessGone);
		}
		self.ensure_current(kind, epoch)?;
		info!(target = "lcu", "client process running, connecting");
		self.notify_status(ConnectionStatus::Connecting);

		let inner: &Inner = self;
		let credentials = retry_while(
			self.config.credential_retry,
			move || async move {
				inner.ensure_current(kind, epoch)?;
				inner.connector.resolve_credentials().await
			},
			|err: &Error| !err.is_aborted(),
		)
		.await?;
		debug!(target = "lcu", ?credentials, "resolved credentials");

		let creds = &credentials;
		let transport = retry_while(
			self.config.transport_retry,
			move || async move {
				inner.ensure_current(kind, epoch)?;
				let transport = inner.connector.connect_client(creds.clone()).await?;
				inner.discard_if_stale(kind, epoch, &transport)?;
				Ok::<_, Error>(transport)
			},
			Error::is_connection_error,
		)
		.await
		.map_err(|err| connection_failed(kind, self.config.transport_retry, err))?;

		let id = self.next_link_id.fetch_add(1, Ordering::Relaxed);
		{
			let mut state = self.state.lock();
			if !state.client.is_current(epoch) || state.shut_down {
				drop(state);
				transport.close();
				return Err(Error::Aborted);
			}
			state.client.link = Some(Link::new(id, Arc::clone(&transport)));
			state.client.state = LinkState::ConfirmingIdentity;
			state.credentials = Some(credentials.clone());
		}
		self.subscribe_client(&transport);
		self.watch_close(kind, id, &transport);

		let summoner = self.confirm_identity(kind, epoch, &transport).await?;

		{
			let mut state = self.state.lock();
			if !state.client.is_current(epoch) {
				return Err(Error::Aborted);
			}
			state.client.state = LinkState::Connected;
			state.client.connecting = false;
			state.lobby.repairs = 0;
		}
		info!(target = "lcu", summoner = %summoner.riot_id(), port = credentials.port, "connected to client");
		self.notify_status(ConnectionStatus::Connected);
		Ok(Outcome::Connected)
	}

	async fn lobby_cycle(self: Arc<Self>, epoch: u64, delay: Duration) {
		match self.connect_lobby(epoch, delay).await {
			Ok(Outcome::Connected) => {}
			Ok(Outcome::ProcessGone) => {
				let mut state = self.state.lock();
				if state.lobby.is_current(epoch) {
					state.lobby.connecting = false;
					state.lobby.state = LinkState::Idle;
				}
				debug!(target = "lcu", "client process gone before lobby connect");
			}
			Err(err) => {
				let link = {
					let mut state = self.state.lock();
					state.lobby.is_current(epoch).then(|| state.lobby.reset(LinkState::Idle))
				};
				match link {
					Some(link) => {
						warn!(target = "lcu", error = %err, "lobby connect failed");
						self.close_links(link);
					}
					None => debug!(target = "lcu", error = %err, "stale lobby connect attempt discarded"),
				}
			}
		}
	}

	async fn connect_lobby(self: &Arc<Self>, epoch: u64, delay: Duration) -> Result<Outcome> {
		let kind = TransportKind::Lobby;
		tokio::time::sleep(delay + self.config.grace_period).await;
		self.ensure_current(kind, epoch)?;
		if !self.process_still_running().await {
			return Ok(Outcome::ProcessGone);
		}

		let client = {
			let state = self.state.lock();
			match (&state.client.link, state.client.state) {
				(Some(link), LinkState::Connected) if state.lobby.is_current(epoch) => Arc::clone(&link.transport),
				_ => return Err(Error::Aborted),
			}
		};
		let summoner = self.confirm_identity(kind, epoch, &client).await?;
		info!(target = "lcu", "connecting lobby server");

		let inner: &Inner = self;
		let puuid = summoner.puuid.as_str();
		let transport = retry_while(
			self.config.transport_retry,
			move || async move {
				inner.ensure_current(kind, epoch)?;
				let transport = inner.connector.connect_lobby(puuid).await?;
				inner.discard_if_stale(kind, epoch, &transport)?;
				Ok::<_, Error>(transport)
			},
			Error::is_connection_error,
		)
		.await
		.map_err(|err| connection_failed(kind, self.config.transport_retry, err))?;

		let id = self.next_link_id.fetch_add(1, Ordering::Relaxed);
		{
			let mut state = self.state.lock();
			if !state.lobby.is_current(epoch) || state.client.state != LinkState::Connected {
				drop(state);
				transport.close();
				return Err(Error::Aborted);
			}
			state.lobby.link = Some(Link::new(id, Arc::clone(&transport)));
			state.lobby.state = LinkState::Connected;
			state.lobby.connecting = false;
		}

		let ui = Arc::clone(&self.ui);
		transport.subscribe(
			LOBBY_CHAMP_SELECT_PATH,
			Arc::new(move |payload: &Value| ui.notify(UiEvent::LobbyChampSelect(payload.clone()))),
		);
		self.watch_close(kind, id, &transport);
		info!(target = "lcu", "connected to lobby server");
		Ok(Outcome::Connected)
	}

	/// Long-horizon identity probe through `client`, abandoned when `kind`'s slot is reset.
	async fn confirm_identity(&self, kind: TransportKind, epoch: u64, client: &Arc<dyn Transport>) -> Result<Summoner> {
		let policy = self.config.identity_retry;
		retry_while(
			policy,
			move || async move {
				self.ensure_current(kind, epoch)?;
				api::current_summoner(&**client).await
			},
			|err: &Error| !matches!(err, Error::Aborted | Error::TransportClosed),
		)
		.await
		.map_err(|err| match err {
			Error::Aborted | Error::TransportClosed => err,
			other => Error::IdentityNotConfirmed {
				attempts: policy.max_attempts,
				last_error: other.to_string(),
			},
		})
	}

	fn ensure_current(&self, kind: TransportKind, epoch: u64) -> Result<()> {
		let state = self.state.lock();
		if state.shut_down || !state.slot(kind).is_current(epoch) {
			return Err(Error::Aborted);
		}
		Ok(())
	}

	/// Closes a freshly opened transport whose cycle went stale while it was connecting.
	fn discard_if_stale(&self, kind: TransportKind, epoch: u64, transport: &Arc<dyn Transport>) -> Result<()> {
		if let Err(err) = self.ensure_current(kind, epoch) {
			transport.close();
			return Err(err);
		}
		Ok(())
	}

	async fn process_still_running(&self) -> bool {
		match self.connector.process_running().await {
			Ok(running) => running,
			Err(err) => {
				// The edge that started this cycle is more trustworthy than a failed re-check.
				warn!(target = "lcu", error = %err, "process re-check failed, assuming still running");
				true
			}
		}
	}

	fn connected(&self, kind: TransportKind) -> Result<Arc<dyn Transport>> {
		let state = self.state.lock();
		let slot = state.slot(kind);
		match (&slot.link, slot.state) {
			(Some(link), LinkState::Connected) => Ok(Arc::clone(&link.transport)),
			_ => Err(Error::TransportClosed),
		}
	}

	fn subscribe_client(self: &Arc<Self>, transport: &Arc<dyn Transport>) {
		let weak = Arc::downgrade(self);
		transport.subscribe(
			GAMEFLOW_PHASE_PATH,
			Arc::new(move |payload: &Value| {
				if let Some(inner) = weak.upgrade() {
					inner.on_gameflow_phase(payload);
				}
			}),
		);
		let ui = Arc::clone(&self.ui);
		transport.subscribe(
			LOBBY_PATH,
			Arc::new(move |payload: &Value| ui.notify(UiEvent::Lobby(payload.clone()))),
		);
	}

	fn on_gameflow_phase(&self, payload: &Value) {
		let phase = GameflowPhase::from_payload(payload);
		info!(target = "lcu", %phase, "gameflow phase");
		self.ui.notify(UiEvent::GameflowPhase(payload.clone()));

		let client = self.state.lock().client.link.as_ref().map(|link| Arc::clone(&link.transport));
		let Some(client) = client else {
			return;
		};
		let ctx = PhaseContext {
			phase,
			payload: payload.clone(),
			client,
		};
		self.handlers.lock().dispatch(&ctx);
	}

	fn watch_close(self: &Arc<Self>, kind: TransportKind, id: u64, transport: &Arc<dyn Transport>) {
		let weak = Arc::downgrade(self);
		transport.on_close(Box::new(move |reason| {
			if let Some(inner) = weak.upgrade() {
				inner.on_transport_closed(kind, id, reason);
			}
		}));
	}

	fn on_transport_closed(self: &Arc<Self>, kind: TransportKind, id: u64, reason: CloseReason) {
		let (links, repair) = {
			let mut state = self.state.lock();
			if !state.slot(kind).holds(id) {
				return;
			}
			let stable = state.slot(kind).link_outlived(self.config.stable_link);
			let links = match kind {
				TransportKind::Client => state.reset_all(LinkState::Disconnected),
				TransportKind::Lobby => state.lobby.reset(LinkState::Disconnected).into_iter().collect(),
			};
			let eligible = self.config.reconnect_on_close
				&& state.process_running
				&& !state.shut_down
				&& (kind == TransportKind::Client || state.client.state == LinkState::Connected);
			let repair = if eligible {
				let policy = self.config.repair_retry;
				let slot = state.slot_mut(kind);
				slot.repairs = if stable { 1 } else { slot.repairs + 1 };
				if slot.repairs > policy.max_attempts.max(1) {
					Repair::GiveUp(slot.repairs - 1)
				} else {
					Repair::After(policy.delay * (slot.repairs - 1))
				}
			} else {
				Repair::None
			};
			(links, repair)
		};

		warn!(target = "lcu", transport = %kind, ?reason, "transport closed");
		self.close_links(links);
		if kind == TransportKind::Client {
			self.notify_status(ConnectionStatus::Disconnected);
		}
		match repair {
			Repair::None => {}
			Repair::After(delay) => {
				debug!(target = "lcu", transport = %kind, ?delay, "scheduling repair");
				match kind {
					TransportKind::Client => self.spawn_client_cycle(delay),
					TransportKind::Lobby => self.spawn_lobby_cycle(delay),
				}
			}
			Repair::GiveUp(repairs) => {
				warn!(target = "lcu", transport = %kind, repairs, "transport keeps closing, giving up until the process restarts");
				self.ui.notify(UiEvent::ReconnectAbandoned(json!({
					"transport": kind.to_string(),
					"repairs": repairs,
				})));
			}
		}
	}

	/// Empties subscription tables and closes. Must be called without the state lock held.
	fn close_links(&self, links: impl IntoIterator<Item = Link>) {
		for link in links {
			link.transport.clear_subscriptions();
			link.transport.close();
		}
	}

	fn notify_status(&self, status: ConnectionStatus) {
		self.ui.notify(UiEvent::Status(status));
	}
}

fn connection_failed(kind: TransportKind, policy: RetryPolicy, err: Error) -> Error {
	match err {
		Error::Aborted => err,
		other if other.is_connection_error() => Error::ConnectionFailed(format!(
			"{kind} transport unreachable after {} attempts: {other}",
			policy.max_attempts.max(1)
		)),
		other => Error::ConnectionFailed(format!("{kind} transport rejected: {other}")),
	}
}

//! The I/O seam of the orchestrator.
//!
//! [`Connector`] bundles the single-attempt operations a connect cycle needs.
//! The orchestrator applies retry policies and staleness checks around them,
//! so implementations stay simple and tests can substitute in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;
use lcu_runtime::{
	ClientTransport, CredentialResolver, Credentials, Error, LobbyTransport, ProcessProbe, Result, SystemProbe,
	Transport,
};
use url::Url;

/// Single-attempt operations used by a connect cycle.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
	/// Whether the client process is present right now.
	async fn process_running(&self) -> Result<bool>;

	/// Reads fresh session credentials.
	async fn resolve_credentials(&self) -> Result<Credentials>;

	/// Opens the client API transport.
	async fn connect_client(&self, credentials: Credentials) -> Result<Arc<dyn Transport>>;

	/// Opens the lobby transport for `puuid`.
	async fn connect_lobby(&self, puuid: &str) -> Result<Arc<dyn Transport>>;

	/// Whether a lobby server is configured at all.
	fn lobby_enabled(&self) -> bool;
}

/// [`Connector`] over the real process table, credential sources and sockets.
pub struct LiveConnector {
	process_name: String,
	probe: Arc<dyn ProcessProbe>,
	resolver: Arc<dyn CredentialResolver>,
	lobby_server: Option<Url>,
}

impl std::fmt::Debug for LiveConnector {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LiveConnector")
			.field("process_name", &self.process_name)
			.field("resolver", &self.resolver.name())
			.field("lobby_server", &self.lobby_server.as_ref().map(Url::as_str))
			.finish()
	}
}

impl LiveConnector {
	pub fn new(process_name: impl Into<String>, resolver: Arc<dyn CredentialResolver>) -> Self {
		Self {
			process_name: process_name.into(),
			probe: Arc::new(SystemProbe),
			resolver,
			lobby_server: None,
		}
	}

	pub fn with_probe(mut self, probe: Arc<dyn ProcessProbe>) -> Self {
		self.probe = probe;
		self
	}

	/// Enables the lobby transport against this server base URL.
	pub fn with_lobby_server(mut self, url: Url) -> Self {
		self.lobby_server = Some(url);
		self
	}
}

#[async_trait]
impl Connector for LiveConnector {
	async fn process_running(&self) -> Result<bool> {
		self.probe.is_running(&self.process_name).await
	}

	async fn resolve_credentials(&self) -> Result<Credentials> {
		self.resolver.resolve().await
	}

	async fn connect_client(&self, credentials: Credentials) -> Result<Arc<dyn Transport>> {
		let transport = ClientTransport::connect(credentials).await?;
		Ok(Arc::new(transport))
	}

	async fn connect_lobby(&self, puuid: &str) -> Result<Arc<dyn Transport>> {
		let base = self
			.lobby_server
			.as_ref()
			.ok_or_else(|| Error::InvalidArgument("no lobby server configured".into()))?;
		let transport = LobbyTransport::connect(base, puuid).await?;
		Ok(Arc::new(transport))
	}

	fn lobby_enabled(&self) -> bool {
		self.lobby_server.is_some()
	}
}

//! Lobby transport: the auxiliary custom-lobby coordination server.

use futures_util::future::BoxFuture;
use lcu_protocol::lobby::{ChampSelectRequest, LobbyClientMessage, LobbyEvent};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::socket::{self, CloseCallback, Socket};
use super::subscriptions::{EventCallback, SubscriptionId};
use super::{ApiResponse, Method, Transport, TransportKind, send_http};
use crate::error::{Error, Result};

/// WebSocket to `<base>/ws/<puuid>`, plus REST calls against `<base>`.
#[derive(Debug)]
pub struct LobbyTransport {
	puuid: String,
	http_base: String,
	http: reqwest::Client,
	socket: Socket,
}

fn route(text: &str) -> Option<(String, Value)> {
	match LobbyEvent::decode(text)? {
		LobbyEvent::Routed { uri, data } => Some((uri, data)),
		LobbyEvent::Unrouted(frame) => {
			debug!(target = "lcu.runtime", %frame, "lobby frame without uri");
			None
		}
	}
}

/// Derives the socket URL for `puuid` from the server's HTTP base.
pub(crate) fn socket_url(base: &Url, puuid: &str) -> Result<Url> {
	if puuid.is_empty() {
		return Err(Error::InvalidArgument("lobby identity must not be empty".into()));
	}
	let scheme = match base.scheme() {
		"http" | "ws" => "ws",
		"https" | "wss" => "wss",
		other => return Err(Error::InvalidArgument(format!("unsupported lobby server scheme: {other}"))),
	};
	let mut url = base.clone();
	url.set_scheme(scheme)
		.map_err(|()| Error::InvalidArgument(format!("cannot use scheme {scheme} for {base}")))?;
	url.path_segments_mut()
		.map_err(|()| Error::InvalidArgument(format!("lobby server URL cannot be a base: {base}")))?
		.pop_if_empty()
		.extend(["ws", puuid]);
	Ok(url)
}

impl LobbyTransport {
	/// Opens the socket keyed by `puuid`. Single attempt.
	pub async fn connect(base: &Url, puuid: &str) -> Result<Self> {
		let url = socket_url(base, puuid)?;
		let stream = socket::open(url.as_str(), None, None).await?;
		let socket = Socket::spawn("lobby", stream, route);
		info!(target = "lcu.runtime", server = %base, "lobby transport connected");

		Ok(Self {
			puuid: puuid.to_string(),
			http_base: base.as_str().trim_end_matches('/').to_string(),
			http: super::http_client(None)?,
			socket,
		})
	}

	pub fn puuid(&self) -> &str {
		&self.puuid
	}

	/// Submits the owned champion pool for random assignment.
	pub fn select_champions(&self, request: ChampSelectRequest) -> Result<()> {
		let frame = serde_json::to_string(&LobbyClientMessage::Select(request))?;
		self.socket.send_text(frame)
	}
}

impl Transport for LobbyTransport {
	fn kind(&self) -> TransportKind {
		TransportKind::Lobby
	}

	fn subscribe(&self, path: &str, callback: EventCallback) -> SubscriptionId {
		debug!(target = "lcu.runtime", path, "lobby subscribe");
		self.socket.subscriptions().add(path, callback)
	}

	fn unsubscribe(&self, path: &str) {
		self.socket.subscriptions().remove_path(path);
	}

	fn remove_subscription(&self, id: SubscriptionId) -> bool {
		self.socket.subscriptions().remove(id)
	}

	fn clear_subscriptions(&self) {
		self.socket.subscriptions().clear();
	}

	fn subscription_count(&self) -> usize {
		self.socket.subscriptions().len()
	}

	fn on_close(&self, callback: CloseCallback) {
		self.socket.close_signal().on_close(callback);
	}

	fn is_closed(&self) -> bool {
		self.socket.is_closed()
	}

	fn close(&self) {
		self.socket.close();
	}

	fn request<'a>(&'a self, method: Method, path: &'a str, body: Option<Value>) -> BoxFuture<'a, Result<ApiResponse>> {
		Box::pin(async move {
			if self.socket.is_closed() {
				return Err(Error::TransportClosed);
			}
			send_http(&self.http, &self.http_base, None, method, path, body).await
		})
	}
}

impl Drop for LobbyTransport {
	fn drop(&mut self) {
		self.socket.close();
	}
}

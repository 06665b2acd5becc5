//! Primary transport: the client's own API socket.

use futures_util::future::BoxFuture;
use lcu_protocol::wamp::{self, JSON_API_EVENT_TOPIC, WampFrame};
use serde_json::Value;
use tracing::{debug, info};

use super::socket::{self, CloseCallback, Socket};
use super::subscriptions::{EventCallback, SubscriptionId};
use super::{ApiResponse, Method, Transport, TransportKind, send_http};
use crate::credentials::Credentials;
use crate::error::{Error, Result};

/// WebSocket + REST connection to the Client API, bound to one set of credentials.
#[derive(Debug)]
pub struct ClientTransport {
	credentials: Credentials,
	authorization: String,
	http_base: String,
	http: reqwest::Client,
	socket: Socket,
}

fn route(text: &str) -> Option<(String, Value)> {
	match WampFrame::decode(text) {
		WampFrame::Event(event) => Some((event.uri, event.data)),
		WampFrame::Other => None,
	}
}

impl ClientTransport {
	/// Opens the socket and subscribes to the JSON API event topic.
	///
	/// Single attempt; callers wrap this in [`crate::retry::retry`].
	pub async fn connect(credentials: Credentials) -> Result<Self> {
		let tls = credentials.security.client_config()?;
		let authorization = credentials.basic_auth_header();
		let url = credentials.ws_url();

		let stream = socket::open(&url, Some(&authorization), tls.clone()).await?;
		let socket = Socket::spawn("client", stream, route);
		socket.send_text(wamp::subscribe_frame(JSON_API_EVENT_TOPIC))?;

		let http = super::http_client(tls)?;
		info!(target = "lcu.runtime", port = credentials.port, "client transport connected");

		Ok(Self {
			http_base: credentials.http_base(),
			credentials,
			authorization,
			http,
			socket,
		})
	}

	/// Credentials this transport was opened with.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}
}

impl Transport for ClientTransport {
	fn kind(&self) -> TransportKind {
		TransportKind::Client
	}

	fn subscribe(&self, path: &str, callback: EventCallback) -> SubscriptionId {
		debug!(target = "lcu.runtime", path, "client subscribe");
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
		if !self.socket.is_closed() {
			let _ = self.socket.send_text(wamp::unsubscribe_frame(JSON_API_EVENT_TOPIC));
		}
		self.socket.close();
	}

	fn request<'a>(&'a self, method: Method, path: &'a str, body: Option<Value>) -> BoxFuture<'a, Result<ApiResponse>> {
		Box::pin(async move {
			if self.socket.is_closed() {
				return Err(Error::TransportClosed);
			}
			send_http(&self.http, &self.http_base, Some(&self.authorization), method, path, body).await
		})
	}
}

impl Drop for ClientTransport {
	fn drop(&mut self) {
		self.socket.close();
	}
}

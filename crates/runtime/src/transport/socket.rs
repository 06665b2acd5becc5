//! WebSocket actor shared by the client and lobby transports.
//!
//! A connected stream is split into a reader task, which routes inbound text
//! frames to the subscription table, and a writer task fed by an unbounded
//! channel. Whatever ends the socket first (remote close, read or write error,
//! explicit [`Socket::close`]) clears the subscription table and fires the
//! [`CloseSignal`] exactly once.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustls::ClientConfig;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::subscriptions::Subscriptions;
use crate::error::{Error, Result};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Maps an inbound text frame to `(path, payload)`, or `None` to drop it.
pub(crate) type Router = fn(&str) -> Option<(String, Value)>;

/// Why a socket closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
	/// The peer sent a close frame or ended the stream.
	Remote,
	/// A read or write failed.
	Error(String),
	/// [`Socket::close`] was called.
	Local,
}

/// Callback run once when a transport closes.
pub type CloseCallback = Box<dyn FnOnce(CloseReason) + Send>;

struct CloseState {
	reason: Option<CloseReason>,
	callbacks: Vec<CloseCallback>,
}

/// One-shot close notification.
///
/// Callbacks registered after the signal fired run immediately with the
/// recorded reason.
#[derive(Clone)]
pub struct CloseSignal {
	state: Arc<Mutex<CloseState>>,
	closed: Arc<watch::Sender<bool>>,
}

impl Default for CloseSignal {
	fn default() -> Self {
		Self {
			state: Arc::new(Mutex::new(CloseState {
				reason: None,
				callbacks: Vec::new(),
			})),
			closed: Arc::new(watch::Sender::new(false)),
		}
	}
}

impl std::fmt::Debug for CloseSignal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CloseSignal").field("reason", &self.reason()).finish()
	}
}

impl CloseSignal {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn on_close(&self, callback: CloseCallback) {
		let mut state = self.state.lock();
		match state.reason.clone() {
			Some(reason) => {
				drop(state);
				callback(reason);
			}
			None => state.callbacks.push(callback),
		}
	}

	/// Records `reason` and runs the callbacks. Only the first call has any effect.
	pub fn fire(&self, reason: CloseReason) -> bool {
		let callbacks = {
			let mut state = self.state.lock();
			if state.reason.is_some() {
				return false;
			}
			state.reason = Some(reason.clone());
			std::mem::take(&mut state.callbacks)
		};
		self.closed.send_replace(true);
		for callback in callbacks {
			callback(reason.clone());
		}
		true
	}

	pub fn is_fired(&self) -> bool {
		self.state.lock().reason.is_some()
	}

	pub fn reason(&self) -> Option<CloseReason> {
		self.state.lock().reason.clone()
	}

	/// Resolves once the signal has fired.
	pub async fn wait(&self) {
		let mut rx = self.closed.subscribe();
		// The sender lives in `self`, so this only errors if it was dropped, which cannot happen here.
		let _ = rx.wait_for(|closed| *closed).await;
	}
}

/// Opens a WebSocket with an optional `Authorization` header and TLS config.
pub(crate) async fn open(url: &str, authorization: Option<&str>, tls: Option<Arc<ClientConfig>>) -> Result<WsStream> {
	let mut request = url.into_client_request()?;
	if let Some(auth) = authorization {
		let value = HeaderValue::from_str(auth).map_err(|e| Error::InvalidArgument(format!("authorization header: {e}")))?;
		request.headers_mut().insert(AUTHORIZATION, value);
	}
	let connector = tls.map(Connector::Rustls);
	let (stream, response) = tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector).await?;
	debug!(target = "lcu.runtime", url, status = response.status().as_u16(), "websocket connected");
	Ok(stream)
}

/// Running reader/writer pair over one WebSocket stream.
pub(crate) struct Socket {
	label: &'static str,
	outbound: mpsc::UnboundedSender<Message>,
	subscriptions: Subscriptions,
	close: CloseSignal,
	reader: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Socket {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Socket")
			.field("label", &self.label)
			.field("subscriptions", &self.subscriptions.len())
			.field("closed", &self.close.is_fired())
			.finish()
	}
}

impl Socket {
	pub(crate) fn spawn(label: &'static str, stream: WsStream, router: Router) -> Self {
		let (mut sink, mut source) = stream.split();
		let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
		let subscriptions = Subscriptions::new();
		let close = CloseSignal::new();

		let reader = {
			let subscriptions = subscriptions.clone();
			let close = close.clone();
			tokio::spawn(async move {
				let reason = loop {
					match source.next().await {
						Some(Ok(Message::Text(text))) => {
							if text.is_empty() {
								continue;
							}
							match router(&text) {
								Some((path, payload)) => {
									let delivered = subscriptions.dispatch(&path, &payload);
									trace!(target = "lcu.runtime", socket = label, path = %path, delivered, "event");
								}
								None => trace!(target = "lcu.runtime", socket = label, "dropped unrouted frame"),
							}
						}
						Some(Ok(Message::Close(frame))) => {
							debug!(target = "lcu.runtime", socket = label, ?frame, "peer closed websocket");
							break CloseReason::Remote;
						}
						Some(Ok(_)) => {}
						Some(Err(e)) => {
							warn!(target = "lcu.runtime", socket = label, error = %e, "websocket read failed");
							break CloseReason::Error(e.to_string());
						}
						None => break CloseReason::Remote,
					}
				};
				subscriptions.clear();
				close.fire(reason);
			})
		};

		{
			let subscriptions = subscriptions.clone();
			let close = close.clone();
			tokio::spawn(async move {
				while let Some(message) = outbound_rx.recv().await {
					let is_close = matches!(message, Message::Close(_));
					if let Err(e) = sink.send(message).await {
						warn!(target = "lcu.runtime", socket = label, error = %e, "websocket write failed");
						subscriptions.clear();
						close.fire(CloseReason::Error(e.to_string()));
						break;
					}
					if is_close {
						break;
					}
				}
				let _ = sink.close().await;
			});
		}

		Self {
			label,
			outbound,
			subscriptions,
			close,
			reader: Mutex::new(Some(reader)),
		}
	}

	pub(crate) fn subscriptions(&self) -> &Subscriptions {
		&self.subscriptions
	}

	pub(crate) fn close_signal(&self) -> &CloseSignal {
		&self.close
	}

	pub(crate) fn is_closed(&self) -> bool {
		self.close.is_fired()
	}

	pub(crate) fn send_text(&self, text: String) -> Result<()> {
		if self.is_closed() {
			return Err(Error::TransportClosed);
		}
		self.outbound.send(Message::Text(text)).map_err(|_| Error::TransportClosed)
	}

	/// Sends a close frame and tears the socket down locally. Idempotent.
	pub(crate) fn close(&self) {
		if self.is_closed() {
			return;
		}
		debug!(target = "lcu.runtime", socket = self.label, "closing websocket");
		let _ = self.outbound.send(Message::Close(None));
		if let Some(reader) = self.reader.lock().take() {
			reader.abort();
		}
		self.subscriptions.clear();
		self.close.fire(CloseReason::Local);
	}
}

impl Drop for Socket {
	fn drop(&mut self) {
		if let Some(reader) = self.reader.lock().take() {
			reader.abort();
		}
	}
}

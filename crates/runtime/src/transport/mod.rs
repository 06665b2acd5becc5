//! Client API and lobby transports.
//!
//! Both transports share the [`Transport`] contract: a live WebSocket with a
//! path-keyed subscription table, a one-shot close notification, and a
//! REST-style [`Transport::request`] that fails with
//! [`Error::TransportClosed`] once the socket is gone, so subscribers and
//! one-shot callers observe a closed transport consistently.

mod client;
mod lobby;
mod socket;
mod subscriptions;

#[cfg(test)]
mod tests;

use std::fmt;

use downcast_rs::{DowncastSync, impl_downcast};
use futures_util::future::BoxFuture;
pub use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

pub use client::ClientTransport;
pub use lobby::LobbyTransport;
pub use socket::{CloseCallback, CloseReason, CloseSignal};
pub use subscriptions::{EventCallback, SubscriptionId, Subscriptions};

use crate::error::{Error, Result};

/// Which connection a transport is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
	/// The client's own API socket.
	Client,
	/// The auxiliary lobby coordination server.
	Lobby,
}

impl fmt::Display for TransportKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			TransportKind::Client => "client",
			TransportKind::Lobby => "lobby",
		})
	}
}

/// Live, path-subscribable connection.
///
/// Handles are shared as `Arc<dyn Transport>`; use `downcast_arc` to reach
/// transport-specific calls such as [`LobbyTransport::select_champions`].
pub trait Transport: DowncastSync + fmt::Debug {
	fn kind(&self) -> TransportKind;

	/// Registers `callback` for events on `path`. Subscriptions on the same path accumulate.
	fn subscribe(&self, path: &str, callback: EventCallback) -> SubscriptionId;

	/// Removes every callback registered for `path`.
	fn unsubscribe(&self, path: &str);

	/// Removes a single registration.
	fn remove_subscription(&self, id: SubscriptionId) -> bool;

	fn clear_subscriptions(&self);

	fn subscription_count(&self) -> usize;

	/// Runs `callback` once when the socket closes for any reason.
	fn on_close(&self, callback: CloseCallback);

	fn is_closed(&self) -> bool;

	/// Closes the socket. Fires the close callbacks if they have not fired yet.
	fn close(&self);

	/// One-shot REST-style call sharing this transport's credentials.
	fn request<'a>(&'a self, method: Method, path: &'a str, body: Option<Value>) -> BoxFuture<'a, Result<ApiResponse>>;
}

impl_downcast!(sync Transport);

/// Status and decoded body of a REST-style call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
	pub status: u16,
	/// `null` for empty bodies, a JSON string for non-JSON bodies.
	pub body: Value,
}

impl ApiResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// The `message` field of an RPC error body, if any.
	pub fn error_message(&self) -> Option<&str> {
		self.body.get("message").and_then(Value::as_str)
	}

	/// Deserializes the body of a 2xx response.
	pub fn into_result<T: DeserializeOwned>(self) -> Result<T> {
		let body = self.into_value()?;
		Ok(serde_json::from_value(body)?)
	}

	/// The raw body of a 2xx response.
	pub fn into_value(self) -> Result<Value> {
		if self.is_success() {
			return Ok(self.body);
		}
		let message = match self.error_message() {
			Some(message) => message.to_string(),
			None if self.body.is_null() => "empty response".to_string(),
			None => self.body.to_string(),
		};
		Err(Error::Request {
			status: self.status,
			message,
		})
	}
}

pub(crate) async fn send_http(
	http: &reqwest::Client,
	base: &str,
	authorization: Option<&str>,
	method: Method,
	path: &str,
	body: Option<Value>,
) -> Result<ApiResponse> {
	if !path.starts_with('/') {
		return Err(Error::InvalidArgument(format!("request path must start with '/': {path}")));
	}
	let url = format!("{base}{path}");
	debug!(target = "lcu.runtime", %method, path, "request");

	let mut builder = http.request(method, &url);
	if let Some(auth) = authorization {
		builder = builder.header(reqwest::header::AUTHORIZATION, auth);
	}
	if let Some(body) = &body {
		builder = builder.json(body);
	}

	let response = builder.send().await?;
	let status = response.status().as_u16();
	let text = response.text().await?;
	let body = if text.trim().is_empty() {
		Value::Null
	} else {
		serde_json::from_str(&text).unwrap_or(Value::String(text))
	};
	Ok(ApiResponse { status, body })
}

pub(crate) fn http_client(tls: Option<std::sync::Arc<rustls::ClientConfig>>) -> Result<reqwest::Client> {
	let mut builder = reqwest::Client::builder();
	if let Some(config) = tls {
		builder = builder.use_preconfigured_tls((*config).clone());
	}
	Ok(builder.build()?)
}

#[cfg(test)]
mod response_tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn success_deserializes_body() {
		let response = ApiResponse {
			status: 200,
			body: json!({"puuid": "abc"}),
		};
		let value: Value = response.into_result().unwrap();
		assert_eq!(value["puuid"], "abc");
	}

	#[test]
	fn failure_carries_rpc_message() {
		let response = ApiResponse {
			status: 404,
			body: json!({"errorCode": "RPC_ERROR", "httpStatus": 404, "message": "No active delegate"}),
		};
		let err = response.into_value().unwrap_err();
		assert!(matches!(err, Error::Request { status: 404, ref message } if message == "No active delegate"));
		assert_eq!(err.status(), Some(404));
	}

	#[test]
	fn failure_without_message_uses_body() {
		let response = ApiResponse {
			status: 500,
			body: Value::Null,
		};
		let err = response.into_value().unwrap_err();
		assert!(matches!(err, Error::Request { status: 500, ref message } if message == "empty response"));
	}
}

//! Error types for the client runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while watching, discovering, or talking to the client.
#[derive(Debug, Error)]
pub enum Error {
	/// Session credentials are not (yet) available.
	#[error("Client credentials unavailable: {0}. Is the League client running and logged in?")]
	CredentialsUnavailable(String),

	/// A socket could not be established within its retry budget.
	#[error("Failed to connect: {0}")]
	ConnectionFailed(String),

	/// The client API is reachable but never finished its own login sequence.
	#[error("Client identity not confirmed after {attempts} attempts: {last_error}")]
	IdentityNotConfirmed { attempts: u32, last_error: String },

	/// The transport the call relied on has been closed.
	#[error("Transport closed")]
	TransportClosed,

	/// A connect attempt noticed that the session it belonged to was reset.
	#[error("Connect attempt superseded by a session reset")]
	Aborted,

	/// Non-2xx response to a REST-style request.
	#[error("Request failed with status {status}: {message}")]
	Request { status: u16, message: String },

	/// The OS process table could not be queried.
	#[error("Process query failed: {0}")]
	ProcessQuery(String),

	/// TLS configuration could not be built.
	#[error("TLS error: {0}")]
	Tls(String),

	/// Invalid argument provided to a method.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// WebSocket protocol or handshake error.
	#[error("WebSocket error: {0}")]
	WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

	/// HTTP client error.
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	/// Malformed endpoint URL.
	#[error("Invalid URL: {0}")]
	Url(#[from] url::ParseError),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
	fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
		Error::WebSocket(Box::new(err))
	}
}

impl Error {
	/// Returns true if this error only means "a newer session took over".
	pub fn is_aborted(&self) -> bool {
		matches!(self, Error::Aborted)
	}

	/// Returns true for failures another connect attempt may get past.
	pub fn is_connection_error(&self) -> bool {
		matches!(
			self,
			Error::CredentialsUnavailable(_)
				| Error::ConnectionFailed(_)
				| Error::IdentityNotConfirmed { .. }
				| Error::TransportClosed
				| Error::WebSocket(_)
				| Error::Io(_)
		)
	}

	/// Returns the HTTP status for request-level errors.
	pub fn status(&self) -> Option<u16> {
		match self {
			Error::Request { status, .. } => Some(*status),
			Error::Http(err) => err.status().map(|s| s.as_u16()),
			_ => None,
		}
	}
}

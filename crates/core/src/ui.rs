//! The UI boundary.
//!
//! The orchestrator only pushes [`UiEvent`]s; it never waits on the UI and
//! makes no ordering promise beyond best effort.

use lcu_protocol::UiEvent;
use tokio::sync::mpsc;
use tracing::trace;

/// One-way sink for status and payload events.
pub trait UiSink: Send + Sync {
	fn notify(&self, event: UiEvent);
}

impl<F> UiSink for F
where
	F: Fn(UiEvent) + Send + Sync,
{
	fn notify(&self, event: UiEvent) {
		self(event)
	}
}

/// Forwards events into an unbounded channel. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
	tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelSink {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}
}

impl UiSink for ChannelSink {
	fn notify(&self, event: UiEvent) {
		if self.tx.send(event).is_err() {
			trace!(target = "lcu", "ui receiver dropped");
		}
	}
}

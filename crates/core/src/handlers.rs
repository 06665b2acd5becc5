//! Domain handlers for game-flow phase events.
//!
//! Handlers are stored in a [`HandlerRegistry`] keyed by name with stable
//! insertion order. Every game-flow event is dispatched to all of them, each
//! in its own spawned task; a failing handler is logged and never affects the
//! connection.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use lcu_protocol::GameflowPhase;
use lcu_runtime::Transport;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api;

/// Boxed async handler future.
pub type HandlerFuture = Pin<Box<dyn Future<Output = lcu_runtime::Result<()>> + Send>>;

/// Handler function: [`PhaseContext`] → async `Result<()>`.
pub type HandlerFn = Arc<dyn Fn(PhaseContext) -> HandlerFuture + Send + Sync>;

/// What a handler receives for each game-flow event.
#[derive(Clone)]
pub struct PhaseContext {
	pub phase: GameflowPhase,
	/// Raw event payload.
	pub payload: Value,
	/// The live client transport the event arrived on.
	pub client: Arc<dyn Transport>,
}

impl std::fmt::Debug for PhaseContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PhaseContext")
			.field("phase", &self.phase)
			.field("payload", &self.payload)
			.finish_non_exhaustive()
	}
}

/// Named handler entry.
#[derive(Clone)]
pub struct PhaseHandler {
	pub name: String,
	pub handler: HandlerFn,
}

impl std::fmt::Debug for PhaseHandler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PhaseHandler").field("name", &self.name).finish()
	}
}

impl PhaseHandler {
	pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
	where
		F: Fn(PhaseContext) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = lcu_runtime::Result<()>> + Send + 'static,
	{
		Self {
			name: name.into(),
			handler: Arc::new(move |ctx: PhaseContext| -> HandlerFuture { Box::pin(handler(ctx)) }),
		}
	}
}

/// Ordered set of handlers. Registering a name twice replaces the earlier handler in place.
#[derive(Clone, Default, Debug)]
pub struct HandlerRegistry {
	entries: IndexMap<String, PhaseHandler>,
}

impl HandlerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, handler: PhaseHandler) {
		self.entries.insert(handler.name.clone(), handler);
	}

	pub fn remove(&mut self, name: &str) -> Option<PhaseHandler> {
		self.entries.shift_remove(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Spawns every handler with its own copy of `ctx`.
	pub fn dispatch(&self, ctx: &PhaseContext) -> Vec<JoinHandle<()>> {
		self.entries
			.values()
			.map(|entry| {
				let name = entry.name.clone();
				let fut = (entry.handler)(ctx.clone());
				tokio::spawn(async move {
					match fut.await {
						Ok(()) => debug!(target = "lcu", handler = %name, "phase handler finished"),
						Err(e) => warn!(target = "lcu", handler = %name, error = %e, "phase handler failed"),
					}
				})
			})
			.collect()
	}
}

/// Accepts the match as soon as the phase becomes `ReadyCheck`.
pub fn auto_accept_ready_check() -> PhaseHandler {
	PhaseHandler::new("auto_accept_ready_check", |ctx: PhaseContext| async move {
		if ctx.phase != GameflowPhase::ReadyCheck {
			return Ok(());
		}
		api::accept_ready_check(ctx.client.as_ref()).await?;
		info!(target = "lcu", "ready check accepted");
		Ok(())
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn noop(name: &str) -> PhaseHandler {
		PhaseHandler::new(name, |_ctx: PhaseContext| async { Ok(()) })
	}

	#[test]
	fn registry_keeps_insertion_order_and_replaces_in_place() {
		let mut registry = HandlerRegistry::new();
		registry.insert(noop("a"));
		registry.insert(noop("b"));
		registry.insert(noop("c"));
		registry.insert(noop("a"));

		assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
		assert_eq!(registry.len(), 3);
	}

	#[test]
	fn remove_preserves_remaining_order() {
		let mut registry = HandlerRegistry::new();
		registry.insert(noop("a"));
		registry.insert(auto_accept_ready_check());
		registry.insert(noop("c"));

		assert!(registry.remove("auto_accept_ready_check").is_some());
		assert!(registry.remove("missing").is_none());
		assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "c"]);
		assert!(!registry.is_empty());
	}
}

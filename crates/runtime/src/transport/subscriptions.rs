//! Path-keyed subscriber table shared by both transports.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::warn;

/// Callback invoked with the payload of every event on a subscribed path.
pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Identifies one registration, so a single callback can be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Entry {
	path: String,
	callback: EventCallback,
}

#[derive(Default)]
struct Table {
	next_id: u64,
	entries: IndexMap<SubscriptionId, Entry>,
}

/// Registered `(path, callback)` pairs, dispatched in registration order.
#[derive(Clone, Default)]
pub struct Subscriptions {
	inner: Arc<Mutex<Table>>,
}

impl std::fmt::Debug for Subscriptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let table = self.inner.lock();
		f.debug_struct("Subscriptions")
			.field("paths", &table.entries.values().map(|e| e.path.as_str()).collect::<Vec<_>>())
			.finish()
	}
}

impl Subscriptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a callback. Several callbacks per path accumulate.
	pub fn add(&self, path: impl Into<String>, callback: EventCallback) -> SubscriptionId {
		let mut table = self.inner.lock();
		table.next_id += 1;
		let id = SubscriptionId(table.next_id);
		table.entries.insert(
			id,
			Entry {
				path: path.into(),
				callback,
			},
		);
		id
	}

	/// Removes every callback on `path`, returning how many were removed.
	pub fn remove_path(&self, path: &str) -> usize {
		let mut table = self.inner.lock();
		let before = table.entries.len();
		table.entries.retain(|_, entry| entry.path != path);
		before - table.entries.len()
	}

	/// Removes one registration. Returns `false` if it was already gone.
	pub fn remove(&self, id: SubscriptionId) -> bool {
		self.inner.lock().entries.shift_remove(&id).is_some()
	}

	pub fn clear(&self) {
		self.inner.lock().entries.clear();
	}

	pub fn len(&self) -> usize {
		self.inner.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn has_path(&self, path: &str) -> bool {
		self.inner.lock().entries.values().any(|e| e.path == path)
	}

	/// Calls every callback registered for `path`, in registration order.
	///
	/// Callbacks run outside the table lock, so they may subscribe or
	/// unsubscribe. A panicking callback is logged and does not stop the rest.
	pub fn dispatch(&self, path: &str, payload: &Value) -> usize {
		let callbacks: Vec<EventCallback> = {
			let table = self.inner.lock();
			table
				.entries
				.values()
				.filter(|e| e.path == path)
				.map(|e| Arc::clone(&e.callback))
				.collect()
		};

		for callback in &callbacks {
			let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(payload)));
			if outcome.is_err() {
				warn!(target = "lcu.runtime", path, "subscriber panicked");
			}
		}
		callbacks.len()
	}
}

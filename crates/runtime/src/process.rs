//! Game client process detection.
//!
//! [`ProcessMonitor`] polls a [`ProcessProbe`] on a fixed interval and emits
//! [`ProcessEvent`]s on state *changes* only. A probe that errors is treated as
//! "unknown": it neither emits nor updates the last confirmed state, so a
//! transient OS query failure can never produce a spurious `Stopped`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use sysinfo::System;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Executable name of the game client on this platform.
#[cfg(windows)]
pub const DEFAULT_PROCESS_NAME: &str = "LeagueClient.exe";
#[cfg(not(windows))]
pub const DEFAULT_PROCESS_NAME: &str = "LeagueClient";

/// Executable name of the client's UX process, whose command line carries the session credentials.
#[cfg(windows)]
pub const UX_PROCESS_NAME: &str = "LeagueClientUx.exe";
#[cfg(not(windows))]
pub const UX_PROCESS_NAME: &str = "LeagueClientUx";

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Leading-edge process transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEvent {
	Running,
	Stopped,
}

/// Answers "is an executable with this exact name present?".
pub trait ProcessProbe: Send + Sync {
	fn is_running<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool>>;
}

/// [`ProcessProbe`] backed by the OS process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl SystemProbe {
	/// Returns the argument vector of the first process named `name`, if any.
	pub async fn command_line(&self, name: &str) -> Result<Option<Vec<String>>> {
		let name = name.to_string();
		tokio::task::spawn_blocking(move || {
			let system = snapshot()?;
			Ok(system.processes_by_exact_name(&name).next().map(|p| p.cmd().to_vec()))
		})
		.await
		.map_err(|e| Error::ProcessQuery(format!("process query task failed: {e}")))?
	}
}

impl ProcessProbe for SystemProbe {
	fn is_running<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool>> {
		let name = name.to_string();
		Box::pin(async move {
			tokio::task::spawn_blocking(move || {
				let system = snapshot()?;
				let found = system.processes_by_exact_name(&name).next().is_some();
				Ok(found)
			})
			.await
			.map_err(|e| Error::ProcessQuery(format!("process query task failed: {e}")))?
		})
	}
}

fn snapshot() -> Result<System> {
	let mut system = System::new();
	system.refresh_processes();
	// An empty table means the query itself failed; we are always in it.
	if system.processes().is_empty() {
		return Err(Error::ProcessQuery("process table is empty".into()));
	}
	Ok(system)
}

/// Turns a stream of probe results into leading-edge events.
#[derive(Debug, Default, Clone)]
pub struct EdgeDetector {
	last: Option<bool>,
}

impl EdgeDetector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Last confirmed state, `None` until a probe has succeeded.
	pub fn last(&self) -> Option<bool> {
		self.last
	}

	/// Records one probe result.
	///
	/// The very first confirmed `false` is silent: there is nothing to stop.
	pub fn observe(&mut self, probe: Result<bool>) -> Option<ProcessEvent> {
		let running = match probe {
			Ok(running) => running,
			Err(err) => {
				warn!(target = "lcu.runtime", error = %err, "process probe failed, state unknown");
				return None;
			}
		};

		let previous = self.last.replace(running);
		match (previous, running) {
			(Some(true), true) | (Some(false), false) | (None, false) => None,
			(_, true) => Some(ProcessEvent::Running),
			(Some(true), false) => Some(ProcessEvent::Stopped),
		}
	}
}

/// Polls for the game client executable and reports transitions.
pub struct ProcessMonitor {
	probe: Arc<dyn ProcessProbe>,
	name: String,
	interval: Duration,
	task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ProcessMonitor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProcessMonitor")
			.field("name", &self.name)
			.field("interval", &self.interval)
			.field("polling", &self.is_polling())
			.finish()
	}
}

impl ProcessMonitor {
	/// Fails with [`Error::InvalidArgument`] for a zero `interval`.
	pub fn new(probe: Arc<dyn ProcessProbe>, name: impl Into<String>, interval: Duration) -> Result<Self> {
		if interval.is_zero() {
			return Err(Error::InvalidArgument("process poll interval must be non-zero".into()));
		}
		Ok(Self {
			probe,
			name: name.into(),
			interval,
			task: Mutex::new(None),
		})
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Begins polling and returns the event stream.
	///
	/// With `immediate` the first probe runs right away, otherwise after one
	/// interval. Calling `start` again replaces the previous poller, whose
	/// stream then ends.
	pub fn start(&self, immediate: bool) -> mpsc::UnboundedReceiver<ProcessEvent> {
		let (tx, rx) = mpsc::unbounded_channel();
		let probe = Arc::clone(&self.probe);
		let name = self.name.clone();
		let period = self.interval;

		let handle = tokio::spawn(async move {
			let mut ticker = if immediate {
				tokio::time::interval(period)
			} else {
				tokio::time::interval_at(Instant::now() + period, period)
			};
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			let mut edges = EdgeDetector::new();

			loop {
				ticker.tick().await;
				let result = probe.is_running(&name).await;
				if let Some(event) = edges.observe(result) {
					info!(target = "lcu.runtime", process = %name, ?event, "process state changed");
					if tx.send(event).is_err() {
						debug!(target = "lcu.runtime", "process event receiver dropped, stopping monitor");
						break;
					}
				}
			}
		});

		if let Some(previous) = self.task.lock().replace(handle) {
			previous.abort();
		}
		rx
	}

	/// Halts polling. Idempotent.
	pub fn stop(&self) {
		if let Some(handle) = self.task.lock().take() {
			handle.abort();
		}
	}

	pub fn is_polling(&self) -> bool {
		self.task.lock().as_ref().is_some_and(|h| !h.is_finished())
	}
}

impl Drop for ProcessMonitor {
	fn drop(&mut self) {
		self.stop();
	}
}

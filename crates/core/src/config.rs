//! Timing and behavior knobs of the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use lcu_runtime::process::{DEFAULT_POLL_INTERVAL, DEFAULT_PROCESS_NAME};
use lcu_runtime::{ProcessMonitor, Result, RetryPolicy, SystemProbe};

/// Configuration for [`crate::Orchestrator`].
///
/// Defaults follow the client's observed startup behavior: the API socket
/// can take a few seconds to accept upgrades and the login queue can take
/// minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
	/// Executable name watched by the process monitor.
	pub process_name: String,
	/// Process table polling interval.
	pub poll_interval: Duration,
	/// Wait after a running edge before re-checking the process and connecting.
	pub grace_period: Duration,
	/// Credential discovery attempts.
	pub credential_retry: RetryPolicy,
	/// Socket construction attempts, for both transports.
	pub transport_retry: RetryPolicy,
	/// Identity probe attempts.
	pub identity_retry: RetryPolicy,
	/// Start a new connect cycle when a live transport closes while the process still runs.
	pub reconnect_on_close: bool,
	/// Budget for consecutive repairs of a transport that keeps closing.
	pub repair_retry: RetryPolicy,
	/// A link that stayed open this long resets its repair budget when it closes.
	pub stable_link: Duration,
}

impl Default for OrchestratorConfig {
	fn default() -> Self {
		Self {
			process_name: DEFAULT_PROCESS_NAME.to_string(),
			poll_interval: DEFAULT_POLL_INTERVAL,
			grace_period: Duration::from_millis(1500),
			credential_retry: RetryPolicy::CREDENTIALS,
			transport_retry: RetryPolicy::TRANSPORT,
			identity_retry: RetryPolicy::IDENTITY,
			reconnect_on_close: true,
			repair_retry: RetryPolicy::REPAIR,
			stable_link: Duration::from_secs(60),
		}
	}
}

impl OrchestratorConfig {
	pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
		self.grace_period = grace_period;
		self
	}

	pub fn with_reconnect_on_close(mut self, reconnect: bool) -> Self {
		self.reconnect_on_close = reconnect;
		self
	}

	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = interval;
		self
	}

	pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
		self.process_name = name.into();
		self
	}

	pub fn with_repair_retry(mut self, policy: RetryPolicy) -> Self {
		self.repair_retry = policy;
		self
	}

	/// Monitor of the OS process table for `process_name`, polled every `poll_interval`.
	pub fn system_monitor(&self) -> Result<ProcessMonitor> {
		ProcessMonitor::new(Arc::new(SystemProbe), self.process_name.clone(), self.poll_interval)
	}
}

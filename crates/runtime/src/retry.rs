//! Bounded-attempt retry with a fixed delay.
//!
//! The client's IPC endpoints come up in stages after the process starts, so
//! most calls made during a connect cycle are wrapped here. The policy is
//! deliberately flat: `max_attempts` calls, `delay` between them, no growth.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Attempt ceiling and inter-attempt delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total number of calls, including the first. Zero is treated as one.
	pub max_attempts: u32,
	/// Wait between a failed call and the next one.
	pub delay: Duration,
}

impl RetryPolicy {
	/// Socket construction: the client may not accept upgrades right after launch.
	pub const TRANSPORT: Self = Self::new(4, Duration::from_millis(1500));

	/// Identity probe: the client may sit in its login queue for minutes.
	pub const IDENTITY: Self = Self::new(60, Duration::from_secs(5));

	/// Credential discovery: the session file is written shortly after launch.
	pub const CREDENTIALS: Self = Self::new(3, Duration::from_secs(1));

	/// Repairs after a live transport closes. The n-th consecutive repair waits `(n - 1) * delay`.
	pub const REPAIR: Self = Self::new(5, Duration::from_secs(5));

	pub const fn new(max_attempts: u32, delay: Duration) -> Self {
		Self { max_attempts, delay }
	}

	/// Longest time a fully failing run spends waiting between attempts.
	pub fn worst_case_wait(&self) -> Duration {
		self.delay * self.max_attempts.max(1).saturating_sub(1)
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self::TRANSPORT
	}
}

/// Runs `op` until it succeeds or `policy.max_attempts` calls have failed.
///
/// Returns the first success, or the error of the final attempt. Arguments of
/// the wrapped operation are captured by the closure, so any signature can be
/// retried:
///
/// ```ignore
/// let transport = retry(RetryPolicy::TRANSPORT, || ClientTransport::connect(creds.clone())).await?;
/// ```
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, op: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: std::fmt::Display,
{
	retry_while(policy, op, |_| true).await
}

/// Like [`retry`], but stops early when `should_retry` rejects an error.
///
/// Used by connect cycles so that an attempt made stale by a session reset
/// gives up at once instead of burning through its remaining budget.
pub async fn retry_while<T, E, F, Fut, P>(policy: RetryPolicy, mut op: F, should_retry: P) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	P: Fn(&E) -> bool,
	E: std::fmt::Display,
{
	let max_attempts = policy.max_attempts.max(1);
	let mut attempt = 1;

	loop {
		match op().await {
			Ok(value) => return Ok(value),
			Err(err) => {
				if attempt >= max_attempts || !should_retry(&err) {
					return Err(err);
				}
				debug!(
					target = "lcu.runtime",
					attempt,
					max_attempts,
					delay_ms = policy.delay.as_millis() as u64,
					error = %err,
					"attempt failed, retrying"
				);
				tokio::time::sleep(policy.delay).await;
				attempt += 1;
			}
		}
	}
}

//! Deterministic exponential back-off for durable operations
//!
//! Every Postgres call runs under one policy: the wait doubles each attempt
//! (capped at `max_wait`, no jitter) until `max_elapsed` is spent, then the
//! operation surfaces a terminal `Exhausted` error. Read misses are distinct
//! `NotFound` conditions and are never retried.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::warn;

use pulse_types::{StorageError, StorageResult};

/// Retry schedule: deterministic exponential growth bounded by a total time
/// budget.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
	init_wait: Duration,
	max_wait: Duration,
	max_elapsed: Duration,
}

impl RetryPolicy {
	pub fn new(init_wait: Duration, max_wait: Duration, max_elapsed: Duration) -> Self {
		Self {
			init_wait,
			max_wait,
			max_elapsed,
		}
	}

	/// Run `op`, retrying transient failures on the exponential schedule
	/// until the elapsed budget is spent.
	pub async fn run<T, F, Fut>(&self, op: F) -> StorageResult<T>
	where
		F: Fn() -> Fut,
		Fut: Future<Output = StorageResult<T>>,
	{
		let start = Instant::now();
		let mut wait = self.init_wait;
		let mut attempts: u32 = 0;
		loop {
			match op().await {
				Ok(value) => return Ok(value),
				Err(err) if !err.is_transient() => return Err(err),
				Err(err) => {
					attempts += 1;
					let elapsed = start.elapsed();
					if elapsed + wait > self.max_elapsed {
						return Err(StorageError::Exhausted {
							message: format!("{err} after {attempts} attempts"),
						});
					}
					warn!(%err, attempts, "transient storage failure, backing off");
					tokio::time::sleep(wait).await;
					wait = (wait * 2).min(self.max_wait);
				},
			}
		}
	}
}

impl Default for RetryPolicy {
	/// 100ms, 200ms, 400ms, ... capped at 1s within a 3s total budget.
	fn default() -> Self {
		Self::new(
			Duration::from_millis(100),
			Duration::from_secs(1),
			Duration::from_secs(3),
		)
	}
}

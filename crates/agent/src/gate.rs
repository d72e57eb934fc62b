//! Bounded concurrency gate for outbound sends
//!
//! A counting semaphore wrapping tokio's: acquire blocks once N permits are
//! outstanding, and the owned permit releases on drop, so every exit path —
//! including transmission failure — returns its permit.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Clone)]
pub struct ConcurrencyGate {
	inner: Arc<Semaphore>,
}

impl ConcurrencyGate {
	pub fn new(permits: usize) -> Self {
		Self {
			inner: Arc::new(Semaphore::new(permits.max(1))),
		}
	}

	/// Wait for a permit. The permit is scoped: dropping it releases.
	pub async fn acquire(&self) -> OwnedSemaphorePermit {
		self.inner
			.clone()
			.acquire_owned()
			.await
			.expect("gate semaphore closed")
	}

	pub fn available_permits(&self) -> usize {
		self.inner.available_permits()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	use super::*;

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn at_most_n_sends_run_simultaneously() {
		let gate = ConcurrencyGate::new(2);
		let active = Arc::new(AtomicUsize::new(0));
		let peak = Arc::new(AtomicUsize::new(0));

		let mut handles = Vec::new();
		for _ in 0..8 {
			let gate = gate.clone();
			let active = Arc::clone(&active);
			let peak = Arc::clone(&peak);
			handles.push(tokio::spawn(async move {
				let _permit = gate.acquire().await;
				let now = active.fetch_add(1, Ordering::SeqCst) + 1;
				peak.fetch_max(now, Ordering::SeqCst);
				tokio::time::sleep(Duration::from_millis(20)).await;
				active.fetch_sub(1, Ordering::SeqCst);
			}));
		}
		for handle in handles {
			handle.await.unwrap();
		}
		assert!(peak.load(Ordering::SeqCst) <= 2);
		assert_eq!(gate.available_permits(), 2);
	}

	#[tokio::test]
	async fn the_extra_acquire_waits_for_a_release() {
		let gate = ConcurrencyGate::new(1);
		let held = gate.acquire().await;

		let waiter = {
			let gate = gate.clone();
			tokio::spawn(async move {
				let _permit = gate.acquire().await;
			})
		};
		// The waiter cannot finish while the permit is held.
		tokio::time::sleep(Duration::from_millis(20)).await;
		assert!(!waiter.is_finished());

		drop(held);
		tokio::time::timeout(Duration::from_secs(1), waiter)
			.await
			.expect("waiter should finish after the release")
			.unwrap();
	}

	#[tokio::test]
	async fn permits_are_returned_on_error_paths() {
		let gate = ConcurrencyGate::new(1);
		let failing: Result<(), &str> = async {
			let _permit = gate.acquire().await;
			Err("send failed")
		}
		.await;
		assert!(failing.is_err());
		assert_eq!(gate.available_permits(), 1);
	}
}

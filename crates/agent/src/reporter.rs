//! Report task: periodic snapshot delivery
//!
//! Every tick takes a consistent snapshot (the storage lock is released
//! before any I/O), converts it to the wire batch, and transmits it through
//! the configured transport under a gate permit. Delivery is at-most-once
//! per tick and lossy under sustained failure by design: there is no retry
//! queue, a failed send is logged and superseded by the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pulse_storage::MemoryStore;

use crate::gate::ConcurrencyGate;
use crate::transport::ReportTransport;

pub struct Reporter {
	storage: Arc<MemoryStore>,
	transport: ReportTransport,
	gate: ConcurrencyGate,
	interval: Duration,
}

impl Reporter {
	pub fn new(
		storage: Arc<MemoryStore>,
		transport: ReportTransport,
		gate: ConcurrencyGate,
		interval: Duration,
	) -> Self {
		Self {
			storage,
			transport,
			gate,
			interval,
		}
	}

	/// Spawn the report loop. The shutdown signal is observed at every tick
	/// boundary and while blocked on the gate; an in-flight transmission
	/// completes before the task exits.
	pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
		tokio::spawn(self.run(shutdown))
	}

	async fn run(self, mut shutdown: broadcast::Receiver<()>) {
		let mut ticker = tokio::time::interval(self.interval);
		ticker.tick().await;
		loop {
			tokio::select! {
				_ = shutdown.recv() => {
					debug!("reporter shutting down");
					return;
				}
				_ = ticker.tick() => {
					let permit = tokio::select! {
						_ = shutdown.recv() => return,
						permit = self.gate.acquire() => permit,
					};
					self.report_once().await;
					drop(permit);
				}
			}
		}
	}

	/// One delivery tick: snapshot, convert, transmit.
	pub async fn report_once(&self) {
		let dump = self.storage.dump_sync();
		if dump.is_empty() {
			debug!("nothing collected yet, skipping report tick");
			return;
		}

		let batch = dump.into_payloads();
		let size = batch.len();
		match self.transport.send(&batch).await {
			Ok(()) => info!(metrics = size, "snapshot delivered"),
			// Fire and forget: the next tick's snapshot supersedes this one.
			Err(err) => warn!(%err, "request sending failed"),
		}
	}
}

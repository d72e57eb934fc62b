//! Poll task: periodic process and host sampling
//!
//! Every tick gathers a fixed set of gauges — the process's resident and
//! virtual memory, a random jitter gauge, and best-effort host readings
//! (CPU utilization, free/total memory in MB) — and increments the
//! `PollCount` counter by exactly one. All writes for a tick land through a
//! single batch, so they share one critical section on the store.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use sysinfo::{CpuExt, Pid, ProcessExt, System, SystemExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use pulse_storage::MemoryStore;
use pulse_types::{CounterMetric, GaugeMetric, MetricStorage};

/// Counter incremented once per poll tick.
pub const POLL_COUNT: &str = "PollCount";

pub struct Collector {
	storage: Arc<MemoryStore>,
	interval: Duration,
	system: System,
	pid: Option<Pid>,
}

impl Collector {
	pub fn new(storage: Arc<MemoryStore>, interval: Duration) -> Self {
		Self {
			storage,
			interval,
			system: System::new(),
			pid: sysinfo::get_current_pid().ok(),
		}
	}

	/// Spawn the poll loop. The task observes the shutdown signal at every
	/// tick boundary.
	pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
		tokio::spawn(self.run(shutdown))
	}

	async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
		let mut ticker = tokio::time::interval(self.interval);
		ticker.tick().await;
		loop {
			tokio::select! {
				_ = shutdown.recv() => {
					debug!("collector shutting down");
					return;
				}
				_ = ticker.tick() => self.poll_once().await,
			}
		}
	}

	/// One sampling tick: every gauge plus the poll counter lands as one
	/// batch.
	pub async fn poll_once(&mut self) {
		let gauges = self.sample();
		let poll = [CounterMetric {
			name: POLL_COUNT.to_string(),
			value: 1,
		}];
		if let Err(err) = self.storage.set_batch(&gauges, &poll).await {
			warn!(%err, "poll tick failed to store samples");
		}
	}

	fn sample(&mut self) -> Vec<GaugeMetric> {
		let mut gauges = Vec::with_capacity(8);

		if let Some(pid) = self.pid {
			self.system.refresh_process(pid);
			if let Some(process) = self.system.process(pid) {
				gauges.push(gauge("Alloc", process.memory() as f64));
				gauges.push(gauge("Sys", process.virtual_memory() as f64));
			}
		}

		gauges.push(gauge(
			"RandomValue",
			rand::thread_rng().gen_range(0.0..100.0),
		));

		self.sample_host(&mut gauges);
		gauges
	}

	/// Host gauges are best-effort: a host without readable stats only loses
	/// these entries.
	fn sample_host(&mut self, gauges: &mut Vec<GaugeMetric>) {
		self.system.refresh_memory();
		self.system.refresh_cpu();

		let total = self.system.total_memory();
		if total > 0 {
			gauges.push(gauge("TotalMemory", (total / (1024 * 1024)) as f64));
			gauges.push(gauge(
				"FreeMemory",
				(self.system.free_memory() / (1024 * 1024)) as f64,
			));
		}
		if let Some(cpu) = self.system.cpus().first() {
			gauges.push(gauge("CPUutilization1", cpu.cpu_usage() as f64));
		}
	}
}

fn gauge(name: &str, value: f64) -> GaugeMetric {
	GaugeMetric {
		name: name.to_string(),
		value,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn each_tick_increments_poll_count_by_one() {
		let storage = Arc::new(MemoryStore::new());
		let mut collector = Collector::new(Arc::clone(&storage), Duration::from_secs(2));

		collector.poll_once().await;
		assert_eq!(storage.counter(POLL_COUNT).await.unwrap(), 1);

		collector.poll_once().await;
		collector.poll_once().await;
		assert_eq!(storage.counter(POLL_COUNT).await.unwrap(), 3);
	}

	#[tokio::test]
	async fn a_tick_stores_the_jitter_gauge() {
		let storage = Arc::new(MemoryStore::new());
		let mut collector = Collector::new(Arc::clone(&storage), Duration::from_secs(2));
		collector.poll_once().await;

		let jitter = storage.gauge("RandomValue").await.unwrap();
		assert!((0.0..100.0).contains(&jitter));
	}

	#[tokio::test]
	async fn gauges_overwrite_across_ticks() {
		let storage = Arc::new(MemoryStore::new());
		let mut collector = Collector::new(Arc::clone(&storage), Duration::from_secs(2));
		collector.poll_once().await;
		collector.poll_once().await;

		// Two ticks leave one RandomValue entry, not two.
		let dump = storage.dump().await.unwrap();
		let jitter_entries = dump
			.gauges
			.iter()
			.filter(|gauge| gauge.name == "RandomValue")
			.count();
		assert_eq!(jitter_entries, 1);
	}
}

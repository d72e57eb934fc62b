//! In-memory storage implementation
//!
//! Both maps live behind one lock, so a dump observes a single consistent
//! point in time. The lock is held only for the map walk, never across file
//! or network I/O. Collector writes, handler reads/writes, and snapshot
//! reads all serialize through it.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use pulse_types::{
	CounterMetric, GaugeMetric, MetricStorage, MetricsDump, StorageError, StorageResult,
};

#[derive(Debug, Default)]
struct Maps {
	gauges: HashMap<String, f64>,
	counters: HashMap<String, i64>,
}

/// Map-backed store, safe under concurrent collector and handler access.
#[derive(Debug, Default)]
pub struct MemoryStore {
	inner: RwLock<Maps>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace-or-merge the maps from a restored snapshot. Takes the write
	/// lock exactly once so a partially-loaded state is never observable.
	pub fn bulk_load(&self, dump: &MetricsDump) {
		let mut maps = self.inner.write().expect("storage lock poisoned");
		for counter in &dump.counters {
			maps.counters.insert(counter.name.clone(), counter.value);
		}
		for gauge in &dump.gauges {
			maps.gauges.insert(gauge.name.clone(), gauge.value);
		}
	}

	/// Synchronous snapshot used by the snapshot service; the read lock is
	/// held only while walking the maps.
	pub fn dump_sync(&self) -> MetricsDump {
		let maps = self.inner.read().expect("storage lock poisoned");
		let mut counters: Vec<CounterMetric> = maps
			.counters
			.iter()
			.map(|(name, value)| CounterMetric {
				name: name.clone(),
				value: *value,
			})
			.collect();
		let mut gauges: Vec<GaugeMetric> = maps
			.gauges
			.iter()
			.map(|(name, value)| GaugeMetric {
				name: name.clone(),
				value: *value,
			})
			.collect();
		drop(maps);
		counters.sort_by(|a, b| a.name.cmp(&b.name));
		gauges.sort_by(|a, b| a.name.cmp(&b.name));
		MetricsDump { counters, gauges }
	}
}

#[async_trait]
impl MetricStorage for MemoryStore {
	async fn gauge(&self, name: &str) -> StorageResult<f64> {
		let maps = self.inner.read().expect("storage lock poisoned");
		maps.gauges
			.get(name)
			.copied()
			.ok_or_else(|| StorageError::NotFound { id: name.to_string() })
	}

	async fn counter(&self, name: &str) -> StorageResult<i64> {
		let maps = self.inner.read().expect("storage lock poisoned");
		maps.counters
			.get(name)
			.copied()
			.ok_or_else(|| StorageError::NotFound { id: name.to_string() })
	}

	async fn set_gauge(&self, name: &str, value: f64) -> StorageResult<()> {
		let mut maps = self.inner.write().expect("storage lock poisoned");
		maps.gauges.insert(name.to_string(), value);
		Ok(())
	}

	async fn add_counter(&self, name: &str, delta: i64) -> StorageResult<()> {
		let mut maps = self.inner.write().expect("storage lock poisoned");
		*maps.counters.entry(name.to_string()).or_insert(0) += delta;
		Ok(())
	}

	async fn set_batch(
		&self,
		gauges: &[GaugeMetric],
		counters: &[CounterMetric],
	) -> StorageResult<()> {
		// One write-lock acquisition covers the whole batch, so concurrent
		// readers see either none of it or all of it.
		let mut maps = self.inner.write().expect("storage lock poisoned");
		for gauge in gauges {
			maps.gauges.insert(gauge.name.clone(), gauge.value);
		}
		for counter in counters {
			*maps.counters.entry(counter.name.clone()).or_insert(0) += counter.value;
		}
		Ok(())
	}

	async fn dump(&self) -> StorageResult<MetricsDump> {
		Ok(self.dump_sync())
	}

	async fn ping(&self) -> StorageResult<()> {
		Err(StorageError::Connection {
			message: "no durable backend configured".to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	#[tokio::test]
	async fn gauge_overwrites_exactly() {
		let store = MemoryStore::new();
		store.set_gauge("temp", 35.0).await.unwrap();
		store.set_gauge("temp", 36.6).await.unwrap();
		assert_eq!(store.gauge("temp").await.unwrap(), 36.6);
	}

	#[tokio::test]
	async fn counter_accumulates_deltas() {
		let store = MemoryStore::new();
		store.add_counter("hits", 5).await.unwrap();
		store.add_counter("hits", 7).await.unwrap();
		store.add_counter("hits", -2).await.unwrap();
		assert_eq!(store.counter("hits").await.unwrap(), 10);
	}

	#[tokio::test]
	async fn gauge_and_counter_namespaces_are_independent() {
		let store = MemoryStore::new();
		store.set_gauge("load", 0.5).await.unwrap();
		store.add_counter("load", 3).await.unwrap();
		assert_eq!(store.gauge("load").await.unwrap(), 0.5);
		assert_eq!(store.counter("load").await.unwrap(), 3);
	}

	#[tokio::test]
	async fn read_miss_is_not_found() {
		let store = MemoryStore::new();
		assert!(matches!(
			store.gauge("absent").await,
			Err(StorageError::NotFound { .. })
		));
		assert!(matches!(
			store.counter("absent").await,
			Err(StorageError::NotFound { .. })
		));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn counter_sum_is_independent_of_interleaving() {
		let store = Arc::new(MemoryStore::new());
		let mut handles = Vec::new();
		for _ in 0..8 {
			let store = Arc::clone(&store);
			handles.push(tokio::spawn(async move {
				for _ in 0..250 {
					store.add_counter("hits", 1).await.unwrap();
				}
			}));
		}
		for handle in handles {
			handle.await.unwrap();
		}
		assert_eq!(store.counter("hits").await.unwrap(), 2000);
	}

	#[tokio::test]
	async fn dump_and_bulk_load_round_trip() {
		let store = MemoryStore::new();
		store.set_gauge("temp", 36.6).await.unwrap();
		store.add_counter("hits", 12).await.unwrap();

		let dump = store.dump().await.unwrap();
		let restored = MemoryStore::new();
		restored.bulk_load(&dump);

		assert_eq!(restored.gauge("temp").await.unwrap(), 36.6);
		assert_eq!(restored.counter("hits").await.unwrap(), 12);
		assert_eq!(restored.dump().await.unwrap(), dump);
	}

	#[tokio::test]
	async fn ping_reports_no_durable_backend() {
		let store = MemoryStore::new();
		assert!(store.ping().await.is_err());
	}
}

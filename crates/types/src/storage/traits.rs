//! The storage capability interface
//!
//! Both backends implement this trait; the variant is chosen exactly once at
//! construction (`Arc<dyn MetricStorage>`) based on whether a database DSN is
//! configured, never re-branched per call. Synchronization is private to the
//! implementation — callers never see a lock.

use async_trait::async_trait;

use crate::metrics::{CounterMetric, GaugeMetric, MetricsDump};
use crate::storage::errors::StorageResult;

#[async_trait]
pub trait MetricStorage: Send + Sync {
	/// Read a gauge. Misses surface as `StorageError::NotFound`.
	async fn gauge(&self, name: &str) -> StorageResult<f64>;

	/// Read a counter. Misses surface as `StorageError::NotFound`.
	async fn counter(&self, name: &str) -> StorageResult<i64>;

	/// Overwrite a gauge, creating it on first update.
	async fn set_gauge(&self, name: &str, value: f64) -> StorageResult<()>;

	/// Add a signed delta to a counter, creating it at the delta on first
	/// update.
	async fn add_counter(&self, name: &str, delta: i64) -> StorageResult<()>;

	/// Apply a batch of updates as one unit: either every row lands or none
	/// does.
	async fn set_batch(
		&self,
		gauges: &[GaugeMetric],
		counters: &[CounterMetric],
	) -> StorageResult<()>;

	/// Take a consistent point-in-time snapshot of all metrics.
	async fn dump(&self) -> StorageResult<MetricsDump>;

	/// Report whether a durable backend is reachable. The in-memory variant
	/// always fails this check.
	async fn ping(&self) -> StorageResult<()>;
}

//! Core domain types for the pulse metrics pipeline
//!
//! Shared between the gateway server, the agent, and every transport front:
//! the metric entities, the JSON wire payload, and the storage contract.

pub mod metrics;
pub mod storage;

pub use metrics::{
	split_batch, CounterMetric, GaugeMetric, MetricKind, MetricPayload, MetricsDump, PayloadError,
};
pub use storage::{MetricStorage, StorageError, StorageResult};

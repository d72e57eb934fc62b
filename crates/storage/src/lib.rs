//! Storage engine for the pulse metrics gateway
//!
//! Two implementations of the `MetricStorage` contract: an in-memory map
//! store and a durable Postgres store with retry/backoff. The file snapshot
//! component layers periodic dump/restore on top of the in-memory variant.

pub mod memory;
pub mod postgres;
pub mod retry;
pub mod snapshot;

mod migrations;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use pulse_types::{MetricStorage, StorageError, StorageResult};
pub use retry::RetryPolicy;
pub use snapshot::SnapshotService;

//! Periodic file dump and startup restore for the in-memory store
//!
//! The durable backend persists itself, so this component only ever wraps
//! `MemoryStore`. Restore runs before the server accepts traffic: a missing
//! file is fine, an undecodable one aborts startup — partially-restored
//! state must not run. The steady-state loop takes the snapshot under the
//! storage lock and writes the file with the lock released; a failed write
//! is logged and the next tick tries again.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use pulse_types::{MetricsDump, StorageError, StorageResult};

use crate::memory::MemoryStore;

/// File persistence for the in-memory store.
pub struct SnapshotService {
	store: Arc<MemoryStore>,
	path: PathBuf,
}

impl SnapshotService {
	pub fn new(store: Arc<MemoryStore>, path: impl Into<PathBuf>) -> Self {
		Self {
			store,
			path: path.into(),
		}
	}

	/// Load the snapshot file into the store, if one exists.
	pub fn restore(&self) -> StorageResult<()> {
		let raw = match std::fs::read(&self.path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				info!(path = %self.path.display(), "no snapshot file, starting empty");
				return Ok(());
			},
			Err(err) => {
				return Err(StorageError::Fatal {
					message: format!("cannot read snapshot {}: {err}", self.path.display()),
				})
			},
		};
		let dump: MetricsDump =
			serde_json::from_slice(&raw).map_err(|err| StorageError::Fatal {
				message: format!("cannot decode snapshot {}: {err}", self.path.display()),
			})?;
		let restored = dump.counters.len() + dump.gauges.len();
		self.store.bulk_load(&dump);
		info!(path = %self.path.display(), restored, "snapshot restored");
		Ok(())
	}

	/// Write the current state to the snapshot file.
	pub fn save(&self) -> StorageResult<()> {
		let dump = self.store.dump_sync();
		let raw = serde_json::to_vec(&dump).map_err(|err| StorageError::Serialization {
			message: format!("serializing dump failed: {err}"),
		})?;
		std::fs::write(&self.path, raw).map_err(|err| StorageError::Connection {
			message: format!("writing snapshot {} failed: {err}", self.path.display()),
		})
	}

	/// Spawn the periodic dump loop. Write failures are logged and the loop
	/// keeps ticking; the task exits at the next tick after shutdown fires.
	pub fn spawn_periodic(
		self,
		interval: Duration,
		mut shutdown: broadcast::Receiver<()>,
	) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			// The first tick of a tokio interval fires immediately.
			ticker.tick().await;
			loop {
				tokio::select! {
					_ = shutdown.recv() => {
						// Final dump so a clean shutdown loses nothing.
						if let Err(err) = self.save() {
							error!(%err, "final snapshot save failed");
						}
						return;
					}
					_ = ticker.tick() => {
						if let Err(err) = self.save() {
							error!(%err, "periodic snapshot save failed");
						}
					}
				}
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use pulse_types::MetricStorage;

	use super::*;

	#[tokio::test]
	async fn save_then_restore_reproduces_contents() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("metrics-db.json");

		let store = Arc::new(MemoryStore::new());
		store.set_gauge("temp", 36.6).await.unwrap();
		store.add_counter("hits", 12).await.unwrap();
		SnapshotService::new(Arc::clone(&store), &path)
			.save()
			.unwrap();

		let fresh = Arc::new(MemoryStore::new());
		SnapshotService::new(Arc::clone(&fresh), &path)
			.restore()
			.unwrap();
		assert_eq!(fresh.gauge("temp").await.unwrap(), 36.6);
		assert_eq!(fresh.counter("hits").await.unwrap(), 12);
	}

	#[tokio::test]
	async fn missing_file_restores_silently() {
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(MemoryStore::new());
		let service = SnapshotService::new(store, dir.path().join("absent.json"));
		assert!(service.restore().is_ok());
	}

	#[tokio::test]
	async fn undecodable_file_is_fatal() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corrupt.json");
		std::fs::write(&path, b"{not json").unwrap();

		let service = SnapshotService::new(Arc::new(MemoryStore::new()), &path);
		assert!(matches!(
			service.restore(),
			Err(StorageError::Fatal { .. })
		));
	}

	#[tokio::test]
	async fn snapshot_file_uses_the_documented_layout() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("metrics-db.json");

		let store = Arc::new(MemoryStore::new());
		store.add_counter("hits", 3).await.unwrap();
		store.set_gauge("temp", 1.5).await.unwrap();
		SnapshotService::new(store, &path).save().unwrap();

		let raw = std::fs::read_to_string(&path).unwrap();
		let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
		assert_eq!(doc["counters"][0]["name"], "hits");
		assert_eq!(doc["counters"][0]["value"], 3);
		assert_eq!(doc["gauges"][0]["name"], "temp");
		assert_eq!(doc["gauges"][0]["value"], 1.5);
	}
}

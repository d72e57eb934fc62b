//! Error taxonomy for storage operations
//!
//! `NotFound` is a distinct read-miss condition and is never retried.
//! `Connection` is transient and retried beneath the contract; callers only
//! ever observe it as `Exhausted` once the retry budget is spent. `Fatal`
//! aborts startup (failed migration, undecodable snapshot).

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("metric not found: {id}")]
	NotFound { id: String },
	#[error("connection error: {message}")]
	Connection { message: String },
	#[error("retry budget exhausted: {message}")]
	Exhausted { message: String },
	#[error("serialization error: {message}")]
	Serialization { message: String },
	#[error("fatal storage error: {message}")]
	Fatal { message: String },
}

impl StorageError {
	/// Whether a retry policy may re-run the failed operation.
	pub fn is_transient(&self) -> bool {
		matches!(self, StorageError::Connection { .. })
	}
}

pub type StorageResult<T> = Result<T, StorageError>;

use axum::http::StatusCode;
use serde::Serialize;

use pulse_types::StorageError;

/// Error response format shared by the JSON handlers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	pub timestamp: i64,
}

impl ErrorResponse {
	pub fn new(error: &str, message: impl Into<String>) -> Self {
		Self {
			error: error.to_string(),
			message: message.into(),
			timestamp: chrono::Utc::now().timestamp(),
		}
	}
}

/// Map a storage failure to a response status without leaking internals.
/// Read misses are the only non-500 outcome.
pub fn storage_status(err: &StorageError) -> StatusCode {
	match err {
		StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
		_ => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

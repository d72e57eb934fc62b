//! Per-request timeout for the batch surface
//!
//! Exceeding the budget aborts with 504; whether the batch already landed is
//! the storage engine's transaction boundary, not this layer's.

use std::time::Duration;

use axum::{
	extract::Request,
	http::StatusCode,
	middleware::Next,
	response::{IntoResponse, Response},
};
use tracing::warn;

const BATCH_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn batch_timeout(request: Request, next: Next) -> Response {
	match tokio::time::timeout(BATCH_TIMEOUT, next.run(request)).await {
		Ok(response) => response,
		Err(_) => {
			warn!("batch update exceeded the request timeout");
			StatusCode::GATEWAY_TIMEOUT.into_response()
		},
	}
}

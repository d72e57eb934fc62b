//! Read handlers: plain-text path reads and JSON reads
//!
//! Reads distinguish a missing metric (404) from a malformed request.

use axum::{
	body::Bytes,
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use tracing::debug;

use pulse_types::{MetricKind, MetricPayload, StorageError};

use crate::handlers::common::{storage_status, ErrorResponse};
use crate::state::AppState;

/// GET /value/{kind}/{name} - plain-text value read
pub async fn get_metric_path(
	State(state): State<AppState>,
	Path((kind, name)): Path<(String, String)>,
) -> Result<String, (StatusCode, String)> {
	let kind = MetricKind::parse(&kind)
		.map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
	debug!(kind = kind.as_str(), metric = %name, "value lookup");
	match kind {
		MetricKind::Gauge => state
			.storage
			.gauge(&name)
			.await
			.map(|value| format!("{value}")),
		MetricKind::Counter => state
			.storage
			.counter(&name)
			.await
			.map(|value| format!("{value}")),
	}
	.map_err(|err| match err {
		StorageError::NotFound { .. } => (StatusCode::NOT_FOUND, "metric not found".to_string()),
		other => (storage_status(&other), "storage read failed".to_string()),
	})
}

/// POST /value/ - JSON read; the response echoes the request with the
/// resolved value or delta filled in.
pub async fn get_metric_json(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<MetricPayload>, (StatusCode, Json<ErrorResponse>)> {
	let mut payload: MetricPayload = serde_json::from_slice(&body).map_err(|err| {
		(
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(ErrorResponse::new("PARSE_ERROR", err.to_string())),
		)
	})?;

	let outcome = match payload.kind {
		MetricKind::Gauge => state
			.storage
			.gauge(&payload.id)
			.await
			.map(|value| payload.value = Some(value)),
		MetricKind::Counter => state
			.storage
			.counter(&payload.id)
			.await
			.map(|delta| payload.delta = Some(delta)),
	};

	outcome.map_err(|err| match err {
		StorageError::NotFound { id } => (
			StatusCode::NOT_FOUND,
			Json(ErrorResponse::new(
				"NOT_FOUND",
				format!("metric {id} not found"),
			)),
		),
		other => (
			storage_status(&other),
			Json(ErrorResponse::new("STORAGE_ERROR", "storage read failed")),
		),
	})?;

	Ok(Json(payload))
}

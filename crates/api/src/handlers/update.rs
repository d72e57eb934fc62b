//! Update handlers: path-parameter single, JSON single, JSON batch
//!
//! Validation order is fixed on every surface: parse the kind, reject an
//! unknown kind before touching state, parse the value for that kind, reject
//! a bad value before touching state, and only then call storage.

use axum::{
	body::Bytes,
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use tracing::{info, warn};

use pulse_types::{split_batch, MetricKind, MetricPayload};

use crate::handlers::common::{storage_status, ErrorResponse};
use crate::state::AppState;

/// POST /update/{kind}/{name}/{value} - single update via path parameters
pub async fn update_metric_path(
	State(state): State<AppState>,
	Path((kind, name, value)): Path<(String, String, String)>,
) -> Result<StatusCode, (StatusCode, String)> {
	let kind = MetricKind::parse(&kind)
		.map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
	match kind {
		MetricKind::Gauge => {
			let value: f64 = value.parse().map_err(|_| {
				(
					StatusCode::BAD_REQUEST,
					"wrong data type, float64 is expected".to_string(),
				)
			})?;
			state.storage.set_gauge(&name, value).await
		},
		MetricKind::Counter => {
			let delta: i64 = value.parse().map_err(|_| {
				(
					StatusCode::BAD_REQUEST,
					"wrong data type, int64 is expected".to_string(),
				)
			})?;
			state.storage.add_counter(&name, delta).await
		},
	}
	.map_err(|err| {
		warn!(%err, metric = %name, "path update failed");
		(storage_status(&err), "storage update failed".to_string())
	})?;
	Ok(StatusCode::OK)
}

/// POST /update/ - single update as a JSON payload, echoed back with the
/// resolved value. Undeserializable JSON answers 500; a payload missing the
/// field its kind requires is a validation error and never mutates state.
pub async fn update_metric_json(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<MetricPayload>, (StatusCode, Json<ErrorResponse>)> {
	let mut payload: MetricPayload = serde_json::from_slice(&body).map_err(|err| {
		(
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(ErrorResponse::new("PARSE_ERROR", err.to_string())),
		)
	})?;

	match payload.kind {
		MetricKind::Gauge => {
			let value = payload.gauge_value().map_err(|err| {
				(
					StatusCode::BAD_REQUEST,
					Json(ErrorResponse::new("VALIDATION_ERROR", err.to_string())),
				)
			})?;
			state
				.storage
				.set_gauge(&payload.id, value)
				.await
				.map_err(|err| {
					warn!(%err, metric = %payload.id, "gauge update failed");
					(
						storage_status(&err),
						Json(ErrorResponse::new("STORAGE_ERROR", "storage update failed")),
					)
				})?;
		},
		MetricKind::Counter => {
			let delta = payload.counter_delta().map_err(|err| {
				(
					StatusCode::BAD_REQUEST,
					Json(ErrorResponse::new("VALIDATION_ERROR", err.to_string())),
				)
			})?;
			state
				.storage
				.add_counter(&payload.id, delta)
				.await
				.map_err(|err| {
					warn!(%err, metric = %payload.id, "counter update failed");
					(
						storage_status(&err),
						Json(ErrorResponse::new("STORAGE_ERROR", "storage update failed")),
					)
				})?;
			// The echo carries the accumulated value after this delta.
			if let Ok(total) = state.storage.counter(&payload.id).await {
				payload.delta = Some(total);
			}
		},
	}

	Ok(Json(payload))
}

/// POST /updates/ - batch update applied as one all-or-nothing unit.
/// Atomicity of partial application is the storage engine's responsibility;
/// this surface only enforces the request timeout wrapped around it.
pub async fn update_batch(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
	let batch: Vec<MetricPayload> = serde_json::from_slice(&body).map_err(|err| {
		(
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(ErrorResponse::new("PARSE_ERROR", err.to_string())),
		)
	})?;

	let (gauges, counters) = split_batch(&batch).map_err(|err| {
		(
			StatusCode::BAD_REQUEST,
			Json(ErrorResponse::new("VALIDATION_ERROR", err.to_string())),
		)
	})?;

	info!(
		gauges = gauges.len(),
		counters = counters.len(),
		"applying metrics batch"
	);
	state
		.storage
		.set_batch(&gauges, &counters)
		.await
		.map_err(|err| {
			warn!(%err, "batch update failed");
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(ErrorResponse::new("STORAGE_ERROR", "batch update failed")),
			)
		})?;

	Ok(StatusCode::OK)
}

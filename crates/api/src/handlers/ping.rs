use axum::{extract::State, http::StatusCode};
use tracing::warn;

use crate::state::AppState;

/// GET /ping - 200 when the durable backend is reachable, 500 otherwise
/// (including when the gateway runs on the in-memory backend).
pub async fn ping(State(state): State<AppState>) -> StatusCode {
	match state.storage.ping().await {
		Ok(()) => StatusCode::OK,
		Err(err) => {
			warn!(%err, "ping failed");
			StatusCode::INTERNAL_SERVER_ERROR
		},
	}
}

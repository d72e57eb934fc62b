//! Trusted-subnet authorization
//!
//! Last link of the envelope: the caller's `X-Real-IP` must parse and fall
//! inside the configured CIDR before the request may touch business logic.

use axum::{
	extract::{Request, State},
	http::StatusCode,
	middleware::Next,
	response::{IntoResponse, Response},
};
use tracing::warn;

use pulse_security::{TrustedSubnet, REAL_IP_HEADER};

pub async fn filter_subnet(
	State(subnet): State<TrustedSubnet>,
	request: Request,
	next: Next,
) -> Response {
	let header = request
		.headers()
		.get(REAL_IP_HEADER)
		.and_then(|value| value.to_str().ok());
	if let Err(err) = subnet.check(header) {
		warn!(%err, "source address rejected");
		return (StatusCode::FORBIDDEN, "client address is not from the trusted subnet")
			.into_response();
	}
	next.run(request).await
}

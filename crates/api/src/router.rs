use std::sync::Arc;

use axum::{
	middleware::from_fn_with_state,
	routing::{get, post},
	Router,
};
use rsa::RsaPrivateKey;
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	decompression::RequestDecompressionLayer,
	limit::RequestBodyLimitLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};
use tracing::Level;

use pulse_security::{HmacSigner, TrustedSubnet};

use crate::handlers::{
	get_metric_json, get_metric_path, ping, update_batch, update_metric_json, update_metric_path,
};
use crate::middleware::{batch_timeout, decrypt_body, filter_subnet, verify_signature};
use crate::state::AppState;

/// Togglable pieces of the ingestion security envelope.
#[derive(Clone, Default)]
pub struct EnvelopeConfig {
	pub signer: Option<HmacSigner>,
	pub decrypt_key: Option<Arc<RsaPrivateKey>>,
	pub trusted_subnet: Option<TrustedSubnet>,
}

pub fn create_router(state: AppState, envelope: EnvelopeConfig) -> Router {
	let trace = TraceLayer::new_for_http()
		.make_span_with(|req: &axum::http::Request<_>| {
			let req_id = req
				.headers()
				.get("x-request-id")
				.and_then(|v| v.to_str().ok())
				.unwrap_or("-");
			tracing::info_span!(
				"http_request",
				method = %req.method(),
				uri = %req.uri(),
				req_id
			)
		})
		.on_request(tower_http::trace::DefaultOnRequest::new().level(Level::INFO))
		.on_response(
			tower_http::trace::DefaultOnResponse::new()
				.level(Level::INFO)
				.latency_unit(tower_http::LatencyUnit::Millis),
		);
	let req_id = ServiceBuilder::new()
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.layer(PropagateRequestIdLayer::x_request_id());
	let body_limit = RequestBodyLimitLayer::new(1024 * 1024);

	// Ingestion routes carry the full security envelope; reads and the
	// liveness probe stay outside it.
	let mut ingestion = Router::new()
		.route("/update/{kind}/{name}/{value}", post(update_metric_path))
		.route("/update/", post(update_metric_json))
		.route(
			"/updates/",
			post(update_batch).route_layer(axum::middleware::from_fn(batch_timeout)),
		);

	// Innermost layer is added first: the request passes decompression, then
	// decryption, then the signature check, then the subnet filter, and only
	// then reaches a handler. The signature covers the decrypted plaintext.
	if let Some(subnet) = envelope.trusted_subnet {
		ingestion = ingestion.layer(from_fn_with_state(subnet, filter_subnet));
	}
	if let Some(signer) = envelope.signer {
		ingestion = ingestion.layer(from_fn_with_state(signer, verify_signature));
	}
	if let Some(key) = envelope.decrypt_key {
		ingestion = ingestion.layer(from_fn_with_state(key, decrypt_body));
	}
	ingestion = ingestion.layer(RequestDecompressionLayer::new());

	let queries = Router::new()
		.route("/value/{kind}/{name}", get(get_metric_path))
		.route("/value/", post(get_metric_json))
		.route("/ping", get(ping));

	ingestion
		.merge(queries)
		.layer(CompressionLayer::new())
		.layer(trace)
		.layer(req_id)
		.layer(body_limit)
		.with_state(state)
}

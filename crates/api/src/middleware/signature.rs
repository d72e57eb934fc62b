//! HMAC-SHA256 signature verification and response signing
//!
//! Runs after decryption, so the digest covers the plaintext body. A missing,
//! malformed, or mismatching `HashSHA256` header rejects the request before
//! any handler runs. Response bodies are signed with the same header.

use axum::{
	body::Body,
	extract::{Request, State},
	http::{HeaderName, HeaderValue, StatusCode},
	middleware::Next,
	response::{IntoResponse, Response},
};
use tracing::warn;

use pulse_security::{HmacSigner, HASH_HEADER};

pub async fn verify_signature(
	State(signer): State<HmacSigner>,
	request: Request,
	next: Next,
) -> Response {
	let (parts, body) = request.into_parts();
	let bytes = match axum::body::to_bytes(body, usize::MAX).await {
		Ok(bytes) => bytes,
		Err(err) => {
			warn!(%err, "cannot read request body");
			return (StatusCode::INTERNAL_SERVER_ERROR, "cannot read provided data")
				.into_response();
		},
	};

	let header = parts
		.headers
		.get(HASH_HEADER)
		.and_then(|value| value.to_str().ok());
	let Some(header) = header else {
		warn!("request without a {HASH_HEADER} header rejected");
		return (StatusCode::BAD_REQUEST, "security sign header is not found").into_response();
	};
	if let Err(err) = signer.verify(&bytes, header) {
		warn!(%err, "request signature rejected");
		return (StatusCode::BAD_REQUEST, "wrong security sign").into_response();
	}

	let response = next
		.run(Request::from_parts(parts, Body::from(bytes)))
		.await;
	sign_response(&signer, response).await
}

async fn sign_response(signer: &HmacSigner, response: Response) -> Response {
	let (mut parts, body) = response.into_parts();
	let bytes = match axum::body::to_bytes(body, usize::MAX).await {
		Ok(bytes) => bytes,
		Err(err) => {
			warn!(%err, "cannot buffer response body for signing");
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		},
	};
	// Header names are case-insensitive on the wire; the map stores them
	// lowercased.
	let name = HeaderName::from_static("hashsha256");
	match HeaderValue::from_str(&signer.sign(&bytes)) {
		Ok(digest) => {
			parts.headers.insert(name, digest);
		},
		Err(err) => warn!(%err, "cannot encode response signature"),
	}
	Response::from_parts(parts, Body::from(bytes))
}

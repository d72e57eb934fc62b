//! Asymmetric body decryption
//!
//! Active only when a private key is configured. The ciphertext is processed
//! in key-size chunks, each opened independently with OAEP padding and
//! concatenated, mirroring the chunked encryption on the sender side. An
//! empty body passes through untouched.

use std::sync::Arc;

use axum::{
	body::Body,
	extract::{Request, State},
	http::StatusCode,
	middleware::Next,
	response::{IntoResponse, Response},
};
use rsa::RsaPrivateKey;
use tracing::warn;

use pulse_security::decrypt_chunked;

pub async fn decrypt_body(
	State(key): State<Arc<RsaPrivateKey>>,
	request: Request,
	next: Next,
) -> Response {
	let (parts, body) = request.into_parts();
	let ciphertext = match axum::body::to_bytes(body, usize::MAX).await {
		Ok(bytes) => bytes,
		Err(err) => {
			warn!(%err, "cannot read request body");
			return (StatusCode::INTERNAL_SERVER_ERROR, "cannot read provided data")
				.into_response();
		},
	};
	if ciphertext.is_empty() {
		return next.run(Request::from_parts(parts, Body::empty())).await;
	}

	let plaintext = match decrypt_chunked(&key, &ciphertext) {
		Ok(plaintext) => plaintext,
		Err(err) => {
			warn!(%err, "body decryption rejected");
			return (StatusCode::BAD_REQUEST, "cannot decrypt provided data").into_response();
		},
	};

	next.run(Request::from_parts(parts, Body::from(plaintext)))
		.await
}

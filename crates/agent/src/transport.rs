//! Delivery transports for reported batches
//!
//! The transport is a tagged variant chosen once at construction: HTTP by
//! default, the RPC surface when an RPC endpoint is configured. The HTTP
//! sender owns the outbound half of the security envelope, mirroring the
//! gateway's chain: serialize, encrypt with the receiver's public key, gzip,
//! and sign the plaintext into the `HashSHA256` header.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use rsa::RsaPublicKey;

use pulse_rpc::RpcClient;
use pulse_security::{encrypt_chunked, HmacSigner, HASH_HEADER};
use pulse_types::MetricPayload;

use crate::AgentError;

pub enum ReportTransport {
	Http(HttpSender),
	Rpc(RpcClient),
}

impl ReportTransport {
	/// Transmit one batch. Errors are returned for the reporter to log; no
	/// retry queue exists by design.
	pub async fn send(&self, batch: &[MetricPayload]) -> Result<(), AgentError> {
		match self {
			ReportTransport::Http(sender) => sender.send(batch).await,
			ReportTransport::Rpc(client) => client
				.update_batch(batch)
				.await
				.map_err(|err| AgentError::Transport(err.to_string())),
		}
	}
}

/// HTTP sender posting gzip-compressed, optionally signed and encrypted
/// batches to `/updates/`.
pub struct HttpSender {
	client: reqwest::Client,
	url: String,
	signer: Option<HmacSigner>,
	encrypt_key: Option<RsaPublicKey>,
}

impl HttpSender {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			url: url.into(),
			signer: None,
			encrypt_key: None,
		}
	}

	pub fn with_signer(mut self, signer: HmacSigner) -> Self {
		self.signer = Some(signer);
		self
	}

	pub fn with_encrypt_key(mut self, key: RsaPublicKey) -> Self {
		self.encrypt_key = Some(key);
		self
	}

	async fn send(&self, batch: &[MetricPayload]) -> Result<(), AgentError> {
		let plaintext =
			serde_json::to_vec(batch).map_err(|err| AgentError::Serialization(err.to_string()))?;

		// The signature always covers the plaintext; the gateway verifies it
		// after decompression and decryption.
		let digest = self.signer.as_ref().map(|signer| signer.sign(&plaintext));

		let mut body = plaintext;
		if let Some(key) = &self.encrypt_key {
			body = encrypt_chunked(key, &body)?;
		}

		let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
		encoder
			.write_all(&body)
			.map_err(|err| AgentError::Serialization(format!("gzip failed: {err}")))?;
		body = encoder
			.finish()
			.map_err(|err| AgentError::Serialization(format!("gzip failed: {err}")))?;

		let mut request = self
			.client
			.post(&self.url)
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.header(reqwest::header::CONTENT_ENCODING, "gzip")
			.header(reqwest::header::ACCEPT_ENCODING, "gzip")
			.body(body);
		if let Some(digest) = digest {
			request = request.header(HASH_HEADER, digest);
		}

		let response = request
			.send()
			.await
			.map_err(|err| AgentError::Transport(err.to_string()))?;
		if !response.status().is_success() {
			return Err(AgentError::Transport(format!(
				"gateway answered {}",
				response.status()
			)));
		}
		Ok(())
	}
}

//! HMAC-SHA256 body signing
//!
//! The agent signs the plaintext request body and carries the hex digest in
//! the `HashSHA256` header; the gateway recomputes the digest over the fully
//! unwrapped body and rejects on any mismatch. Responses are signed with the
//! same header. Comparison is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::SecurityError;

type HmacSha256 = Hmac<Sha256>;

/// Request header carrying the hex-encoded HMAC of the body.
pub const HASH_HEADER: &str = "HashSHA256";

/// Shared-key signer used on both ends of the pipeline.
#[derive(Clone)]
pub struct HmacSigner {
	key: Vec<u8>,
}

impl HmacSigner {
	pub fn new(key: impl AsRef<[u8]>) -> Self {
		Self {
			key: key.as_ref().to_vec(),
		}
	}

	fn mac(&self) -> HmacSha256 {
		// HMAC accepts keys of any length.
		HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length")
	}

	/// Hex digest of `body` under the shared key.
	pub fn sign(&self, body: &[u8]) -> String {
		let mut mac = self.mac();
		mac.update(body);
		hex::encode(mac.finalize().into_bytes())
	}

	/// Verify a hex digest against `body`. A missing or undecodable header
	/// value and a mismatching digest are distinct rejections.
	pub fn verify(&self, body: &[u8], header: &str) -> Result<(), SecurityError> {
		let supplied = hex::decode(header).map_err(|_| SecurityError::SignatureMissing)?;
		let mut mac = self.mac();
		mac.update(body);
		mac.verify_slice(&supplied)
			.map_err(|_| SecurityError::SignatureMismatch)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sign_is_deterministic() {
		let signer = HmacSigner::new("shared-key");
		let a = signer.sign(b"payload");
		let b = signer.sign(b"payload");
		assert_eq!(a, b);
		assert_eq!(a.len(), 64);
	}

	#[test]
	fn verify_accepts_a_valid_signature() {
		let signer = HmacSigner::new("shared-key");
		let digest = signer.sign(b"payload");
		assert!(signer.verify(b"payload", &digest).is_ok());
	}

	#[test]
	fn verify_rejects_a_tampered_body() {
		let signer = HmacSigner::new("shared-key");
		let digest = signer.sign(b"payload");
		assert!(matches!(
			signer.verify(b"tampered", &digest),
			Err(SecurityError::SignatureMismatch)
		));
	}

	#[test]
	fn verify_rejects_a_wrong_key() {
		let digest = HmacSigner::new("key-a").sign(b"payload");
		assert!(HmacSigner::new("key-b").verify(b"payload", &digest).is_err());
	}

	#[test]
	fn verify_rejects_non_hex_input() {
		let signer = HmacSigner::new("shared-key");
		assert!(matches!(
			signer.verify(b"payload", "not-hex!"),
			Err(SecurityError::SignatureMissing)
		));
	}
}

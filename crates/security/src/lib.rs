//! Security envelope primitives
//!
//! The pieces of the ordered ingestion chain that are shared between the
//! gateway middleware and the agent's sender pipeline: HMAC-SHA256 body
//! signing, chunked RSA-OAEP body encryption, and the trusted-subnet filter.

pub mod crypto;
pub mod signature;
pub mod subnet;

pub use crypto::{decrypt_chunked, encrypt_chunked, load_private_key, load_public_key};
pub use signature::{HmacSigner, HASH_HEADER};
pub use subnet::{TrustedSubnet, REAL_IP_HEADER};

use thiserror::Error;

/// Errors raised by the security envelope. All of them reject the request
/// before it reaches business logic.
#[derive(Debug, Error)]
pub enum SecurityError {
	#[error("signature verification failed")]
	SignatureMismatch,
	#[error("signature header is missing or malformed")]
	SignatureMissing,
	#[error("decryption failed: {0}")]
	Decrypt(String),
	#[error("encryption failed: {0}")]
	Encrypt(String),
	#[error("cannot load key from {path}: {message}")]
	KeyLoad { path: String, message: String },
	#[error("source address rejected: {0}")]
	SubnetRejected(String),
}

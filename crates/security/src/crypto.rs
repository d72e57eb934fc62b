//! Chunked RSA-OAEP body encryption
//!
//! RSA-OAEP can only seal a message bounded by the key size, so the sender
//! splits the plaintext into chunks of `key_size − 2·hash_size − 2` bytes
//! and encrypts each independently; the receiver walks the ciphertext in
//! key-size chunks and concatenates the decryptions. SHA-256 is the OAEP
//! hash on both sides.

use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::SecurityError;

fn oaep() -> Oaep {
	Oaep::new::<Sha256>()
}

/// Largest plaintext chunk a key of this size can seal under OAEP-SHA256.
fn plaintext_chunk_size(key: &RsaPublicKey) -> usize {
	key.size() - 2 * Sha256::output_size() - 2
}

/// Read a PEM public key, accepting both SPKI and PKCS#1 encodings.
pub fn load_public_key(path: impl AsRef<Path>) -> Result<RsaPublicKey, SecurityError> {
	let path = path.as_ref();
	let pem = std::fs::read_to_string(path).map_err(|err| SecurityError::KeyLoad {
		path: path.display().to_string(),
		message: err.to_string(),
	})?;
	RsaPublicKey::from_public_key_pem(&pem)
		.or_else(|_| RsaPublicKey::from_pkcs1_pem(&pem))
		.map_err(|err| SecurityError::KeyLoad {
			path: path.display().to_string(),
			message: err.to_string(),
		})
}

/// Read a PEM private key, accepting both PKCS#8 and PKCS#1 encodings.
pub fn load_private_key(path: impl AsRef<Path>) -> Result<RsaPrivateKey, SecurityError> {
	let path = path.as_ref();
	let pem = std::fs::read_to_string(path).map_err(|err| SecurityError::KeyLoad {
		path: path.display().to_string(),
		message: err.to_string(),
	})?;
	RsaPrivateKey::from_pkcs8_pem(&pem)
		.or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
		.map_err(|err| SecurityError::KeyLoad {
			path: path.display().to_string(),
			message: err.to_string(),
		})
}

/// Encrypt `plaintext` chunk by chunk with the receiver's public key.
pub fn encrypt_chunked(key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, SecurityError> {
	let step = plaintext_chunk_size(key);
	let mut rng = rand::thread_rng();
	let mut ciphertext = Vec::with_capacity(plaintext.len().div_ceil(step) * key.size());
	for chunk in plaintext.chunks(step) {
		let sealed = key
			.encrypt(&mut rng, oaep(), chunk)
			.map_err(|err| SecurityError::Encrypt(err.to_string()))?;
		ciphertext.extend_from_slice(&sealed);
	}
	Ok(ciphertext)
}

/// Decrypt a chunked ciphertext with the private key. The ciphertext length
/// must be a whole number of key-size chunks.
pub fn decrypt_chunked(key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, SecurityError> {
	let step = key.size();
	if ciphertext.is_empty() || ciphertext.len() % step != 0 {
		return Err(SecurityError::Decrypt(format!(
			"ciphertext length {} is not a multiple of the key size {step}",
			ciphertext.len()
		)));
	}
	let mut plaintext = Vec::with_capacity(ciphertext.len());
	for chunk in ciphertext.chunks(step) {
		let opened = key
			.decrypt(oaep(), chunk)
			.map_err(|err| SecurityError::Decrypt(err.to_string()))?;
		plaintext.extend_from_slice(&opened);
	}
	Ok(plaintext)
}

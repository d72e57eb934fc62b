//! Security-envelope middleware for ingestion routes
//!
//! The chain order is binding: decompression runs before decryption, the
//! signature check covers the decrypted plaintext, and authorization happens
//! before any business deserialization. Rejections here never reach a
//! handler.

mod decrypt;
mod signature;
mod subnet;
mod timeout;

pub use decrypt::decrypt_body;
pub use signature::verify_signature;
pub use subnet::filter_subnet;
pub use timeout::batch_timeout;

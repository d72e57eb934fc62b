//! HTTP ingestion surface for the pulse metrics gateway
//!
//! The router exposes the path-parameter, JSON single, JSON batch, and read
//! surfaces over one storage contract, wrapped in the ordered security
//! envelope: decompression, body decryption, signature verification, and the
//! trusted-subnet filter, each independently togglable.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::{create_router, EnvelopeConfig};
pub use state::AppState;

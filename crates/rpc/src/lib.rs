//! RPC ingestion surface
//!
//! A JSON-RPC 2.0 batch-update call over length-prefixed TCP, functionally
//! equivalent to the HTTP `/updates/` surface: one method accepting a list
//! of metric payloads and dispatching into the same storage contract.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::RpcClient;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, UPDATE_BATCH_METHOD};
pub use server::RpcServer;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
	#[error("connection error: {0}")]
	Connection(String),
	#[error("protocol error: {0}")]
	Protocol(String),
	#[error("remote error {code}: {message}")]
	Remote { code: i32, message: String },
}

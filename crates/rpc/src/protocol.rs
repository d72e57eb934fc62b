//! JSON-RPC 2.0 protocol types
//!
//! Request format: `{"jsonrpc": "2.0", "method": "...", "params": ..., "id": ...}`;
//! response format: `{"jsonrpc": "2.0", "result": ..., "error": ..., "id": ...}`.
//! Standard error codes: −32700 parse, −32600 invalid request, −32601 method
//! not found, −32602 invalid params, −32603 internal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The single method this surface exposes: a batch update mirroring the HTTP
/// `/updates/` endpoint.
pub const UPDATE_BATCH_METHOD: &str = "metrics.update_batch";

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
	pub jsonrpc: String,
	pub method: String,
	pub params: Value,
	pub id: Value,
}

impl JsonRpcRequest {
	pub fn new(method: impl Into<String>, params: Value, id: u64) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.to_string(),
			method: method.into(),
			params,
			id: Value::from(id),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
	pub jsonrpc: String,
	pub result: Option<Value>,
	pub error: Option<JsonRpcError>,
	pub id: Value,
}

impl JsonRpcResponse {
	pub fn success(id: Value, result: Value) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.to_string(),
			result: Some(result),
			error: None,
			id,
		}
	}

	pub fn failure(id: Value, error: JsonRpcError) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.to_string(),
			result: None,
			error: Some(error),
			id,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
	pub code: i32,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

impl JsonRpcError {
	pub fn parse_error() -> Self {
		Self {
			code: PARSE_ERROR,
			message: "Parse error".into(),
			data: None,
		}
	}

	pub fn method_not_found() -> Self {
		Self {
			code: METHOD_NOT_FOUND,
			message: "Method not found".into(),
			data: None,
		}
	}

	pub fn invalid_params(detail: impl Into<String>) -> Self {
		Self {
			code: INVALID_PARAMS,
			message: "Invalid params".into(),
			data: Some(Value::String(detail.into())),
		}
	}

	pub fn internal_error(detail: impl Into<String>) -> Self {
		Self {
			code: INTERNAL_ERROR,
			message: "Internal error".into(),
			data: Some(Value::String(detail.into())),
		}
	}
}

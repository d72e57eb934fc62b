//! RPC client used by the agent's RPC transport
//!
//! Connects per call, mirroring the fire-and-forget delivery model: a failed
//! call is logged by the reporter and the next tick supersedes it.

use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use pulse_types::MetricPayload;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse, UPDATE_BATCH_METHOD};
use crate::server::write_frame;
use crate::RpcError;

pub struct RpcClient {
	endpoint: String,
}

impl RpcClient {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
		}
	}

	/// Send one batch-update call and wait for the acknowledgement.
	pub async fn update_batch(&self, batch: &[MetricPayload]) -> Result<(), RpcError> {
		let params =
			serde_json::to_value(batch).map_err(|err| RpcError::Protocol(err.to_string()))?;
		self.call(UPDATE_BATCH_METHOD, params).await.map(|_| ())
	}

	/// Issue a single JSON-RPC call over a fresh connection.
	pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
		let mut stream = TcpStream::connect(&self.endpoint).await.map_err(|err| {
			RpcError::Connection(format!("failed to connect {}: {err}", self.endpoint))
		})?;

		let request = JsonRpcRequest::new(method, params, 1);
		write_frame(&mut stream, &request).await?;

		let mut len_buf = [0u8; 4];
		stream
			.read_exact(&mut len_buf)
			.await
			.map_err(|err| RpcError::Connection(err.to_string()))?;
		let len = u32::from_be_bytes(len_buf) as usize;
		let mut buf = vec![0u8; len];
		stream
			.read_exact(&mut buf)
			.await
			.map_err(|err| RpcError::Connection(err.to_string()))?;

		let response: JsonRpcResponse =
			serde_json::from_slice(&buf).map_err(|err| RpcError::Protocol(err.to_string()))?;
		if let Some(error) = response.error {
			return Err(RpcError::Remote {
				code: error.code,
				message: error.message,
			});
		}
		Ok(response.result.unwrap_or(Value::Null))
	}
}

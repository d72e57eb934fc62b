//! TCP server for the RPC surface
//!
//! Messages are framed with a big-endian u32 length prefix followed by the
//! JSON body. Each connection is served by its own task and processes
//! requests until the peer closes or shutdown fires.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use pulse_types::{split_batch, MetricPayload, MetricStorage};

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, UPDATE_BATCH_METHOD};
use crate::RpcError;

/// Frames above this size are rejected outright.
const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

pub struct RpcServer {
	listener: TcpListener,
}

impl RpcServer {
	pub async fn bind(addr: &str) -> Result<Self, RpcError> {
		let listener = TcpListener::bind(addr)
			.await
			.map_err(|err| RpcError::Connection(format!("failed to bind {addr}: {err}")))?;
		Ok(Self { listener })
	}

	pub fn local_addr(&self) -> Result<std::net::SocketAddr, RpcError> {
		self.listener
			.local_addr()
			.map_err(|err| RpcError::Connection(err.to_string()))
	}

	/// Accept connections until shutdown fires. Every request dispatches into
	/// the shared storage contract.
	pub async fn run(self, storage: Arc<dyn MetricStorage>, mut shutdown: broadcast::Receiver<()>) {
		info!(addr = ?self.listener.local_addr().ok(), "rpc surface listening");
		loop {
			tokio::select! {
				_ = shutdown.recv() => {
					info!("rpc surface shutting down");
					return;
				}
				accepted = self.listener.accept() => {
					let (stream, peer) = match accepted {
						Ok(pair) => pair,
						Err(err) => {
							warn!(%err, "rpc accept failed");
							continue;
						},
					};
					debug!(%peer, "rpc connection established");
					let storage = Arc::clone(&storage);
					tokio::spawn(async move {
						if let Err(err) = handle_connection(stream, storage).await {
							debug!(%err, %peer, "rpc connection closed");
						}
					});
				}
			}
		}
	}
}

async fn handle_connection(
	mut stream: TcpStream,
	storage: Arc<dyn MetricStorage>,
) -> Result<(), RpcError> {
	loop {
		let mut len_buf = [0u8; 4];
		match stream.read_exact(&mut len_buf).await {
			Ok(_) => {},
			Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
			Err(err) => return Err(RpcError::Connection(err.to_string())),
		}
		let len = u32::from_be_bytes(len_buf) as usize;
		if len > MAX_MESSAGE_SIZE {
			return Err(RpcError::Protocol(format!(
				"message too large: {len} bytes"
			)));
		}

		let mut buf = vec![0u8; len];
		stream
			.read_exact(&mut buf)
			.await
			.map_err(|err| RpcError::Connection(err.to_string()))?;

		let response = match serde_json::from_slice::<JsonRpcRequest>(&buf) {
			Ok(request) => dispatch(request, &storage).await,
			Err(err) => {
				warn!(%err, "undecodable rpc request");
				JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error())
			},
		};
		write_frame(&mut stream, &response).await?;
	}
}

async fn dispatch(request: JsonRpcRequest, storage: &Arc<dyn MetricStorage>) -> JsonRpcResponse {
	if request.method != UPDATE_BATCH_METHOD {
		return JsonRpcResponse::failure(request.id, JsonRpcError::method_not_found());
	}

	let batch: Vec<MetricPayload> = match serde_json::from_value(request.params) {
		Ok(batch) => batch,
		Err(err) => {
			return JsonRpcResponse::failure(request.id, JsonRpcError::invalid_params(err.to_string()))
		},
	};
	let (gauges, counters) = match split_batch(&batch) {
		Ok(split) => split,
		Err(err) => {
			return JsonRpcResponse::failure(request.id, JsonRpcError::invalid_params(err.to_string()))
		},
	};

	match storage.set_batch(&gauges, &counters).await {
		Ok(()) => JsonRpcResponse::success(
			request.id,
			serde_json::json!({ "applied": gauges.len() + counters.len() }),
		),
		Err(err) => {
			warn!(%err, "rpc batch update failed");
			JsonRpcResponse::failure(request.id, JsonRpcError::internal_error("batch update failed"))
		},
	}
}

pub(crate) async fn write_frame<T: serde::Serialize>(
	stream: &mut TcpStream,
	message: &T,
) -> Result<(), RpcError> {
	let raw = serde_json::to_vec(message).map_err(|err| RpcError::Protocol(err.to_string()))?;
	let len = u32::try_from(raw.len())
		.map_err(|_| RpcError::Protocol("message too large to frame".to_string()))?;
	stream
		.write_all(&len.to_be_bytes())
		.await
		.map_err(|err| RpcError::Connection(err.to_string()))?;
	stream
		.write_all(&raw)
		.await
		.map_err(|err| RpcError::Connection(err.to_string()))?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use pulse_storage::MemoryStore;
	use pulse_types::MetricPayload;

	use super::*;
	use crate::client::RpcClient;

	#[tokio::test]
	async fn batch_lands_through_the_rpc_surface() {
		let store = Arc::new(MemoryStore::new());
		let server = RpcServer::bind("127.0.0.1:0").await.unwrap();
		let addr = server.local_addr().unwrap();

		let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
		let storage: Arc<dyn MetricStorage> = Arc::clone(&store) as Arc<dyn MetricStorage>;
		let handle = tokio::spawn(server.run(storage, shutdown_rx));

		let client = RpcClient::new(addr.to_string());
		client
			.update_batch(&[
				MetricPayload::gauge("temp", 36.6),
				MetricPayload::counter("hits", 5),
				MetricPayload::counter("hits", 7),
			])
			.await
			.unwrap();

		assert_eq!(store.gauge("temp").await.unwrap(), 36.6);
		assert_eq!(store.counter("hits").await.unwrap(), 12);

		shutdown_tx.send(()).unwrap();
		handle.await.unwrap();
	}

	#[tokio::test]
	async fn unknown_method_is_rejected() {
		let server = RpcServer::bind("127.0.0.1:0").await.unwrap();
		let addr = server.local_addr().unwrap();
		let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
		let storage: Arc<dyn MetricStorage> = Arc::new(MemoryStore::new());
		let handle = tokio::spawn(server.run(storage, shutdown_rx));

		let client = RpcClient::new(addr.to_string());
		let err = client
			.call("metrics.drop_all", serde_json::json!([]))
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			RpcError::Remote { code, .. } if code == crate::protocol::METHOD_NOT_FOUND
		));

		shutdown_tx.send(()).unwrap();
		handle.await.unwrap();
	}

	#[tokio::test]
	async fn a_payload_missing_its_field_is_invalid_params() {
		let store = Arc::new(MemoryStore::new());
		let server = RpcServer::bind("127.0.0.1:0").await.unwrap();
		let addr = server.local_addr().unwrap();
		let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
		let storage: Arc<dyn MetricStorage> = Arc::clone(&store) as Arc<dyn MetricStorage>;
		let handle = tokio::spawn(server.run(storage, shutdown_rx));

		let client = RpcClient::new(addr.to_string());
		let err = client
			.call(
				UPDATE_BATCH_METHOD,
				serde_json::json!([{"id":"hits","type":"counter"}]),
			)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			RpcError::Remote { code, .. } if code == crate::protocol::INVALID_PARAMS
		));
		assert!(store.dump().await.unwrap().is_empty());

		shutdown_tx.send(()).unwrap();
		handle.await.unwrap();
	}
}

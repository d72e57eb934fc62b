//! Full pipeline: agent collection and delivery into a live gateway
//!
//! Exercises the sender and receiver halves of the security envelope against
//! each other: gzip, chunked RSA encryption, and HMAC signing all enabled.

mod mocks;

use std::sync::Arc;
use std::time::Duration;

use mocks::{memory_only_settings, TestServer};
use rsa::{RsaPrivateKey, RsaPublicKey};

use pulse_agent::{Collector, ConcurrencyGate, HttpSender, Reporter, ReportTransport};
use pulse_gateway::{EnvelopeConfig, MemoryStore, MetricStorage, ServerBuilder};
use pulse_security::HmacSigner;

async fn run_agent_tick(transport: ReportTransport) {
	let agent_store = Arc::new(MemoryStore::new());
	let mut collector = Collector::new(Arc::clone(&agent_store), Duration::from_secs(2));
	collector.poll_once().await;

	let reporter = Reporter::new(
		agent_store,
		transport,
		ConcurrencyGate::new(1),
		Duration::from_secs(10),
	);
	reporter.report_once().await;
}

#[tokio::test]
async fn plain_delivery_lands_collected_metrics() {
	let gateway_store = Arc::new(MemoryStore::new());
	let server = TestServer::spawn(
		ServerBuilder::new()
			.with_settings(memory_only_settings())
			.with_storage(Arc::clone(&gateway_store) as Arc<dyn MetricStorage>),
	)
	.await
	.unwrap();

	run_agent_tick(ReportTransport::Http(HttpSender::new(
		server.url("/updates/"),
	)))
	.await;

	assert_eq!(gateway_store.counter("PollCount").await.unwrap(), 1);
	assert!(gateway_store.gauge("RandomValue").await.is_ok());

	server.runtime.stop().await;
}

#[tokio::test]
async fn signed_and_encrypted_delivery_round_trips() {
	let private = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
	let public = RsaPublicKey::from(&private);

	let gateway_store = Arc::new(MemoryStore::new());
	let envelope = EnvelopeConfig {
		signer: Some(HmacSigner::new("shared-key")),
		decrypt_key: Some(Arc::new(private)),
		trusted_subnet: None,
	};
	let server = TestServer::spawn(
		ServerBuilder::new()
			.with_settings(memory_only_settings())
			.with_storage(Arc::clone(&gateway_store) as Arc<dyn MetricStorage>)
			.with_envelope(envelope),
	)
	.await
	.unwrap();

	let sender = HttpSender::new(server.url("/updates/"))
		.with_signer(HmacSigner::new("shared-key"))
		.with_encrypt_key(public);
	run_agent_tick(ReportTransport::Http(sender)).await;

	assert_eq!(gateway_store.counter("PollCount").await.unwrap(), 1);

	server.runtime.stop().await;
}

#[tokio::test]
async fn a_sender_with_the_wrong_key_is_rejected() {
	let gateway_store = Arc::new(MemoryStore::new());
	let envelope = EnvelopeConfig {
		signer: Some(HmacSigner::new("shared-key")),
		decrypt_key: None,
		trusted_subnet: None,
	};
	let server = TestServer::spawn(
		ServerBuilder::new()
			.with_settings(memory_only_settings())
			.with_storage(Arc::clone(&gateway_store) as Arc<dyn MetricStorage>)
			.with_envelope(envelope),
	)
	.await
	.unwrap();

	let sender = HttpSender::new(server.url("/updates/"))
		.with_signer(HmacSigner::new("stolen-key"));
	run_agent_tick(ReportTransport::Http(sender)).await;

	// Delivery is fire-and-forget: the reporter logged the rejection and
	// nothing reached storage.
	assert!(gateway_store.dump().await.unwrap().is_empty());

	server.runtime.stop().await;
}

#[tokio::test]
async fn rpc_delivery_mirrors_the_http_batch_surface() {
	let gateway_store = Arc::new(MemoryStore::new());
	let settings = pulse_gateway::ServerSettings {
		rpc_address: Some("127.0.0.1:0".to_string()),
		..memory_only_settings()
	};

	// Bind the RPC surface by hand so the test can learn the ephemeral port.
	let rpc_server = pulse_gateway::RpcServer::bind("127.0.0.1:0").await.unwrap();
	let rpc_addr = rpc_server.local_addr().unwrap();
	let server = TestServer::spawn(
		ServerBuilder::new()
			.with_settings(pulse_gateway::ServerSettings {
				rpc_address: None,
				..settings
			})
			.with_storage(Arc::clone(&gateway_store) as Arc<dyn MetricStorage>),
	)
	.await
	.unwrap();
	let rpc_task = tokio::spawn(rpc_server.run(
		Arc::clone(&gateway_store) as Arc<dyn MetricStorage>,
		server.runtime.shutdown.subscribe(),
	));

	run_agent_tick(ReportTransport::Rpc(pulse_gateway::RpcClient::new(
		rpc_addr.to_string(),
	)))
	.await;

	assert_eq!(gateway_store.counter("PollCount").await.unwrap(), 1);

	server.runtime.stop().await;
	rpc_task.abort();
}

//! Agent entry point: wire the collector and reporter together and run both
//! until interrupted.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::info;

use pulse_agent::{Collector, ConcurrencyGate, HttpSender, Reporter, ReportTransport};
use pulse_config::{load_agent_settings, AgentArgs, AgentSettings};
use pulse_rpc::RpcClient;
use pulse_security::{load_public_key, HmacSigner};
use pulse_storage::MemoryStore;

fn build_transport(settings: &AgentSettings) -> Result<ReportTransport, Box<dyn std::error::Error>> {
	if let Some(endpoint) = &settings.rpc_endpoint {
		info!(%endpoint, "delivering over the rpc transport");
		return Ok(ReportTransport::Rpc(RpcClient::new(endpoint.clone())));
	}

	let mut sender = HttpSender::new(settings.updates_url());
	if !settings.key.is_empty() {
		sender = sender.with_signer(HmacSigner::new(&settings.key));
	}
	if let Some(path) = &settings.crypto_key {
		sender = sender.with_encrypt_key(load_public_key(path)?);
	}
	Ok(ReportTransport::Http(sender))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();
	let settings = load_agent_settings(AgentArgs::parse())?;

	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level));
	tracing_subscriber::fmt().with_env_filter(env_filter).init();

	info!(
		endpoint = %settings.endpoint,
		poll = settings.poll_interval,
		report = settings.report_interval,
		rate_limit = settings.rate_limit,
		"starting agent"
	);

	let storage = Arc::new(MemoryStore::new());
	let transport = build_transport(&settings)?;
	let gate = ConcurrencyGate::new(settings.rate_limit);

	let (shutdown_tx, _) = broadcast::channel(1);

	let collector = Collector::new(
		Arc::clone(&storage),
		Duration::from_secs(settings.poll_interval),
	)
	.spawn(shutdown_tx.subscribe());
	let reporter = Reporter::new(
		storage,
		transport,
		gate,
		Duration::from_secs(settings.report_interval),
	)
	.spawn(shutdown_tx.subscribe());

	tokio::signal::ctrl_c().await?;
	info!("shutting down the agent");
	let _ = shutdown_tx.send(());

	// Both tasks finish their in-flight tick before the process exits.
	collector.await?;
	reporter.await?;
	info!("agent stopped");
	Ok(())
}

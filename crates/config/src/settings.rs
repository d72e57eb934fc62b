//! Settings structures and CLI flag definitions

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::loader::ConfigError;

/// Resolved gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
	/// host:port the HTTP surface listens on.
	pub address: String,
	pub log_level: String,
	/// Seconds between snapshot dumps; 0 disables the periodic dump.
	pub store_interval: u64,
	/// Snapshot file path; empty disables file persistence entirely.
	pub file_store_path: String,
	/// Whether to load the snapshot file at startup.
	pub restore: bool,
	/// Postgres connection string; empty selects the in-memory backend.
	pub database_dsn: String,
	/// Shared HMAC signing key; empty disables signature checking.
	pub key: String,
	/// Path to the PEM private key; unset disables body decryption.
	pub crypto_key: Option<PathBuf>,
	/// CIDR of permitted source addresses; empty disables the filter.
	pub trusted_subnet: String,
	/// host:port the RPC surface listens on; unset disables it.
	pub rpc_address: Option<String>,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			address: "localhost:8080".to_string(),
			log_level: "info".to_string(),
			store_interval: 300,
			file_store_path: "/tmp/metrics-db.json".to_string(),
			restore: true,
			database_dsn: String::new(),
			key: String::new(),
			crypto_key: None,
			trusted_subnet: String::new(),
			rpc_address: None,
		}
	}
}

impl ServerSettings {
	/// The listen address as a socket address, resolving a bare `host:port`.
	pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
		use std::net::ToSocketAddrs;
		self.address
			.to_socket_addrs()
			.ok()
			.and_then(|mut addrs| addrs.next())
			.ok_or_else(|| ConfigError::InvalidValue {
				field: "address",
				value: self.address.clone(),
			})
	}
}

/// Gateway server command-line flags. Unset flags fall through to the
/// environment, the config file, and finally the defaults.
#[derive(Debug, Default, Parser)]
#[command(name = "pulse-gateway", about = "Central collector for pushed metrics")]
pub struct ServerArgs {
	#[arg(short = 'a', long, help = "server host:port")]
	pub address: Option<String>,
	#[arg(short = 'l', long, help = "log level")]
	pub log_level: Option<String>,
	#[arg(short = 'i', long, help = "snapshot store interval, seconds")]
	pub store_interval: Option<u64>,
	#[arg(short = 'f', long, help = "snapshot file path")]
	pub file_store_path: Option<String>,
	#[arg(short = 'r', long, help = "restore the snapshot at startup")]
	pub restore: Option<bool>,
	#[arg(short = 'd', long, help = "postgres connection string")]
	pub database_dsn: Option<String>,
	#[arg(short = 'k', long, help = "HMAC signing key")]
	pub key: Option<String>,
	#[arg(long, help = "path to the PEM private decryption key")]
	pub crypto_key: Option<PathBuf>,
	#[arg(short = 't', long, help = "trusted subnet (CIDR)")]
	pub trusted_subnet: Option<String>,
	#[arg(long, help = "RPC listen host:port")]
	pub rpc_address: Option<String>,
	#[arg(short = 'c', long, help = "path to the configuration file")]
	pub config: Option<PathBuf>,
}

/// Config-file shape for the server; field names follow the persisted JSON
/// document.
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
	pub address: Option<String>,
	pub store_interval: Option<u64>,
	pub store_file: Option<String>,
	pub restore: Option<bool>,
	pub database_dsn: Option<String>,
	pub crypto_key: Option<PathBuf>,
	pub trusted_subnet: Option<String>,
	pub rpc_address: Option<String>,
}

/// Resolved agent configuration.
#[derive(Debug, Clone)]
pub struct AgentSettings {
	/// host:port of the gateway server.
	pub endpoint: String,
	pub log_level: String,
	/// Seconds between report-task ticks.
	pub report_interval: u64,
	/// Seconds between poll-task ticks.
	pub poll_interval: u64,
	/// Shared HMAC signing key; empty disables signing.
	pub key: String,
	/// Path to the PEM public key; unset disables body encryption.
	pub crypto_key: Option<PathBuf>,
	/// Maximum simultaneous outbound sends.
	pub rate_limit: usize,
	/// host:port of the gateway RPC surface; set selects the RPC transport.
	pub rpc_endpoint: Option<String>,
}

impl Default for AgentSettings {
	fn default() -> Self {
		Self {
			endpoint: "localhost:8080".to_string(),
			log_level: "info".to_string(),
			report_interval: 10,
			poll_interval: 2,
			key: String::new(),
			crypto_key: None,
			rate_limit: 1,
			rpc_endpoint: None,
		}
	}
}

impl AgentSettings {
	/// Full URL of the batch-update endpoint.
	pub fn updates_url(&self) -> String {
		format!("http://{}/updates/", self.endpoint)
	}
}

/// Agent command-line flags.
#[derive(Debug, Default, Parser)]
#[command(name = "pulse-agent", about = "Metrics collection and delivery agent")]
pub struct AgentArgs {
	#[arg(short = 'a', long, help = "gateway host:port")]
	pub endpoint: Option<String>,
	#[arg(long, help = "log level")]
	pub log_level: Option<String>,
	#[arg(short = 'r', long, help = "report interval, seconds")]
	pub report_interval: Option<u64>,
	#[arg(short = 'p', long, help = "poll interval, seconds")]
	pub poll_interval: Option<u64>,
	#[arg(short = 'k', long, help = "HMAC signing key")]
	pub key: Option<String>,
	#[arg(long, help = "path to the PEM public encryption key")]
	pub crypto_key: Option<PathBuf>,
	#[arg(short = 'l', long, help = "max simultaneous outbound sends")]
	pub rate_limit: Option<usize>,
	#[arg(long, help = "gateway RPC host:port; selects the RPC transport")]
	pub rpc_endpoint: Option<String>,
	#[arg(short = 'c', long, help = "path to the configuration file")]
	pub config: Option<PathBuf>,
}

/// Config-file shape for the agent.
#[derive(Debug, Default, Deserialize)]
pub struct AgentFileConfig {
	pub address: Option<String>,
	pub report_interval: Option<u64>,
	pub poll_interval: Option<u64>,
	pub crypto_key: Option<PathBuf>,
	pub rpc_endpoint: Option<String>,
}

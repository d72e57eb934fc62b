//! Pulse metrics gateway
//!
//! The central collector of the pipeline: agents push signed, compressed
//! metric batches here over HTTP or RPC, and the gateway stores them in
//! memory (with optional file snapshots) or in Postgres when a connection
//! string is configured.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

// Core domain types
pub use pulse_types::{
	CounterMetric, GaugeMetric, MetricKind, MetricPayload, MetricsDump, MetricStorage,
	StorageError,
};

// Storage layer
pub use pulse_storage::{MemoryStore, PostgresStore, RetryPolicy, SnapshotService};

// API layer
pub use pulse_api::{create_router, AppState, EnvelopeConfig};

// RPC layer
pub use pulse_rpc::{RpcClient, RpcServer};

// Config
pub use pulse_config::{load_server_settings, ServerArgs, ServerSettings};

use pulse_security::{load_private_key, HmacSigner, TrustedSubnet};

/// Background pieces started alongside the router. Dropping the shutdown
/// sender (or sending on it) stops them.
pub struct ServerRuntime {
	pub shutdown: broadcast::Sender<()>,
	pub snapshot_task: Option<JoinHandle<()>>,
	pub rpc_task: Option<JoinHandle<()>>,
}

impl ServerRuntime {
	/// Signal shutdown and wait for the background tasks to exit.
	pub async fn stop(self) {
		let _ = self.shutdown.send(());
		if let Some(task) = self.snapshot_task {
			let _ = task.await;
		}
		if let Some(task) = self.rpc_task {
			let _ = task.await;
		}
	}
}

/// Builder pattern for configuring the gateway
pub struct ServerBuilder {
	settings: Option<ServerSettings>,
	storage: Option<Arc<dyn MetricStorage>>,
	envelope: Option<EnvelopeConfig>,
}

impl Default for ServerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ServerBuilder {
	pub fn new() -> Self {
		Self {
			settings: None,
			storage: None,
			envelope: None,
		}
	}

	/// Set custom settings
	pub fn with_settings(mut self, settings: ServerSettings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Inject a pre-built storage backend, bypassing DSN-based selection.
	pub fn with_storage(mut self, storage: Arc<dyn MetricStorage>) -> Self {
		self.storage = Some(storage);
		self
	}

	/// Inject a pre-built security envelope, bypassing settings-based
	/// construction.
	pub fn with_envelope(mut self, envelope: EnvelopeConfig) -> Self {
		self.envelope = Some(envelope);
		self
	}

	fn build_envelope(
		settings: &ServerSettings,
	) -> Result<EnvelopeConfig, Box<dyn std::error::Error>> {
		let signer = if settings.key.is_empty() {
			None
		} else {
			Some(HmacSigner::new(&settings.key))
		};
		let decrypt_key = match &settings.crypto_key {
			Some(path) => Some(Arc::new(load_private_key(path)?)),
			None => None,
		};
		let trusted_subnet = if settings.trusted_subnet.is_empty() {
			None
		} else {
			Some(TrustedSubnet::parse(&settings.trusted_subnet)?)
		};
		Ok(EnvelopeConfig {
			signer,
			decrypt_key,
			trusted_subnet,
		})
	}

	/// Select the backend, restore the snapshot, start the background tasks,
	/// and return the configured router with its runtime handles.
	pub async fn start(
		self,
	) -> Result<(axum::Router, AppState, ServerRuntime), Box<dyn std::error::Error>> {
		let settings = self.settings.clone().unwrap_or_default();
		let (shutdown, _) = broadcast::channel(1);
		let mut snapshot_task = None;

		let storage: Arc<dyn MetricStorage> = match self.storage {
			Some(storage) => storage,
			None if !settings.database_dsn.is_empty() => {
				let store = PostgresStore::connect(&settings.database_dsn).await?;
				info!("durable backend selected");
				Arc::new(store)
			},
			None => {
				let store = Arc::new(MemoryStore::new());
				if !settings.file_store_path.is_empty() {
					let snapshot =
						SnapshotService::new(Arc::clone(&store), &settings.file_store_path);
					if settings.restore {
						// An undecodable snapshot aborts startup here;
						// partially-restored state must not run.
						snapshot.restore()?;
					}
					if settings.store_interval > 0 {
						snapshot_task = Some(snapshot.spawn_periodic(
							Duration::from_secs(settings.store_interval),
							shutdown.subscribe(),
						));
					}
				}
				info!("in-memory backend selected");
				store
			},
		};

		let envelope = match self.envelope {
			Some(envelope) => envelope,
			None => Self::build_envelope(&settings)?,
		};

		let state = AppState::new(Arc::clone(&storage));
		let router = create_router(state.clone(), envelope);

		let rpc_task = match &settings.rpc_address {
			Some(addr) => {
				let server = RpcServer::bind(addr).await?;
				Some(tokio::spawn(
					server.run(Arc::clone(&storage), shutdown.subscribe()),
				))
			},
			None => None,
		};

		let runtime = ServerRuntime {
			shutdown,
			snapshot_task,
			rpc_task,
		};
		Ok((router, state, runtime))
	}

	/// Start the complete server: load configuration, initialize tracing,
	/// bind, and serve until interrupted.
	pub async fn start_server(mut self) -> Result<(), Box<dyn std::error::Error>> {
		dotenvy::dotenv().ok();

		let settings = match self.settings.take() {
			Some(settings) => settings,
			None => {
				use clap::Parser;
				load_server_settings(ServerArgs::parse())?
			},
		};

		let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level));
		tracing_subscriber::fmt().with_env_filter(env_filter).init();

		let addr = settings.socket_addr()?;
		self.settings = Some(settings);
		let (router, _, runtime) = self.start().await?;

		let listener = tokio::net::TcpListener::bind(addr).await?;
		info!(%addr, "gateway listening");
		info!("API endpoints available:");
		info!("  POST /update/{{type}}/{{name}}/{{value}}");
		info!("  GET  /value/{{type}}/{{name}}");
		info!("  POST /update/");
		info!("  POST /updates/");
		info!("  POST /value/");
		info!("  GET  /ping");

		let shutdown = runtime.shutdown.clone();
		axum::serve(listener, router)
			.with_graceful_shutdown(async move {
				let _ = tokio::signal::ctrl_c().await;
				info!("shutting down the gateway");
			})
			.await?;

		let _ = shutdown.send(());
		runtime.stop().await;
		info!("gateway stopped");
		Ok(())
	}
}

//! Test server for integration tests
//!
//! Spawns the real gateway on an ephemeral port so the e2e suites can drive
//! it with a plain HTTP client.

use pulse_gateway::{ServerBuilder, ServerRuntime};
use tokio::task::JoinHandle;

pub struct TestServer {
	pub base_url: String,
	#[allow(dead_code)]
	pub handle: JoinHandle<()>,
	pub runtime: ServerRuntime,
}

impl TestServer {
	/// Spawn a gateway built from the given builder.
	pub async fn spawn(builder: ServerBuilder) -> Result<Self, Box<dyn std::error::Error>> {
		let (router, _state, runtime) = builder.start().await?;

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
		let base_url = format!("http://{}", listener.local_addr()?);
		let handle = tokio::spawn(async move {
			axum::serve(listener, router).await.expect("test server failed");
		});

		Ok(Self {
			base_url,
			handle,
			runtime,
		})
	}

	pub fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}
}

/// Settings with file persistence disabled, for suites that don't exercise
/// snapshots.
#[allow(dead_code)]
pub fn memory_only_settings() -> pulse_gateway::ServerSettings {
	pulse_gateway::ServerSettings {
		file_store_path: String::new(),
		restore: false,
		..Default::default()
	}
}

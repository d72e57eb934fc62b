//! Pulse Gateway Server
//!
//! Main entry point for the metrics gateway

use pulse_gateway::ServerBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// Start the complete server with all defaults and setup handled automatically
	ServerBuilder::new().start_server().await
}

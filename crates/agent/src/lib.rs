//! Metrics collection and delivery agent
//!
//! Two independently ticked tasks share one in-memory store: the collector
//! samples process and host gauges every poll interval, and the reporter
//! ships a consistent snapshot to the gateway every report interval, gated
//! by a bounded concurrency semaphore. Delivery is fire-and-forget: a failed
//! send is logged and the next tick's snapshot supersedes it.

pub mod collector;
pub mod gate;
pub mod reporter;
pub mod transport;

pub use collector::Collector;
pub use gate::ConcurrencyGate;
pub use reporter::Reporter;
pub use transport::{HttpSender, ReportTransport};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
	#[error("serialization failed: {0}")]
	Serialization(String),
	#[error("transport failed: {0}")]
	Transport(String),
	#[error(transparent)]
	Security(#[from] pulse_security::SecurityError),
}

use std::sync::Arc;

use pulse_types::MetricStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
	pub storage: Arc<dyn MetricStorage>,
}

impl AppState {
	pub fn new(storage: Arc<dyn MetricStorage>) -> Self {
		Self { storage }
	}
}

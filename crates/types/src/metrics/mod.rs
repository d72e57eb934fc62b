//! Metric entities and the JSON wire payload
//!
//! Two metric kinds exist. A gauge is a point-in-time measurement that is
//! overwritten on every update; a counter accumulates signed deltas and is
//! never reset or deleted. Names are unique within a kind, and the same name
//! may exist as both a gauge and a counter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point-in-time measurement. Each update replaces the previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeMetric {
	pub name: String,
	pub value: f64,
}

/// An accumulating measurement. Each update adds a signed delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterMetric {
	pub name: String,
	pub value: i64,
}

/// A full point-in-time snapshot of every stored metric.
///
/// This is the persisted snapshot-file format and the shape bulk-loaded on
/// restore. Field order matches the on-disk document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsDump {
	pub counters: Vec<CounterMetric>,
	pub gauges: Vec<GaugeMetric>,
}

impl MetricsDump {
	pub fn is_empty(&self) -> bool {
		self.counters.is_empty() && self.gauges.is_empty()
	}

	/// Flatten the snapshot into wire payloads for batch delivery.
	pub fn into_payloads(self) -> Vec<MetricPayload> {
		let mut batch = Vec::with_capacity(self.gauges.len() + self.counters.len());
		for gauge in self.gauges {
			batch.push(MetricPayload::gauge(gauge.name, gauge.value));
		}
		for counter in self.counters {
			batch.push(MetricPayload::counter(counter.name, counter.value));
		}
		batch
	}
}

/// The two metric kinds carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
	Gauge,
	Counter,
}

impl MetricKind {
	/// Parse a path-parameter kind. Unknown kinds are a validation error,
	/// rejected before any state is touched.
	pub fn parse(raw: &str) -> Result<Self, PayloadError> {
		match raw {
			"gauge" => Ok(MetricKind::Gauge),
			"counter" => Ok(MetricKind::Counter),
			other => Err(PayloadError::UnknownKind {
				kind: other.to_string(),
			}),
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			MetricKind::Gauge => "gauge",
			MetricKind::Counter => "counter",
		}
	}
}

/// Errors raised while interpreting a metric payload or path parameters.
///
/// These are validation failures: the request is rejected and storage is
/// never mutated.
#[derive(Debug, Error)]
pub enum PayloadError {
	#[error("unknown metric kind: {kind}")]
	UnknownKind { kind: String },
	#[error("metric {id} is missing its {field} field")]
	MissingField { id: String, field: &'static str },
}

/// JSON wire representation of one metric update or read.
///
/// `value` carries gauge readings, `delta` counter increments; exactly one is
/// expected for the kind. Read responses resolve the matching field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPayload {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: MetricKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delta: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<f64>,
}

impl MetricPayload {
	pub fn gauge(id: impl Into<String>, value: f64) -> Self {
		Self {
			id: id.into(),
			kind: MetricKind::Gauge,
			delta: None,
			value: Some(value),
		}
	}

	pub fn counter(id: impl Into<String>, delta: i64) -> Self {
		Self {
			id: id.into(),
			kind: MetricKind::Counter,
			delta: Some(delta),
			value: None,
		}
	}

	/// The gauge value, or a validation error if the field is absent.
	pub fn gauge_value(&self) -> Result<f64, PayloadError> {
		self.value.ok_or(PayloadError::MissingField {
			id: self.id.clone(),
			field: "value",
		})
	}

	/// The counter delta, or a validation error if the field is absent.
	pub fn counter_delta(&self) -> Result<i64, PayloadError> {
		self.delta.ok_or(PayloadError::MissingField {
			id: self.id.clone(),
			field: "delta",
		})
	}
}

/// Split a wire batch into typed gauge/counter lists, validating that every
/// entry carries the field its kind requires.
pub fn split_batch(
	batch: &[MetricPayload],
) -> Result<(Vec<GaugeMetric>, Vec<CounterMetric>), PayloadError> {
	let mut gauges = Vec::new();
	let mut counters = Vec::new();
	for payload in batch {
		match payload.kind {
			MetricKind::Gauge => gauges.push(GaugeMetric {
				name: payload.id.clone(),
				value: payload.gauge_value()?,
			}),
			MetricKind::Counter => counters.push(CounterMetric {
				name: payload.id.clone(),
				value: payload.counter_delta()?,
			}),
		}
	}
	Ok((gauges, counters))
}

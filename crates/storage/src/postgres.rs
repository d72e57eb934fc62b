//! Durable Postgres-backed storage implementation
//!
//! Counter updates are an atomic server-side upsert, so concurrent deltas
//! never race a read-then-write. Batches run inside one transaction: a single
//! failed row rolls the whole batch back. Connection-level concurrency is
//! bounded by the pool; every operation runs under the retry policy and
//! surfaces `Exhausted` once the budget is spent.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use pulse_types::{
	CounterMetric, GaugeMetric, MetricStorage, MetricsDump, StorageError, StorageResult,
};

use crate::migrations;
use crate::retry::RetryPolicy;

const INSERT_GAUGE_SQL: &str = "INSERT INTO gauge_metrics (id, value) VALUES ($1, $2) \
	ON CONFLICT (id) DO UPDATE SET value = EXCLUDED.value";

const INSERT_COUNTER_SQL: &str = "INSERT INTO counter_metrics (id, value) VALUES ($1, $2) \
	ON CONFLICT (id) DO UPDATE SET value = counter_metrics.value + EXCLUDED.value";

const SELECT_GAUGE_SQL: &str = "SELECT value FROM gauge_metrics WHERE id = $1";

const SELECT_COUNTER_SQL: &str = "SELECT value FROM counter_metrics WHERE id = $1";

/// Postgres store: a connection pool plus the shared retry policy.
#[derive(Debug, Clone)]
pub struct PostgresStore {
	pool: PgPool,
	retry: RetryPolicy,
}

impl PostgresStore {
	/// Connect, apply migrations, and return the store. Migration failure is
	/// fatal and aborts startup.
	pub async fn connect(dsn: &str) -> StorageResult<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(8)
			.connect(dsn)
			.await
			.map_err(|err| StorageError::Connection {
				message: format!("failed to connect to {dsn}: {err}"),
			})?;
		migrations::run(&pool).await?;
		Ok(Self {
			pool,
			retry: RetryPolicy::default(),
		})
	}

	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self
	}
}

fn transient(err: sqlx::Error) -> StorageError {
	StorageError::Connection {
		message: err.to_string(),
	}
}

#[async_trait]
impl MetricStorage for PostgresStore {
	async fn gauge(&self, name: &str) -> StorageResult<f64> {
		self.retry
			.run(|| async {
				let row = sqlx::query(SELECT_GAUGE_SQL)
					.bind(name)
					.fetch_optional(&self.pool)
					.await
					.map_err(transient)?;
				match row {
					Some(row) => row.try_get::<f64, _>("value").map_err(transient),
					None => Err(StorageError::NotFound { id: name.to_string() }),
				}
			})
			.await
	}

	async fn counter(&self, name: &str) -> StorageResult<i64> {
		self.retry
			.run(|| async {
				let row = sqlx::query(SELECT_COUNTER_SQL)
					.bind(name)
					.fetch_optional(&self.pool)
					.await
					.map_err(transient)?;
				match row {
					Some(row) => row.try_get::<i64, _>("value").map_err(transient),
					None => Err(StorageError::NotFound { id: name.to_string() }),
				}
			})
			.await
	}

	async fn set_gauge(&self, name: &str, value: f64) -> StorageResult<()> {
		self.retry
			.run(|| async {
				sqlx::query(INSERT_GAUGE_SQL)
					.bind(name)
					.bind(value)
					.execute(&self.pool)
					.await
					.map_err(transient)?;
				Ok(())
			})
			.await
	}

	async fn add_counter(&self, name: &str, delta: i64) -> StorageResult<()> {
		self.retry
			.run(|| async {
				sqlx::query(INSERT_COUNTER_SQL)
					.bind(name)
					.bind(delta)
					.execute(&self.pool)
					.await
					.map_err(transient)?;
				Ok(())
			})
			.await
	}

	async fn set_batch(
		&self,
		gauges: &[GaugeMetric],
		counters: &[CounterMetric],
	) -> StorageResult<()> {
		self.retry
			.run(|| async {
				let mut tx = self.pool.begin().await.map_err(transient)?;
				for gauge in gauges {
					sqlx::query(INSERT_GAUGE_SQL)
						.bind(&gauge.name)
						.bind(gauge.value)
						.execute(&mut *tx)
						.await
						.map_err(transient)?;
				}
				for counter in counters {
					sqlx::query(INSERT_COUNTER_SQL)
						.bind(&counter.name)
						.bind(counter.value)
						.execute(&mut *tx)
						.await
						.map_err(transient)?;
				}
				// Dropping the transaction on any error path above rolls the
				// whole batch back.
				tx.commit().await.map_err(transient)?;
				Ok(())
			})
			.await
	}

	async fn dump(&self) -> StorageResult<MetricsDump> {
		self.retry
			.run(|| async {
				let gauge_rows = sqlx::query("SELECT id, value FROM gauge_metrics ORDER BY id")
					.fetch_all(&self.pool)
					.await
					.map_err(transient)?;
				let counter_rows = sqlx::query("SELECT id, value FROM counter_metrics ORDER BY id")
					.fetch_all(&self.pool)
					.await
					.map_err(transient)?;

				let gauges = gauge_rows
					.iter()
					.map(|row| {
						Ok(GaugeMetric {
							name: row.try_get("id").map_err(transient)?,
							value: row.try_get("value").map_err(transient)?,
						})
					})
					.collect::<StorageResult<Vec<_>>>()?;
				let counters = counter_rows
					.iter()
					.map(|row| {
						Ok(CounterMetric {
							name: row.try_get("id").map_err(transient)?,
							value: row.try_get("value").map_err(transient)?,
						})
					})
					.collect::<StorageResult<Vec<_>>>()?;

				Ok(MetricsDump { counters, gauges })
			})
			.await
	}

	async fn ping(&self) -> StorageResult<()> {
		sqlx::query("SELECT 1")
			.execute(&self.pool)
			.await
			.map(|_| ())
			.map_err(transient)
	}
}

//! Schema migrations for the durable store
//!
//! Versioned scripts applied once at startup; a failed migration is fatal.

use sqlx::PgPool;
use tracing::info;

use pulse_types::{StorageError, StorageResult};

const SCHEMA_VERSION: i64 = 1;

pub async fn run(pool: &PgPool) -> StorageResult<()> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS schema_version (
			version BIGINT PRIMARY KEY
		)
		"#,
	)
	.execute(pool)
	.await
	.map_err(fatal)?;

	let current: Option<i64> = sqlx::query_scalar("SELECT version FROM schema_version LIMIT 1")
		.fetch_optional(pool)
		.await
		.map_err(fatal)?;
	let current = current.unwrap_or(0);

	if current >= SCHEMA_VERSION {
		info!("database schema is up to date (version {current})");
		return Ok(());
	}

	info!("migrating database from version {current} to {SCHEMA_VERSION}");

	if current < 1 {
		migrate_to_v1(pool).await?;
	}

	sqlx::query("DELETE FROM schema_version")
		.execute(pool)
		.await
		.map_err(fatal)?;
	sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
		.bind(SCHEMA_VERSION)
		.execute(pool)
		.await
		.map_err(fatal)?;

	Ok(())
}

async fn migrate_to_v1(pool: &PgPool) -> StorageResult<()> {
	info!("running migration to schema version 1");

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS gauge_metrics (
			id TEXT PRIMARY KEY,
			value DOUBLE PRECISION NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.map_err(fatal)?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS counter_metrics (
			id TEXT PRIMARY KEY,
			value BIGINT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.map_err(fatal)?;

	Ok(())
}

fn fatal(err: sqlx::Error) -> StorageError {
	StorageError::Fatal {
		message: format!("migration failed: {err}"),
	}
}

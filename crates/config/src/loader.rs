//! Flag / environment / config-file resolution
//!
//! Each field resolves independently: the CLI flag wins, an environment
//! variable is consulted next, the optional JSON config file fills what is
//! still unset, and the built-in default closes the gap.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::settings::{
	AgentArgs, AgentFileConfig, AgentSettings, ServerArgs, ServerFileConfig, ServerSettings,
};

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("cannot read config file {path}: {message}")]
	File { path: String, message: String },
	#[error("cannot parse {field} value {value:?}")]
	InvalidValue { field: &'static str, value: String },
}

fn env_string(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_parsed<T: std::str::FromStr>(
	name: &str,
	field: &'static str,
) -> Result<Option<T>, ConfigError> {
	match env_string(name) {
		None => Ok(None),
		Some(raw) => raw
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::InvalidValue { field, value: raw }),
	}
}

fn read_file<T: serde::de::DeserializeOwned + Default>(
	path: Option<&Path>,
) -> Result<T, ConfigError> {
	let Some(path) = path else {
		return Ok(T::default());
	};
	let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::File {
		path: path.display().to_string(),
		message: err.to_string(),
	})?;
	serde_json::from_str(&raw).map_err(|err| ConfigError::File {
		path: path.display().to_string(),
		message: err.to_string(),
	})
}

/// Resolve the full server configuration from parsed flags.
pub fn load_server_settings(args: ServerArgs) -> Result<ServerSettings, ConfigError> {
	let file_path = args
		.config
		.or_else(|| env_string("CONFIG").map(PathBuf::from));
	let file: ServerFileConfig = read_file(file_path.as_deref())?;
	let defaults = ServerSettings::default();

	let store_interval = match args.store_interval {
		Some(value) => Some(value),
		None => env_parsed("STORE_INTERVAL", "store_interval")?,
	};
	let restore = match args.restore {
		Some(value) => Some(value),
		None => env_parsed("RESTORE", "restore")?,
	};

	Ok(ServerSettings {
		address: args
			.address
			.or_else(|| env_string("ADDRESS"))
			.or(file.address)
			.unwrap_or(defaults.address),
		log_level: args
			.log_level
			.or_else(|| env_string("LOG_LEVEL"))
			.unwrap_or(defaults.log_level),
		store_interval: store_interval
			.or(file.store_interval)
			.unwrap_or(defaults.store_interval),
		file_store_path: args
			.file_store_path
			.or_else(|| env_string("FILE_STORAGE_PATH"))
			.or(file.store_file)
			.unwrap_or(defaults.file_store_path),
		restore: restore.or(file.restore).unwrap_or(defaults.restore),
		database_dsn: args
			.database_dsn
			.or_else(|| env_string("DATABASE_DSN"))
			.or(file.database_dsn)
			.unwrap_or(defaults.database_dsn),
		key: args
			.key
			.or_else(|| env_string("KEY"))
			.unwrap_or(defaults.key),
		crypto_key: args
			.crypto_key
			.or_else(|| env_string("CRYPTO_KEY").map(PathBuf::from))
			.or(file.crypto_key),
		trusted_subnet: args
			.trusted_subnet
			.or_else(|| env_string("TRUSTED_SUBNET"))
			.or(file.trusted_subnet)
			.unwrap_or(defaults.trusted_subnet),
		rpc_address: args
			.rpc_address
			.or_else(|| env_string("RPC_ADDRESS"))
			.or(file.rpc_address),
	})
}

/// Resolve the full agent configuration from parsed flags.
pub fn load_agent_settings(args: AgentArgs) -> Result<AgentSettings, ConfigError> {
	let file_path = args
		.config
		.or_else(|| env_string("CONFIG").map(PathBuf::from));
	let file: AgentFileConfig = read_file(file_path.as_deref())?;
	let defaults = AgentSettings::default();

	let report_interval = match args.report_interval {
		Some(value) => Some(value),
		None => env_parsed("REPORT_INTERVAL", "report_interval")?,
	};
	let poll_interval = match args.poll_interval {
		Some(value) => Some(value),
		None => env_parsed("POLL_INTERVAL", "poll_interval")?,
	};
	let rate_limit = match args.rate_limit {
		Some(value) => Some(value),
		None => env_parsed("RATE_LIMIT", "rate_limit")?,
	};

	Ok(AgentSettings {
		endpoint: args
			.endpoint
			.or_else(|| env_string("ADDRESS"))
			.or(file.address)
			.unwrap_or(defaults.endpoint),
		log_level: args
			.log_level
			.or_else(|| env_string("LOG_LEVEL"))
			.unwrap_or(defaults.log_level),
		report_interval: report_interval
			.or(file.report_interval)
			.unwrap_or(defaults.report_interval),
		poll_interval: poll_interval
			.or(file.poll_interval)
			.unwrap_or(defaults.poll_interval),
		key: args
			.key
			.or_else(|| env_string("KEY"))
			.unwrap_or(defaults.key),
		crypto_key: args
			.crypto_key
			.or_else(|| env_string("CRYPTO_KEY").map(PathBuf::from))
			.or(file.crypto_key),
		rate_limit: rate_limit.unwrap_or(defaults.rate_limit),
		rpc_endpoint: args
			.rpc_endpoint
			.or_else(|| env_string("RPC_ENDPOINT"))
			.or(file.rpc_endpoint),
	})
}

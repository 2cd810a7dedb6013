//! Configuration module for the bridge gateway.
//!
//! This module provides the configuration structures for the gateway and the
//! loader that reads them from TOML. Values may reference environment
//! variables with `${VAR}` or `${VAR:-default}`, and the parsed configuration
//! is validated before it is returned.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["protocol.toml", "ledger.toml"]` to include other files
//! - Each top-level section must be unique across all files

#[cfg(any(test, feature = "testing"))]
pub mod builders;
mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this gateway instance.
	pub service: ServiceConfig,
	/// Bridge protocol collaborators.
	pub protocol: ProtocolConfig,
	/// Ledger collaborators used by the fee-payer rewriter.
	pub ledger: LedgerConfig,
	/// Quote engine tuning.
	#[serde(default)]
	pub quote: QuoteConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Identity of this gateway instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Identifier used in logs.
	pub id: String,
}

/// Configuration for bridge protocol collaborators.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolConfig {
	/// Which implementation serves requests.
	pub primary: String,
	/// Map of implementation names to their configuration tables.
	pub implementations: HashMap<String, toml::Value>,
	/// How long the token list is reused before it is fetched again.
	#[serde(default = "default_token_cache_ttl_seconds")]
	pub token_cache_ttl_seconds: u64,
}

fn default_token_cache_ttl_seconds() -> u64 {
	300
}

/// Configuration for ledger collaborators.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	/// Which implementation serves lookup-table reads.
	pub primary: String,
	/// Map of implementation names to their configuration tables.
	pub implementations: HashMap<String, toml::Value>,
}

/// Quote engine tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuoteConfig {
	/// Upper bound on in-flight collaborator calls per quote request.
	#[serde(default = "default_max_concurrency")]
	pub max_concurrency: usize,
}

impl Default for QuoteConfig {
	fn default() -> Self {
		Self {
			max_concurrency: default_max_concurrency(),
		}
	}
}

fn default_max_concurrency() -> usize {
	8
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Request body limit in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// CORS configuration. Permissive when absent.
	pub cors: Option<CorsConfig>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS.
	pub allowed_origins: Vec<String>,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	1024 * 1024
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(var_name.as_str()), cap.get(2)) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)));
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration.
	///
	/// Checks that the service has an id, that each collaborator section has
	/// at least one implementation and its primary is among them, and that
	/// numeric tuning values are within bounds.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		validate_primary(
			"protocol",
			&self.protocol.primary,
			&self.protocol.implementations,
		)?;
		if self.protocol.token_cache_ttl_seconds > 86400 {
			return Err(ConfigError::Validation(
				"protocol.token_cache_ttl_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}

		validate_primary("ledger", &self.ledger.primary, &self.ledger.implementations)?;

		if self.quote.max_concurrency == 0 || self.quote.max_concurrency > 64 {
			return Err(ConfigError::Validation(
				"quote.max_concurrency must be between 1 and 64".into(),
			));
		}

		if let Some(ref api) = self.api {
			if api.enabled && api.port == 0 {
				return Err(ConfigError::Validation("api.port cannot be 0".into()));
			}
			if api.timeout_seconds == 0 {
				return Err(ConfigError::Validation(
					"api.timeout_seconds must be greater than 0".into(),
				));
			}
		}

		Ok(())
	}
}

fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

/// Parses a TOML string, resolving environment variables and validating
/// the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

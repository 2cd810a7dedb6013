//! Fluent construction of [`Config`] values without going through TOML files.
//!
//! Defaults to the in-process `mock` protocol and `memory` ledger with empty
//! tables, which is enough to build an engine in unit tests.

use crate::{ApiConfig, Config, LedgerConfig, ProtocolConfig, QuoteConfig, ServiceConfig};
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	protocol_primary: String,
	protocol_implementations: HashMap<String, toml::Value>,
	token_cache_ttl_seconds: u64,
	ledger_primary: String,
	ledger_implementations: HashMap<String, toml::Value>,
	max_concurrency: usize,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		let empty = || toml::Value::Table(toml::Table::new());
		Self {
			service_id: "test-gateway".to_string(),
			protocol_primary: "mock".to_string(),
			protocol_implementations: HashMap::from([("mock".to_string(), empty())]),
			token_cache_ttl_seconds: 300,
			ledger_primary: "memory".to_string(),
			ledger_implementations: HashMap::from([("memory".to_string(), empty())]),
			max_concurrency: QuoteConfig::default().max_concurrency,
			api: None,
		}
	}

	pub fn service_id(mut self, id: impl Into<String>) -> Self {
		self.service_id = id.into();
		self
	}

	/// Replaces the table of protocol implementation `name` and makes it primary.
	pub fn protocol(mut self, name: impl Into<String>, table: toml::Value) -> Self {
		let name = name.into();
		self.protocol_implementations.insert(name.clone(), table);
		self.protocol_primary = name;
		self
	}

	pub fn token_cache_ttl_seconds(mut self, ttl: u64) -> Self {
		self.token_cache_ttl_seconds = ttl;
		self
	}

	/// Replaces the table of ledger implementation `name` and makes it primary.
	pub fn ledger(mut self, name: impl Into<String>, table: toml::Value) -> Self {
		let name = name.into();
		self.ledger_implementations.insert(name.clone(), table);
		self.ledger_primary = name;
		self
	}

	pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
		self.max_concurrency = max_concurrency;
		self
	}

	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	pub fn build(self) -> Config {
		Config {
			service: ServiceConfig {
				id: self.service_id,
			},
			protocol: ProtocolConfig {
				primary: self.protocol_primary,
				implementations: self.protocol_implementations,
				token_cache_ttl_seconds: self.token_cache_ttl_seconds,
			},
			ledger: LedgerConfig {
				primary: self.ledger_primary,
				implementations: self.ledger_implementations,
			},
			quote: QuoteConfig {
				max_concurrency: self.max_concurrency,
			},
			api: self.api,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_pass_validation() {
		let config = ConfigBuilder::new().build();
		assert!(config.validate().is_ok());
		assert_eq!(config.protocol.primary, "mock");
		assert_eq!(config.ledger.primary, "memory");
	}

	#[test]
	fn test_protocol_override_becomes_primary() {
		let table: toml::Value = toml::from_str("api_url = \"http://localhost:3000\"").unwrap();
		let config = ConfigBuilder::new().protocol("rest", table).build();
		assert_eq!(config.protocol.primary, "rest");
		assert_eq!(config.protocol.implementations.len(), 2);
	}
}

//! Builder for assembling a [`BridgeEngine`] from configuration.
//!
//! Each configured implementation table is handed to the factory registered
//! under the same name. Implementations without a factory are skipped; a
//! factory that rejects its table aborts the build.

use crate::BridgeEngine;
use bridge_config::Config;
use bridge_ledger::{LedgerError, LedgerInterface, LedgerService};
use bridge_protocol::{ProtocolError, ProtocolInterface, ProtocolService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every pluggable component, keyed by implementation
/// name.
pub struct BridgeFactories<PF, LF> {
	pub protocol_factories: HashMap<String, PF>,
	pub ledger_factories: HashMap<String, LF>,
}

pub struct BridgeBuilder {
	config: Config,
}

impl BridgeBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<PF, LF>(self, factories: BridgeFactories<PF, LF>) -> Result<BridgeEngine, BuilderError>
	where
		PF: Fn(&toml::Value) -> Result<Box<dyn ProtocolInterface>, ProtocolError>,
		LF: Fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>,
	{
		let protocol_impls = create_implementations(
			"protocol",
			&self.config.protocol.implementations,
			&self.config.protocol.primary,
			&factories.protocol_factories,
		)?;
		let protocol = ProtocolService::new(
			protocol_impls,
			self.config.protocol.primary.clone(),
			Duration::from_secs(self.config.protocol.token_cache_ttl_seconds),
		)
		.map_err(|e| BuilderError::Config(e.to_string()))?;

		let ledger_impls = create_implementations(
			"ledger",
			&self.config.ledger.implementations,
			&self.config.ledger.primary,
			&factories.ledger_factories,
		)?;
		let ledger = LedgerService::new(ledger_impls, self.config.ledger.primary.clone())
			.map_err(|e| BuilderError::Config(e.to_string()))?;

		Ok(BridgeEngine::new(
			self.config,
			Arc::new(protocol),
			Arc::new(ledger),
		))
	}
}

/// Runs each configured implementation table through its factory.
fn create_implementations<T, E, F>(
	component: &'static str,
	configured: &HashMap<String, toml::Value>,
	primary: &str,
	factories: &HashMap<String, F>,
) -> Result<HashMap<String, Arc<T>>, BuilderError>
where
	T: ?Sized,
	E: std::fmt::Display,
	F: Fn(&toml::Value) -> Result<Box<T>, E>,
{
	let mut implementations = HashMap::new();
	for (name, config) in configured {
		let Some(factory) = factories.get(name) else {
			tracing::warn!(component, implementation = %name, "No factory registered, skipping");
			continue;
		};
		match factory(config) {
			Ok(implementation) => {
				implementations.insert(name.clone(), Arc::from(implementation));
				let is_primary = primary == name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	if !implementations.contains_key(primary) {
		return Err(BuilderError::MissingComponent(format!(
			"primary {} implementation '{}' is not available",
			component, primary
		)));
	}
	Ok(implementations)
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_config::builders::ConfigBuilder;
	use bridge_protocol::implementations::mock;
	use bridge_types::ImplementationRegistry;

	fn factories() -> BridgeFactories<bridge_protocol::ProtocolFactory, bridge_ledger::LedgerFactory> {
		BridgeFactories {
			protocol_factories: bridge_protocol::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			ledger_factories: bridge_ledger::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	#[tokio::test]
	async fn test_build_with_mock_components() {
		let config = ConfigBuilder::new().build();
		let engine = BridgeBuilder::new(config).build(factories()).unwrap();
		assert!(engine.tokens().await.unwrap().is_empty());
	}

	#[test]
	fn test_invalid_implementation_config_fails() {
		let mut table = toml::Table::new();
		table.insert("lp_fee_share".into(), toml::Value::String("2".into()));
		let config = ConfigBuilder::new()
			.protocol(mock::Registry::NAME, toml::Value::Table(table))
			.build();

		let err = BridgeBuilder::new(config).build(factories()).err().unwrap();
		assert!(matches!(err, BuilderError::Config(ref m) if m.contains("protocol")));
	}

	#[test]
	fn test_primary_without_factory_is_missing() {
		let config = ConfigBuilder::new()
			.ledger("archive", toml::Value::Table(toml::Table::new()))
			.build();
		let err = BridgeBuilder::new(config).build(factories()).err().unwrap();
		assert!(matches!(err, BuilderError::MissingComponent(ref m) if m.contains("archive")));
	}
}

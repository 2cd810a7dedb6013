//! Registry of every protocol and ledger implementation compiled into the
//! binary, and engine construction from configuration.

use bridge_config::Config;
use bridge_core::{BridgeBuilder, BridgeEngine, BridgeFactories};
use bridge_ledger::LedgerFactory;
use bridge_protocol::ProtocolFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct FactoryRegistry {
	pub protocol: HashMap<String, ProtocolFactory>,
	pub ledger: HashMap<String, LedgerFactory>,
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the global registry, filling it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut protocol = HashMap::new();
		for (name, factory) in bridge_protocol::get_all_implementations() {
			tracing::debug!("Registering protocol implementation: {}", name);
			protocol.insert(name.to_string(), factory);
		}

		let mut ledger = HashMap::new();
		for (name, factory) in bridge_ledger::get_all_implementations() {
			tracing::debug!("Registering ledger implementation: {}", name);
			ledger.insert(name.to_string(), factory);
		}

		FactoryRegistry { protocol, ledger }
	})
}

/// Picks the factory for every configured implementation, rejecting names
/// the registry does not know.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

pub fn build_engine_from_config(config: Config) -> Result<BridgeEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let protocol_factories =
		build_factories!(registry, config.protocol.implementations, protocol, "protocol");
	let ledger_factories = build_factories!(registry, config.ledger.implementations, ledger, "ledger");

	let factories = BridgeFactories {
		protocol_factories,
		ledger_factories,
	};
	Ok(BridgeBuilder::new(config).build(factories)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_config::builders::ConfigBuilder;

	#[test]
	fn test_registry_knows_all_implementations() {
		let registry = get_registry();
		let mut protocols: Vec<_> = registry.protocol.keys().cloned().collect();
		protocols.sort();
		assert_eq!(protocols, vec!["mock", "rest"]);
		let mut ledgers: Vec<_> = registry.ledger.keys().cloned().collect();
		ledgers.sort();
		assert_eq!(ledgers, vec!["memory", "rpc"]);
	}

	#[test]
	fn test_build_engine_with_defaults() {
		let engine = build_engine_from_config(ConfigBuilder::new().service_id("gw").build()).unwrap();
		assert_eq!(engine.config().service.id, "gw");
	}

	#[test]
	fn test_unknown_implementation_rejected() {
		let config = ConfigBuilder::new()
			.ledger("archive", toml::Value::Table(toml::Table::new()))
			.build();
		let err = build_engine_from_config(config).err().unwrap();
		assert!(err.to_string().contains("Unknown ledger implementation 'archive'"));
		assert!(err.to_string().contains("memory, rpc"));
	}
}

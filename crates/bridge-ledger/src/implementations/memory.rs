//! In-memory ledger serving lookup tables from configuration.

use crate::{LedgerError, LedgerInterface};
use async_trait::async_trait;
use bridge_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::str::FromStr;

/// Configuration schema for the memory ledger.
pub struct MemoryLedgerSchema;

impl MemoryLedgerSchema {
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for MemoryLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("tables", FieldType::Table(Schema::new(vec![], vec![])))
				.with_validator(|value| {
					let tables = value.as_table().ok_or("tables must be a table")?;
					for (key, entries) in tables {
						Pubkey::from_str(key).map_err(|_| format!("'{}' is not a valid address", key))?;
						let entries = entries
							.as_array()
							.ok_or_else(|| format!("table '{}' must be an array of addresses", key))?;
						for entry in entries {
							let parsed = entry.as_str().map(Pubkey::from_str);
							if !matches!(parsed, Some(Ok(_))) {
								return Err(format!("table '{}' holds an invalid address", key));
							}
						}
					}
					Ok(())
				})],
		);

		schema.validate(config)
	}
}

/// Ledger holding a fixed set of lookup tables.
pub struct MemoryLedger {
	tables: HashMap<Pubkey, Vec<Pubkey>>,
}

impl MemoryLedger {
	pub fn new(tables: HashMap<Pubkey, Vec<Pubkey>>) -> Self {
		Self { tables }
	}
}

#[async_trait]
impl LedgerInterface for MemoryLedger {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryLedgerSchema)
	}

	async fn get_address_lookup_table(
		&self,
		key: &Pubkey,
	) -> Result<Option<AddressLookupTableAccount>, LedgerError> {
		Ok(self.tables.get(key).map(|addresses| AddressLookupTableAccount {
			key: *key,
			addresses: addresses.clone(),
		}))
	}
}

/// Registry for the memory ledger implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl crate::LedgerRegistry for Registry {}

fn parse_address(raw: &str) -> Result<Pubkey, LedgerError> {
	Pubkey::from_str(raw)
		.map_err(|e| LedgerError::Configuration(format!("Invalid address '{}': {}", raw, e)))
}

/// Factory function to create a memory ledger from configuration.
///
/// Configuration parameters:
/// - `tables`: map of table address to its ordered entry addresses
pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	MemoryLedgerSchema::validate_config(config)
		.map_err(|e| LedgerError::Configuration(format!("Invalid configuration: {}", e)))?;

	let mut tables = HashMap::new();
	if let Some(configured) = config.get("tables").and_then(|v| v.as_table()) {
		for (key, entries) in configured {
			let addresses = entries
				.as_array()
				.map(|items| {
					items
						.iter()
						.filter_map(|item| item.as_str())
						.map(parse_address)
						.collect::<Result<Vec<_>, _>>()
				})
				.transpose()?
				.unwrap_or_default();
			tables.insert(parse_address(key)?, addresses);
		}
	}

	Ok(Box::new(MemoryLedger::new(tables)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_invalid_address_rejected() {
		let config: toml::Value = toml::from_str("[tables]\nnot-a-key = []\n").unwrap();
		let err = create_ledger(&config).err().unwrap();
		assert!(err.to_string().contains("not a valid address"));

		let key = Pubkey::new_unique();
		let config: toml::Value =
			toml::from_str(&format!("[tables]\n\"{}\" = [\"xyz\"]\n", key)).unwrap();
		assert!(create_ledger(&config).is_err());
	}

	#[tokio::test]
	async fn test_tables_from_config() {
		let key = Pubkey::new_unique();
		let entries = [Pubkey::new_unique(), Pubkey::new_unique()];
		let config: toml::Value = toml::from_str(&format!(
			"[tables]\n\"{}\" = [\"{}\", \"{}\"]\n",
			key, entries[0], entries[1]
		))
		.unwrap();
		let ledger = create_ledger(&config).unwrap();

		let table = ledger.get_address_lookup_table(&key).await.unwrap().unwrap();
		assert_eq!(table.key, key);
		assert_eq!(table.addresses, entries.to_vec());
	}
}

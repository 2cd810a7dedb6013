//! Ledger implementation backed by a Solana JSON-RPC node.
//!
//! Lookup tables are read with `getAccountInfo` at the configured commitment
//! level. The account must be owned by the address lookup table program and
//! its data is decoded with the program's own state layout.

use crate::{LedgerError, LedgerInterface};
use async_trait::async_trait;
use bridge_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use solana_client::{
	client_error::{ClientError, ClientErrorKind},
	nonblocking::rpc_client::RpcClient,
	rpc_request::RpcError,
};
use solana_sdk::address_lookup_table::{self, state::AddressLookupTable, AddressLookupTableAccount};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

const COMMITMENT_LEVELS: [&str; 3] = ["processed", "confirmed", "finalized"];

/// Configuration schema for the RPC ledger.
pub struct RpcLedgerSchema;

impl RpcLedgerSchema {
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for RpcLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("rpc_url", FieldType::Url)],
			vec![
				Field::new("commitment", FieldType::String).with_validator(|value| {
					let level = value.as_str().unwrap_or_default();
					if COMMITMENT_LEVELS.contains(&level) {
						Ok(())
					} else {
						Err(format!(
							"'{}' is not one of {}",
							level,
							COMMITMENT_LEVELS.join(", ")
						))
					}
				}),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		);

		schema.validate(config)
	}
}

fn commitment_config(level: &str) -> CommitmentConfig {
	match level {
		"processed" => CommitmentConfig::processed(),
		"confirmed" => CommitmentConfig::confirmed(),
		_ => CommitmentConfig::finalized(),
	}
}

fn client_error(e: ClientError) -> LedgerError {
	match e.kind() {
		ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => {
			LedgerError::Rpc {
				code: *code,
				message: message.clone(),
			}
		},
		ClientErrorKind::SerdeJson(inner) => LedgerError::Decode(inner.to_string()),
		_ => LedgerError::Network(e.to_string()),
	}
}

/// Ledger reading lookup tables from a JSON-RPC node.
pub struct RpcLedger {
	client: RpcClient,
}

impl RpcLedger {
	pub fn new(rpc_url: String, commitment: CommitmentConfig, timeout: Duration) -> Self {
		Self {
			client: RpcClient::new_with_timeout_and_commitment(rpc_url, timeout, commitment),
		}
	}
}

#[async_trait]
impl LedgerInterface for RpcLedger {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(RpcLedgerSchema)
	}

	async fn get_address_lookup_table(
		&self,
		key: &Pubkey,
	) -> Result<Option<AddressLookupTableAccount>, LedgerError> {
		let response = self
			.client
			.get_account_with_commitment(key, self.client.commitment())
			.await
			.map_err(client_error)?;
		let Some(account) = response.value else {
			return Ok(None);
		};

		if account.owner != address_lookup_table::program::id() {
			return Err(LedgerError::InvalidAccount(
				key.to_string(),
				format!("owned by {}", account.owner),
			));
		}
		let table = AddressLookupTable::deserialize(&account.data)
			.map_err(|e| LedgerError::Decode(format!("lookup table {}: {}", key, e)))?;

		Ok(Some(AddressLookupTableAccount {
			key: *key,
			addresses: table.addresses.to_vec(),
		}))
	}
}

/// Registry for the RPC ledger implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "rpc";
	type Factory = crate::LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl crate::LedgerRegistry for Registry {}

/// Factory function to create an RPC ledger from configuration.
///
/// Configuration parameters:
/// - `rpc_url`: JSON-RPC endpoint (required)
/// - `commitment`: processed, confirmed or finalized (default finalized)
/// - `timeout_seconds`: per-request timeout (default 30)
pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	RpcLedgerSchema::validate_config(config)
		.map_err(|e| LedgerError::Configuration(format!("Invalid configuration: {}", e)))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| LedgerError::Configuration("rpc_url is required".into()))?
		.to_string();
	let commitment = commitment_config(
		config
			.get("commitment")
			.and_then(|v| v.as_str())
			.unwrap_or("finalized"),
	);
	let timeout_seconds = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(30) as u64;

	Ok(Box::new(RpcLedger::new(
		rpc_url,
		commitment,
		Duration::from_secs(timeout_seconds),
	)))
}

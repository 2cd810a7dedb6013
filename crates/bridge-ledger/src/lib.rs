//! Ledger access for the fee-payer rewriter.
//!
//! The rewriter only needs one read from the chain: the address list stored
//! in an address lookup table account. This module defines that read as a
//! pluggable interface so the JSON-RPC client can be swapped for an
//! in-memory table set in tests and offline runs.

use async_trait::async_trait;
use bridge_types::{ConfigSchema, ImplementationRegistry};
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod rpc;
}

/// Errors that can occur during ledger reads.
#[derive(Debug, Error)]
pub enum LedgerError {
	/// Error that occurs while talking to the RPC node.
	#[error("Network error: {0}")]
	Network(String),
	/// The node answered with a JSON-RPC error object.
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },
	/// The account exists but is not a lookup table.
	#[error("Invalid account {0}: {1}")]
	InvalidAccount(String, String),
	/// Account data could not be decoded.
	#[error("Decode error: {0}")]
	Decode(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Internal error that occurs during ledger operations.
	#[error("Internal error: {0}")]
	Internal(String),
}

/// Trait defining the interface for ledger implementations.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait LedgerInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Reads the lookup table stored at `key`.
	///
	/// Returns `Ok(None)` when no account exists at that address.
	async fn get_address_lookup_table(
		&self,
		key: &Pubkey,
	) -> Result<Option<AddressLookupTableAccount>, LedgerError>;
}

/// Type alias for ledger factory functions.
pub type LedgerFactory = fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>;

/// Registry trait for ledger implementations.
pub trait LedgerRegistry: ImplementationRegistry<Factory = LedgerFactory> {}

/// Get all registered ledger implementations.
pub fn get_all_implementations() -> Vec<(&'static str, LedgerFactory)> {
	use implementations::{memory, rpc};

	vec![
		(rpc::Registry::NAME, rpc::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Service that fronts the configured ledger implementation.
pub struct LedgerService {
	implementations: HashMap<String, Arc<dyn LedgerInterface>>,
	primary_implementation: String,
}

impl LedgerService {
	pub fn new(
		implementations: HashMap<String, Arc<dyn LedgerInterface>>,
		primary_implementation: String,
	) -> Result<Self, LedgerError> {
		if !implementations.contains_key(&primary_implementation) {
			return Err(LedgerError::Configuration(format!(
				"Primary implementation '{}' not found in available implementations",
				primary_implementation
			)));
		}

		Ok(Self {
			implementations,
			primary_implementation,
		})
	}

	pub async fn get_address_lookup_table(
		&self,
		key: &Pubkey,
	) -> Result<Option<AddressLookupTableAccount>, LedgerError> {
		let implementation = self
			.implementations
			.get(&self.primary_implementation)
			.ok_or_else(|| {
				LedgerError::Internal(format!(
					"Primary implementation '{}' not available",
					self.primary_implementation
				))
			})?;

		tracing::debug!(table = %key, "Fetching address lookup table");
		implementation.get_address_lookup_table(key).await
	}
}

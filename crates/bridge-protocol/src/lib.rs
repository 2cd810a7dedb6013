//! Bridge protocol module for the gateway.
//!
//! This module defines the interface to the bridge protocol collaborator: the
//! component that knows the supported tokens, quotes relayer fees per
//! messenger and simulates pool swaps. Implementations are selected by name
//! from configuration and wrapped in a [`ProtocolService`] that adds token
//! caching and address lookup.

use async_trait::async_trait;
use bridge_types::{
	ConfigSchema, GasFeeOptions, ImplementationRegistry, Messenger, PendingStatusInfo,
	SwapCalcInfo, Token,
};
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Re-export implementations
pub mod implementations {
	pub mod mock;
	pub mod rest;
}

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
	/// Error that occurs while talking to the protocol's API.
	#[error("Network error: {0}")]
	Network(String),
	/// The protocol answered with a non-success status.
	#[error("Upstream error ({status}): {message}")]
	Upstream { status: u16, message: String },
	/// The protocol's answer could not be decoded.
	#[error("Decode error: {0}")]
	Decode(String),
	/// The protocol cannot serve the requested token pair or messenger.
	#[error("Unsupported route: {0}")]
	Unsupported(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Internal error that occurs during protocol operations.
	#[error("Internal error: {0}")]
	Internal(String),
}

/// Trait defining the interface for bridge protocol implementations.
///
/// All amounts crossing this interface are either atomic integer strings
/// (`amount_int`) or whole-token decimals (`amount_float`).
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ProtocolInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Lists every token the protocol can bridge.
	async fn tokens(&self) -> Result<Vec<Token>, ProtocolError>;

	/// Relayer fee per payment method for a transfer over `messenger`.
	async fn gas_fee_options(
		&self,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<GasFeeOptions, ProtocolError>;

	/// Pool fee and swap breakdown for sending `amount_int` source units.
	async fn send_amount_details(
		&self,
		amount_int: &str,
		source: &Token,
		destination: &Token,
	) -> Result<SwapCalcInfo, ProtocolError>;

	/// Transfers still waiting on the destination pool.
	async fn pending_status_info(
		&self,
		amount_int: &str,
		source: &Token,
		destination: &Token,
	) -> Result<PendingStatusInfo, ProtocolError>;

	/// Average transfer time in milliseconds, if the protocol knows it.
	async fn average_transfer_time(
		&self,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<Option<u64>, ProtocolError>;

	/// Whole-token amount delivered when `amount_float` is sent.
	async fn amount_to_be_received(
		&self,
		amount_float: BigDecimal,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<BigDecimal, ProtocolError>;

	/// Whole-token amount that must be sent for `amount_float` to arrive.
	async fn amount_to_send(
		&self,
		amount_float: BigDecimal,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<BigDecimal, ProtocolError>;
}

/// Type alias for protocol factory functions.
pub type ProtocolFactory = fn(&toml::Value) -> Result<Box<dyn ProtocolInterface>, ProtocolError>;

/// Registry trait for protocol implementations.
pub trait ProtocolRegistry: ImplementationRegistry<Factory = ProtocolFactory> {}

/// Get all registered protocol implementations.
pub fn get_all_implementations() -> Vec<(&'static str, ProtocolFactory)> {
	use implementations::{mock, rest};

	vec![
		(rest::Registry::NAME, rest::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

struct CachedTokens {
	tokens: Arc<Vec<Token>>,
	fetched_at: Instant,
}

/// Service that fronts the configured protocol implementation.
///
/// The token list is cached for `token_ttl` and refreshed lazily on the first
/// lookup after it expires. Every other call goes straight through.
pub struct ProtocolService {
	/// Map of implementation names to their interfaces.
	implementations: HashMap<String, Arc<dyn ProtocolInterface>>,
	/// The implementation that serves requests.
	primary_implementation: String,
	token_cache: RwLock<Option<CachedTokens>>,
	token_ttl: Duration,
}

impl ProtocolService {
	pub fn new(
		implementations: HashMap<String, Arc<dyn ProtocolInterface>>,
		primary_implementation: String,
		token_ttl: Duration,
	) -> Result<Self, ProtocolError> {
		if !implementations.contains_key(&primary_implementation) {
			return Err(ProtocolError::Configuration(format!(
				"Primary implementation '{}' not found in available implementations",
				primary_implementation
			)));
		}

		Ok(Self {
			implementations,
			primary_implementation,
			token_cache: RwLock::new(None),
			token_ttl,
		})
	}

	fn primary(&self) -> Result<&Arc<dyn ProtocolInterface>, ProtocolError> {
		self.implementations
			.get(&self.primary_implementation)
			.ok_or_else(|| {
				ProtocolError::Internal(format!(
					"Primary implementation '{}' not available",
					self.primary_implementation
				))
			})
	}

	/// Returns the token list, fetching it if the cache is empty or stale.
	pub async fn tokens(&self) -> Result<Arc<Vec<Token>>, ProtocolError> {
		if let Some(cached) = self.token_cache.read().await.as_ref() {
			if cached.fetched_at.elapsed() < self.token_ttl {
				return Ok(Arc::clone(&cached.tokens));
			}
		}

		let mut cache = self.token_cache.write().await;
		// Another request may have refreshed while we waited for the lock
		if let Some(cached) = cache.as_ref() {
			if cached.fetched_at.elapsed() < self.token_ttl {
				return Ok(Arc::clone(&cached.tokens));
			}
		}

		let tokens = Arc::new(self.primary()?.tokens().await?);
		tracing::debug!(
			implementation = %self.primary_implementation,
			count = tokens.len(),
			"Refreshed token list"
		);
		*cache = Some(CachedTokens {
			tokens: Arc::clone(&tokens),
			fetched_at: Instant::now(),
		});
		Ok(tokens)
	}

	/// Finds a token by token or pool address, ignoring case.
	pub async fn find_token(&self, address: &str) -> Result<Option<Token>, ProtocolError> {
		let tokens = self.tokens().await?;
		Ok(tokens.iter().find(|t| t.matches_address(address)).cloned())
	}

	pub async fn gas_fee_options(
		&self,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<GasFeeOptions, ProtocolError> {
		tracing::debug!(messenger = %messenger, "Fetching gas fee options");
		self.primary()?
			.gas_fee_options(source, destination, messenger)
			.await
	}

	pub async fn send_amount_details(
		&self,
		amount_int: &str,
		source: &Token,
		destination: &Token,
	) -> Result<SwapCalcInfo, ProtocolError> {
		tracing::debug!(amount = %amount_int, "Fetching send amount details");
		self.primary()?
			.send_amount_details(amount_int, source, destination)
			.await
	}

	pub async fn pending_status_info(
		&self,
		amount_int: &str,
		source: &Token,
		destination: &Token,
	) -> Result<PendingStatusInfo, ProtocolError> {
		tracing::debug!(amount = %amount_int, "Fetching pending status");
		self.primary()?
			.pending_status_info(amount_int, source, destination)
			.await
	}

	pub async fn average_transfer_time(
		&self,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<Option<u64>, ProtocolError> {
		tracing::debug!(messenger = %messenger, "Fetching average transfer time");
		self.primary()?
			.average_transfer_time(source, destination, messenger)
			.await
	}

	pub async fn amount_to_be_received(
		&self,
		amount_float: BigDecimal,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<BigDecimal, ProtocolError> {
		tracing::debug!(amount = %amount_float, messenger = %messenger, "Estimating received amount");
		self.primary()?
			.amount_to_be_received(amount_float, source, destination, messenger)
			.await
	}

	pub async fn amount_to_send(
		&self,
		amount_float: BigDecimal,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<BigDecimal, ProtocolError> {
		tracing::debug!(amount = %amount_float, messenger = %messenger, "Estimating amount to send");
		self.primary()?
			.amount_to_send(amount_float, source, destination, messenger)
			.await
	}
}

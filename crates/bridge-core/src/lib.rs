//! Core engine of the bridge gateway.
//!
//! [`BridgeEngine`] answers the requests the gateway serves: quotes for a
//! token pair, receive/send amount estimates for one messenger, fee-payer
//! substitution for Solana transactions, and read-only views of protocol
//! data (chains, gas fees, pending transfers, pool details, transfer time).
//! Requests are validated before any collaborator is contacted.

use bigdecimal::{BigDecimal, Zero};
use bridge_config::Config;
use bridge_ledger::LedgerService;
use bridge_protocol::ProtocolService;
use bridge_types::{
	amount, group_by_chain, BridgeAmounts, BridgeQuote, ChainDetails, GasFeeOptions, Messenger,
	PendingStatusInfo, SwapCalcInfo, Token,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod builder;
pub mod quote;
pub mod sponsor;

#[cfg(test)]
mod fixtures;

pub use builder::{BridgeBuilder, BridgeFactories, BuilderError};
pub use quote::{AmountEstimator, QuoteBuilder, QuoteError};
pub use sponsor::{FeePayerRewriter, SponsorError};

pub struct BridgeEngine {
	config: Config,
	protocol: Arc<ProtocolService>,
	quotes: QuoteBuilder,
	estimator: AmountEstimator,
	rewriter: FeePayerRewriter,
}

impl BridgeEngine {
	pub fn new(config: Config, protocol: Arc<ProtocolService>, ledger: Arc<LedgerService>) -> Self {
		Self {
			quotes: QuoteBuilder::new(Arc::clone(&protocol), config.quote.max_concurrency),
			estimator: AmountEstimator::new(Arc::clone(&protocol)),
			rewriter: FeePayerRewriter::new(ledger),
			protocol,
			config,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns the cached token list.
	pub async fn tokens(&self) -> Result<Arc<Vec<Token>>, QuoteError> {
		self.protocol
			.tokens()
			.await
			.map_err(|e| QuoteError::UpstreamFailure(format!("token list: {}", e)))
	}

	/// Returns the cached token list grouped by chain symbol.
	pub async fn chains(&self) -> Result<BTreeMap<String, ChainDetails>, QuoteError> {
		Ok(group_by_chain(&self.tokens().await?))
	}

	/// Relayer fee options for a transfer through `messenger`.
	pub async fn gas_fee_options(
		&self,
		source_address: &str,
		destination_address: &str,
		messenger: &str,
	) -> Result<GasFeeOptions, QuoteError> {
		let messenger: Messenger = messenger.parse()?;
		let (source, destination) = self.resolve_pair(source_address, destination_address).await?;
		self.protocol
			.gas_fee_options(&source, &destination, messenger)
			.await
			.map_err(|e| QuoteError::UpstreamFailure(format!("gas fee options for {}: {}", messenger, e)))
	}

	/// Average transfer time in milliseconds, `None` when the protocol has
	/// no figure for the route.
	pub async fn transfer_time(
		&self,
		source_address: &str,
		destination_address: &str,
		messenger: &str,
	) -> Result<Option<u64>, QuoteError> {
		let messenger: Messenger = messenger.parse()?;
		let (source, destination) = self.resolve_pair(source_address, destination_address).await?;
		self.protocol
			.average_transfer_time(&source, &destination, messenger)
			.await
			.map_err(|e| QuoteError::UpstreamFailure(format!("transfer time for {}: {}", messenger, e)))
	}

	/// Transfers waiting on the destination pool for an `amount` atomic
	/// source units transfer.
	pub async fn pending_info(
		&self,
		amount: &str,
		source_address: &str,
		destination_address: &str,
	) -> Result<PendingStatusInfo, QuoteError> {
		require_positive(amount)?;
		let (source, destination) = self.resolve_pair(source_address, destination_address).await?;
		self.protocol
			.pending_status_info(amount, &source, &destination)
			.await
			.map_err(|e| QuoteError::UpstreamFailure(format!("pending info: {}", e)))
	}

	/// Pool fee and swap breakdown for sending `amount` atomic source units.
	pub async fn bridge_details(
		&self,
		amount: &str,
		source_address: &str,
		destination_address: &str,
	) -> Result<SwapCalcInfo, QuoteError> {
		require_positive(amount)?;
		let (source, destination) = self.resolve_pair(source_address, destination_address).await?;
		self.protocol
			.send_amount_details(amount, &source, &destination)
			.await
			.map_err(|e| QuoteError::UpstreamFailure(format!("pool details: {}", e)))
	}

	/// Builds a quote for sending `amount` atomic source units.
	pub async fn quote(
		&self,
		amount: &str,
		source_address: &str,
		destination_address: &str,
	) -> Result<BridgeQuote, QuoteError> {
		require_positive(amount)?;
		let (source, destination) = self.resolve_pair(source_address, destination_address).await?;

		tracing::info!(
			amount = %amount,
			source = %source.symbol,
			source_chain = %source.chain_symbol,
			destination = %destination.symbol,
			destination_chain = %destination.chain_symbol,
			"Building quote"
		);
		let quote = self.quotes.build_quote(amount, &source, &destination).await?;
		tracing::info!(options = quote.options.len(), "Quote built");
		Ok(quote)
	}

	/// Estimates what arrives when `amount` atomic source units are sent
	/// through `messenger`.
	pub async fn receive_amount(
		&self,
		amount: &str,
		source_address: &str,
		destination_address: &str,
		messenger: &str,
		relayer_fee_in_stables: Option<&str>,
	) -> Result<BridgeAmounts, QuoteError> {
		let messenger: Messenger = messenger.parse()?;
		require_positive(amount)?;
		let (source, destination) = self.resolve_pair(source_address, destination_address).await?;

		let amount_float = amount::to_float_gt0(amount, source.decimals)?;
		let stable_fee = relayer_fee(relayer_fee_in_stables, &source)?;
		Ok(self
			.estimator
			.receive(&amount_float, &source, &destination, messenger, stable_fee.as_ref())
			.await)
	}

	/// Estimates how many source units must be sent for `amount` atomic
	/// destination units to arrive through `messenger`.
	pub async fn send_amount(
		&self,
		amount: &str,
		source_address: &str,
		destination_address: &str,
		messenger: &str,
		relayer_fee_in_stables: Option<&str>,
	) -> Result<BridgeAmounts, QuoteError> {
		let messenger: Messenger = messenger.parse()?;
		require_positive(amount)?;
		let (source, destination) = self.resolve_pair(source_address, destination_address).await?;

		let amount_float = amount::to_float_gt0(amount, destination.decimals)?;
		let stable_fee = relayer_fee(relayer_fee_in_stables, &source)?;
		Ok(self
			.estimator
			.send(&amount_float, &source, &destination, messenger, stable_fee.as_ref())
			.await)
	}

	/// Replaces the fee payer of a hex-encoded Solana transaction.
	pub async fn replace_fee_payer(
		&self,
		sponsor: &str,
		tx_hex: &str,
		fund_lamports: Option<u64>,
	) -> Result<String, SponsorError> {
		self.rewriter.rewrite(sponsor, tx_hex, fund_lamports).await
	}

	async fn resolve_pair(&self, source: &str, destination: &str) -> Result<(Token, Token), QuoteError> {
		let (source_token, destination_token) =
			tokio::join!(self.resolve(source), self.resolve(destination));
		Ok((source_token?, destination_token?))
	}

	async fn resolve(&self, address: &str) -> Result<Token, QuoteError> {
		self.protocol
			.find_token(address)
			.await
			.map_err(|e| QuoteError::UpstreamFailure(format!("token list: {}", e)))?
			.ok_or_else(|| QuoteError::TokenNotFound(address.to_string()))
	}
}

/// Rejects anything but a positive integer string.
fn require_positive(amount: &str) -> Result<(), QuoteError> {
	amount::to_float_gt0(amount, 0)?;
	Ok(())
}

/// Converts an optional atomic relayer fee to source token units.
fn relayer_fee(raw: Option<&str>, source: &Token) -> Result<Option<BigDecimal>, QuoteError> {
	let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
		return Ok(None);
	};
	let fee = amount::to_float(raw, source.decimals)?;
	if fee < BigDecimal::zero() {
		return Err(QuoteError::InvalidAmount(raw.to_string()));
	}
	Ok(Some(fee))
}

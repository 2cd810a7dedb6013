//! Config-driven protocol for local runs and tests.
//!
//! Tokens are listed inline in the configuration table. Fees are flat: a
//! fixed native relayer fee, a fixed stablecoin relayer fee and a single
//! liquidity fee share charged once on each pool side for pool-based
//! messengers.

use crate::{ProtocolError, ProtocolInterface};
use async_trait::async_trait;
use bridge_types::{
	amount::{self, Rounding},
	AmountFormatted, ConfigSchema, Field, FieldType, GasFeeOptions, ImplementationRegistry,
	Messenger, PendingStatusInfo, Schema, SwapCalcInfo, Token, ValidationError,
};
use bigdecimal::{num_bigint::Sign, BigDecimal, One, Zero};

/// Configuration schema for the mock protocol.
pub struct MockProtocolSchema;

impl MockProtocolSchema {
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for MockProtocolSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let token = Schema::new(
			vec![
				Field::new("chainSymbol", FieldType::String),
				Field::new("tokenAddress", FieldType::String),
				Field::new("symbol", FieldType::String),
				Field::new(
					"decimals",
					FieldType::Integer {
						min: Some(0),
						max: Some(28),
					},
				),
			],
			vec![
				Field::new("poolAddress", FieldType::String),
				Field::new("cctpFeeShare", FieldType::Decimal),
				Field::new("cctpV2FeeShare", FieldType::Decimal),
			],
		);

		let schema = Schema::new(
			vec![],
			vec![
				Field::new("tokens", FieldType::Array(Box::new(FieldType::Table(token)))),
				Field::new("native_fee", FieldType::String).with_validator(|value| {
					let raw = value.as_str().unwrap_or_default();
					match amount::parse_atomic(raw) {
						Ok(v) if v.sign() != Sign::Minus => Ok(()),
						_ => Err(format!("'{}' is not a non-negative integer", raw)),
					}
				}),
				Field::new(
					"native_decimals",
					FieldType::Integer {
						min: Some(0),
						max: Some(28),
					},
				),
				Field::new("stable_fee", FieldType::Decimal),
				Field::new("lp_fee_share", FieldType::Decimal).with_validator(|value| {
					let share = value
						.as_str()
						.and_then(|s| amount::parse_decimal(s).ok())
						.unwrap_or_default();
					if share < BigDecimal::zero() || share >= BigDecimal::one() {
						return Err("lp_fee_share must be in [0, 1)".to_string());
					}
					Ok(())
				}),
				Field::new(
					"transfer_time_ms",
					FieldType::Integer {
						min: Some(0),
						max: None,
					},
				),
				Field::new("admin_fee_share_with_extras", FieldType::Decimal),
				Field::new(
					"pending_txs",
					FieldType::Integer {
						min: Some(0),
						max: Some(u32::MAX as i64),
					},
				),
			],
		);

		schema.validate(config)
	}
}

/// Protocol whose answers are computed from static configuration.
pub struct MockProtocol {
	tokens: Vec<Token>,
	native_fee: String,
	native_decimals: u32,
	stable_fee: BigDecimal,
	lp_fee_share: BigDecimal,
	transfer_time_ms: Option<u64>,
	admin_fee_share_with_extras: Option<BigDecimal>,
	pending_txs: u32,
}

impl MockProtocol {
	fn new(config: &toml::Value) -> Result<Self, ProtocolError> {
		let tokens = match config.get("tokens") {
			Some(value) => value
				.clone()
				.try_into::<Vec<Token>>()
				.map_err(|e| ProtocolError::Configuration(format!("Invalid tokens: {}", e)))?,
			None => Vec::new(),
		};

		let decimal = |key: &str| -> Result<Option<BigDecimal>, ProtocolError> {
			config
				.get(key)
				.and_then(|v| v.as_str())
				.map(|raw| {
					amount::parse_decimal(raw).map_err(|e| {
						ProtocolError::Configuration(format!("Invalid {}: {}", key, e))
					})
				})
				.transpose()
		};
		let integer = |key: &str| config.get(key).and_then(|v| v.as_integer());

		Ok(Self {
			tokens,
			native_fee: config
				.get("native_fee")
				.and_then(|v| v.as_str())
				.unwrap_or("0")
				.to_string(),
			native_decimals: integer("native_decimals").unwrap_or(18) as u32,
			stable_fee: decimal("stable_fee")?.unwrap_or_default(),
			lp_fee_share: decimal("lp_fee_share")?.unwrap_or_default(),
			transfer_time_ms: integer("transfer_time_ms").map(|v| v as u64),
			admin_fee_share_with_extras: decimal("admin_fee_share_with_extras")?,
			pending_txs: integer("pending_txs").unwrap_or(0) as u32,
		})
	}

	/// Liquidity fee charged on `amount` at one pool.
	fn pool_fee(&self, amount: &BigDecimal, decimals: u32) -> BigDecimal {
		amount::round(&(amount * &self.lp_fee_share), decimals, Rounding::Up)
	}

	/// Source fee, amount leaving the source pool, destination fee and amount
	/// delivered, each rounded to its token's decimals.
	fn pool_path(&self, amount_float: &BigDecimal, source: &Token, destination: &Token) -> SwapCalcInfo {
		let source_fee = self.pool_fee(amount_float, source.decimals);
		let source_swap = amount_float - &source_fee;
		let destination_fee = self.pool_fee(&source_swap, destination.decimals);
		let destination_swap = amount::round(
			&(&source_swap - &destination_fee),
			destination.decimals,
			Rounding::Down,
		);
		SwapCalcInfo {
			source_liquidity_fee: source_fee,
			source_swap,
			destination_liquidity_fee: destination_fee,
			destination_swap,
		}
	}
}

fn amount_error(e: amount::AmountError) -> ProtocolError {
	ProtocolError::Internal(e.to_string())
}

#[async_trait]
impl ProtocolInterface for MockProtocol {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockProtocolSchema)
	}

	async fn tokens(&self) -> Result<Vec<Token>, ProtocolError> {
		Ok(self.tokens.clone())
	}

	async fn gas_fee_options(
		&self,
		source: &Token,
		_destination: &Token,
		messenger: Messenger,
	) -> Result<GasFeeOptions, ProtocolError> {
		let native_float = amount::to_float(&self.native_fee, self.native_decimals).map_err(amount_error)?;

		Ok(GasFeeOptions {
			native: Some(AmountFormatted {
				int: self.native_fee.clone(),
				float: amount::format_plain(&native_float),
			}),
			stablecoin: Some(AmountFormatted {
				int: amount::to_atomic(&self.stable_fee, source.decimals, Rounding::Up),
				float: amount::format_plain(&self.stable_fee),
			}),
			admin_fee_share_with_extras: match messenger {
				Messenger::Oft => self.admin_fee_share_with_extras.clone(),
				_ => None,
			},
		})
	}

	async fn send_amount_details(
		&self,
		amount_int: &str,
		source: &Token,
		destination: &Token,
	) -> Result<SwapCalcInfo, ProtocolError> {
		let amount_float = amount::to_float(amount_int, source.decimals).map_err(amount_error)?;
		Ok(self.pool_path(&amount_float, source, destination))
	}

	async fn pending_status_info(
		&self,
		_amount_int: &str,
		_source: &Token,
		_destination: &Token,
	) -> Result<PendingStatusInfo, ProtocolError> {
		Ok(PendingStatusInfo {
			pending_txs: self.pending_txs,
			pending_amount: AmountFormatted {
				int: "0".to_string(),
				float: "0".to_string(),
			},
		})
	}

	async fn average_transfer_time(
		&self,
		_source: &Token,
		_destination: &Token,
		_messenger: Messenger,
	) -> Result<Option<u64>, ProtocolError> {
		Ok(self.transfer_time_ms)
	}

	async fn amount_to_be_received(
		&self,
		amount_float: BigDecimal,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<BigDecimal, ProtocolError> {
		if !messenger.uses_liquidity_pools() {
			return Ok(amount::round(&amount_float, destination.decimals, Rounding::Down));
		}
		Ok(self.pool_path(&amount_float, source, destination).destination_swap)
	}

	async fn amount_to_send(
		&self,
		amount_float: BigDecimal,
		source: &Token,
		_destination: &Token,
		messenger: Messenger,
	) -> Result<BigDecimal, ProtocolError> {
		if !messenger.uses_liquidity_pools() {
			return Ok(amount::round(&amount_float, source.decimals, Rounding::Up));
		}
		let kept = BigDecimal::one() - &self.lp_fee_share;
		let factor = &kept * &kept;
		if factor.is_zero() {
			return Err(ProtocolError::Internal("liquidity fee share leaves nothing to send".into()));
		}
		Ok(amount::round(&(amount_float / factor), source.decimals, Rounding::Up))
	}
}

/// Registry for the mock protocol implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = crate::ProtocolFactory;

	fn factory() -> Self::Factory {
		create_protocol
	}
}

impl crate::ProtocolRegistry for Registry {}

/// Factory function to create a mock protocol from configuration.
///
/// Configuration parameters:
/// - `tokens`: array of token tables in the protocol's camelCase shape
/// - `native_fee`: native relayer fee in atomic units (default "0")
/// - `native_decimals`: decimals of the native currency (default 18)
/// - `stable_fee`: stablecoin relayer fee in whole tokens (default "0")
/// - `lp_fee_share`: liquidity fee share per pool side (default "0")
/// - `transfer_time_ms`: reported transfer time (default unknown)
/// - `admin_fee_share_with_extras`: OFT admin fee, source atomic units
/// - `pending_txs`: reported pending transfers (default 0)
pub fn create_protocol(config: &toml::Value) -> Result<Box<dyn ProtocolInterface>, ProtocolError> {
	MockProtocolSchema::validate_config(config)
		.map_err(|e| ProtocolError::Configuration(format!("Invalid configuration: {}", e)))?;

	Ok(Box::new(MockProtocol::new(config)?))
}

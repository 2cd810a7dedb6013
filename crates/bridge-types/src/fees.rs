//! Fee and pool data reported by the bridge protocol.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the relayer fee of a transfer is funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeePaymentMethod {
	/// Paid in the source chain's native currency, in native atomic units.
	WithNativeCurrency,
	/// Deducted from the transferred stablecoin, in source-token atomic units.
	WithStablecoin,
}

impl FeePaymentMethod {
	/// Presentation order of payment entries within a quote option.
	pub const ALL: [FeePaymentMethod; 2] = [
		FeePaymentMethod::WithNativeCurrency,
		FeePaymentMethod::WithStablecoin,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			FeePaymentMethod::WithNativeCurrency => "WITH_NATIVE_CURRENCY",
			FeePaymentMethod::WithStablecoin => "WITH_STABLECOIN",
		}
	}
}

impl fmt::Display for FeePaymentMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An amount in both atomic and whole-token form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountFormatted {
	pub int: String,
	pub float: String,
}

/// Relayer fee quoted per payment method for one messenger.
///
/// A method missing from the protocol's answer is not offered for that
/// messenger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasFeeOptions {
	#[serde(
		rename = "WITH_NATIVE_CURRENCY",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub native: Option<AmountFormatted>,
	#[serde(
		rename = "WITH_STABLECOIN",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub stablecoin: Option<AmountFormatted>,
	/// OFT admin fee including extras, scaled by the source token's decimals.
	#[serde(
		rename = "adminFeeShareWithExtras",
		default,
		skip_serializing_if = "Option::is_none",
		with = "crate::amount::plain_option"
	)]
	pub admin_fee_share_with_extras: Option<BigDecimal>,
}

impl GasFeeOptions {
	/// Fee data for `method`, if the protocol offers it.
	pub fn fee_for(&self, method: FeePaymentMethod) -> Option<&AmountFormatted> {
		match method {
			FeePaymentMethod::WithNativeCurrency => self.native.as_ref(),
			FeePaymentMethod::WithStablecoin => self.stablecoin.as_ref(),
		}
	}
}

/// Liquidity-pool adjustments for a transfer, in whole-token units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapCalcInfo {
	#[serde(with = "crate::amount::plain")]
	pub source_liquidity_fee: BigDecimal,
	#[serde(with = "crate::amount::plain")]
	pub source_swap: BigDecimal,
	#[serde(with = "crate::amount::plain")]
	pub destination_liquidity_fee: BigDecimal,
	#[serde(with = "crate::amount::plain")]
	pub destination_swap: BigDecimal,
}

/// Transfers waiting to be processed on the destination pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingStatusInfo {
	pub pending_txs: u32,
	pub pending_amount: AmountFormatted,
}

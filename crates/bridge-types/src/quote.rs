//! Quote response structures.
//!
//! A [`BridgeQuote`] is built once per request and never modified. Monetary
//! fields are atomic integer strings unless the field name says "float".

use crate::{FeePaymentMethod, Messenger};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value that may be unavailable because its collaborator call failed or
/// the inputs made it meaningless.
///
/// Serialised as the value itself or `null`, so clients can tell "unknown"
/// apart from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Estimate<T> {
	Available(T),
	Unavailable,
}

impl<T> Estimate<T> {
	pub fn is_available(&self) -> bool {
		matches!(self, Estimate::Available(_))
	}

	pub fn as_option(&self) -> Option<&T> {
		match self {
			Estimate::Available(value) => Some(value),
			Estimate::Unavailable => None,
		}
	}

	pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Estimate<U> {
		match self {
			Estimate::Available(value) => Estimate::Available(f(value)),
			Estimate::Unavailable => Estimate::Unavailable,
		}
	}
}

impl<T> From<Option<T>> for Estimate<T> {
	fn from(value: Option<T>) -> Self {
		value.map_or(Estimate::Unavailable, Estimate::Available)
	}
}

impl<T: Serialize> Serialize for Estimate<T> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.as_option().serialize(serializer)
	}
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Estimate<T> {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<T>::deserialize(deserializer).map(Estimate::from)
	}
}

/// Receive range for one payment method. Both bounds carry the same single
/// estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedAmount {
	pub min: String,
	pub max: String,
}

/// Liquidity-pool adjustments converted to atomic units.
///
/// Source fields use the source token's decimals, destination fields the
/// destination token's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LpFee {
	pub source_liquidity_fee: String,
	pub source_swap: String,
	pub destination_liquidity_fee: String,
	pub destination_swap: String,
}

impl LpFee {
	pub fn zero() -> Self {
		Self {
			source_liquidity_fee: "0".to_string(),
			source_swap: "0".to_string(),
			destination_liquidity_fee: "0".to_string(),
			destination_swap: "0".to_string(),
		}
	}
}

/// One fee-payment method offered by a messenger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePayment {
	pub fee_payment_method: FeePaymentMethod,
	/// Relayer fee in the unit implied by the method.
	pub fee: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pending_txs: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pending_amount: Option<String>,
	pub estimated_amount: Estimate<EstimatedAmount>,
	pub relayer_fee_in_stable: String,
	pub relayer_fee_in_native: String,
	pub lp_fee: LpFee,
	/// Negated total liquidity fee in destination atomic units.
	pub lp_fee_total: String,
	pub transfer_fee: String,
}

/// All payment methods for one messenger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteOption {
	pub messenger: Messenger,
	pub messenger_index: u8,
	pub estimated_time_ms: Option<u64>,
	pub source_tx_cost_in_native: String,
	pub payment_methods: Vec<QuotePayment>,
}

/// Quote for moving `amount_int` of the source token to the destination token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeQuote {
	pub amount_int: String,
	pub amount_float: String,
	pub source_token_address: String,
	pub destination_token_address: String,
	pub options: Vec<QuoteOption>,
}

/// Result of a send or receive calculation, in whole-token units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeAmounts {
	#[serde(with = "plain_estimate")]
	pub amount_in_float: Estimate<BigDecimal>,
	#[serde(with = "plain_estimate")]
	pub amount_received_in_float: Estimate<BigDecimal>,
}

mod plain_estimate {
	use super::Estimate;
	use crate::amount::{Parsed, Plain};
	use bigdecimal::BigDecimal;
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S: Serializer>(
		value: &Estimate<BigDecimal>,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		value.as_option().map(Plain).serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Estimate<BigDecimal>, D::Error> {
		Option::<Parsed>::deserialize(deserializer).map(|parsed| parsed.map(|p| p.0).into())
	}
}

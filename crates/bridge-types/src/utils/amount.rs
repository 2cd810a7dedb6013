//! Fixed-point conversion between atomic and decimal token amounts.
//!
//! Atomic amounts are integers in a token's smallest unit, carried as
//! strings. Decimal amounts are [`BigDecimal`] values in whole-token units
//! with unbounded precision, so any atomic amount converts exactly whatever
//! its size. Conversions never go through binary floating point. Where a
//! conversion has to drop digits the caller chooses the direction: amounts a
//! user will receive round [`Rounding::Down`], amounts a user must pay round
//! [`Rounding::Up`].
//!
//! Decimals always leave the process in plain notation ("0.000001", never
//! "1E-6"); see [`format_plain`] and the serde adapters below.

use bigdecimal::{
	num_bigint::{BigInt, Sign},
	BigDecimal, RoundingMode, Zero,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced by amount parsing and conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
}

/// Direction used when a conversion has to drop digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
	/// Toward zero.
	Down,
	/// Away from zero.
	Up,
}

impl Rounding {
	fn mode(self) -> RoundingMode {
		match self {
			Rounding::Down => RoundingMode::Down,
			Rounding::Up => RoundingMode::Up,
		}
	}
}

/// Parses an atomic integer amount such as `"100500000"`.
///
/// Only an optional minus sign followed by ASCII digits is accepted.
pub fn parse_atomic(raw: &str) -> Result<BigInt, AmountError> {
	let trimmed = raw.trim();
	let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return Err(AmountError::InvalidAmount(raw.to_string()));
	}
	BigInt::from_str(trimmed).map_err(|_| AmountError::InvalidAmount(raw.to_string()))
}

/// Parses a decimal amount such as `"100.5"` or `"1e-6"`.
pub fn parse_decimal(raw: &str) -> Result<BigDecimal, AmountError> {
	BigDecimal::from_str(raw.trim()).map_err(|_| AmountError::InvalidAmount(raw.to_string()))
}

/// Divides `value` by `10^decimals` without rounding.
pub fn scale_down(value: &BigDecimal, decimals: u32) -> BigDecimal {
	let (digits, scale) = value.as_bigint_and_exponent();
	BigDecimal::new(digits, scale + i64::from(decimals)).normalized()
}

/// Converts an atomic amount to whole-token units.
///
/// The result is exact and normalised, so `to_float("100500000", 6)` is
/// `100.5` and a zero amount is exactly `0`.
pub fn to_float(atomic: &str, decimals: u32) -> Result<BigDecimal, AmountError> {
	Ok(BigDecimal::new(parse_atomic(atomic)?, i64::from(decimals)).normalized())
}

/// Like [`to_float`] but rejects zero and negative amounts.
///
/// Used to refuse a request before any collaborator is contacted.
pub fn to_float_gt0(atomic: &str, decimals: u32) -> Result<BigDecimal, AmountError> {
	let value = to_float(atomic, decimals)?;
	if value <= BigDecimal::zero() {
		return Err(AmountError::InvalidAmount(atomic.to_string()));
	}
	Ok(value)
}

/// Converts a whole-token amount to atomic units, rounding any digits past
/// `decimals` in the given direction.
pub fn to_atomic(value: &BigDecimal, decimals: u32, rounding: Rounding) -> String {
	let (digits, _) = value
		.with_scale_round(i64::from(decimals), rounding.mode())
		.into_bigint_and_exponent();
	digits.to_string()
}

/// Returns `ceil(amount * share)` for an atomic amount and a fractional
/// share such as a protocol fee ratio.
pub fn apply_share(amount_int: &str, share: &BigDecimal) -> Result<String, AmountError> {
	let amount = BigDecimal::new(parse_atomic(amount_int)?, 0);
	Ok(to_atomic(&(amount * share), 0, Rounding::Up))
}

/// Rounds to `dp` places, halves away from zero.
pub fn round_half_up(value: &BigDecimal, dp: u32) -> BigDecimal {
	value
		.with_scale_round(i64::from(dp), RoundingMode::HalfUp)
		.normalized()
}

/// Rounds to `dp` places in the given direction.
pub fn round(value: &BigDecimal, dp: u32, rounding: Rounding) -> BigDecimal {
	value
		.with_scale_round(i64::from(dp), rounding.mode())
		.normalized()
}

/// Renders `value` without an exponent and without trailing zeros.
pub fn format_plain(value: &BigDecimal) -> String {
	let (digits, scale) = value.normalized().into_bigint_and_exponent();
	if digits.is_zero() {
		return "0".to_string();
	}
	if scale <= 0 {
		let mut out = digits.to_string();
		out.push_str(&"0".repeat(scale.unsigned_abs() as usize));
		return out;
	}

	let sign = if digits.sign() == Sign::Minus { "-" } else { "" };
	let magnitude = digits.magnitude().to_string();
	let scale = scale.unsigned_abs() as usize;
	if magnitude.len() > scale {
		let (whole, fraction) = magnitude.split_at(magnitude.len() - scale);
		format!("{}{}.{}", sign, whole, fraction)
	} else {
		format!("{}0.{}{}", sign, "0".repeat(scale - magnitude.len()), magnitude)
	}
}

/// Borrowed decimal that serialises in plain notation.
pub struct Plain<'a>(pub &'a BigDecimal);

impl Serialize for Plain<'_> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&format_plain(self.0))
	}
}

/// Decimal read from either a string or a number.
///
/// Floating point input is read through its shortest round-trip text so
/// `0.1` arrives as exactly one tenth.
pub struct Parsed(pub BigDecimal);

struct ParsedVisitor;

impl<'de> de::Visitor<'de> for ParsedVisitor {
	type Value = Parsed;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a decimal string or number")
	}

	fn visit_str<E: de::Error>(self, v: &str) -> Result<Parsed, E> {
		parse_decimal(v).map(Parsed).map_err(E::custom)
	}

	fn visit_i64<E: de::Error>(self, v: i64) -> Result<Parsed, E> {
		Ok(Parsed(BigDecimal::from(v)))
	}

	fn visit_u64<E: de::Error>(self, v: u64) -> Result<Parsed, E> {
		Ok(Parsed(BigDecimal::from(v)))
	}

	fn visit_f64<E: de::Error>(self, v: f64) -> Result<Parsed, E> {
		parse_decimal(&v.to_string()).map(Parsed).map_err(E::custom)
	}
}

impl<'de> Deserialize<'de> for Parsed {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_any(ParsedVisitor)
	}
}

/// `#[serde(with = "...")]` adapter for `BigDecimal` fields.
pub mod plain {
	use super::{Parsed, Plain};
	use bigdecimal::BigDecimal;
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
		Plain(value).serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
		Parsed::deserialize(deserializer).map(|parsed| parsed.0)
	}
}

/// `#[serde(with = "...")]` adapter for `Option<BigDecimal>` fields.
pub mod plain_option {
	use super::{Parsed, Plain};
	use bigdecimal::BigDecimal;
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S: Serializer>(
		value: &Option<BigDecimal>,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		value.as_ref().map(Plain).serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Option<BigDecimal>, D::Error> {
		Option::<Parsed>::deserialize(deserializer).map(|parsed| parsed.map(|p| p.0))
	}
}

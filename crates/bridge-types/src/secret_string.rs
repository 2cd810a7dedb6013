//! Redacting string wrapper for credentials.
//!
//! Upstream protocol APIs are usually reached with an API key or a bearer
//! token in a header. `SecretString` keeps such values out of logs and debug
//! output and wipes the backing buffer on drop.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// A credential that zeroes its memory on drop and never prints itself.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	/// Wraps an owned string.
	pub fn new(value: String) -> Self {
		Self(Zeroizing::new(value))
	}

	/// Returns the raw value.
	///
	/// Only call this at the point where the value leaves the process, such as
	/// when building an outgoing request header.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	/// Runs `f` with the raw value, limiting how long it stays borrowed.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	/// Returns true if no credential was provided.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

// Serialised configs are only ever written for diagnostics.
impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(SecretString::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_api_key_never_printed() {
		let key = SecretString::from("sk-live-1234");
		assert_eq!(format!("{:?}", key), "SecretString(***REDACTED***)");
		assert_eq!(format!("{}", key), REDACTED);
		assert_eq!(serde_json::to_string(&key).unwrap(), "\"***REDACTED***\"");
	}

	#[test]
	fn test_api_key_exposed_on_demand() {
		let key: SecretString = serde_json::from_str("\"sk-live-1234\"").unwrap();
		assert_eq!(key.expose_secret(), "sk-live-1234");
		let header = key.with_exposed(|k| format!("Bearer {}", k));
		assert_eq!(header, "Bearer sk-live-1234");
		assert!(!key.is_empty());
	}
}

//! String formatting utilities.
//!
//! Hex prefix handling for transaction payloads and shortening of long
//! identifiers for log output.

/// Shortens an identifier to its first 8 characters followed by "..".
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((cut, _)) => format!("{}..", &id[..cut]),
		None => id.to_string(),
	}
}

/// Removes a leading "0x" or "0X" from a hex string if present.
///
/// Clients of the fee-payer endpoint send serialized transactions both with
/// and without the prefix.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("Sponsor1111"), "Sponsor1..");
		assert_eq!(truncate_id("short"), "short");
		assert_eq!(truncate_id("exactly8"), "exactly8");
	}

	#[test]
	fn test_strip_hex_prefix() {
		assert_eq!(without_0x_prefix("0xabcd"), "abcd");
		assert_eq!(without_0x_prefix("0Xabcd"), "abcd");
		assert_eq!(without_0x_prefix("abcd"), "abcd");
	}
}

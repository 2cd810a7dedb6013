//! Token descriptors reported by the bridge protocol.
//!
//! A [`Token`] is an immutable snapshot of one asset on one chain together
//! with the capability addresses that decide which messengers can carry it.
//! The gateway never edits these; they are refreshed from the protocol
//! collaborator as a whole.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sui-specific addresses attached to a token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiAddresses {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub wormhole_messenger_address: Option<String>,
}

/// A fungible asset on one chain, with its per-protocol capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
	/// Chain symbol such as "ETH", "SOL" or "SUI".
	pub chain_symbol: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<String>,
	pub token_address: String,
	/// Liquidity pool holding this token on its chain.
	#[serde(default)]
	pub pool_address: String,
	pub symbol: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	pub decimals: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bridge_address: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cctp_address: Option<String>,
	/// Fraction of the amount charged by the first CCTP generation.
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		with = "crate::amount::plain_option"
	)]
	pub cctp_fee_share: Option<BigDecimal>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cctp_v2_address: Option<String>,
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		with = "crate::amount::plain_option"
	)]
	pub cctp_v2_fee_share: Option<BigDecimal>,
	/// Grouping identifier; OFT transfers need equal ids on both sides.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub oft_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub oft_bridge_address: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sui_addresses: Option<SuiAddresses>,
}

/// Treats empty strings from the protocol as absent.
fn present(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|v| !v.is_empty())
}

impl Token {
	pub fn wormhole_messenger_address(&self) -> Option<&str> {
		self.sui_addresses
			.as_ref()
			.and_then(|sui| present(&sui.wormhole_messenger_address))
	}

	pub fn cctp_address(&self) -> Option<&str> {
		present(&self.cctp_address)
	}

	pub fn cctp_v2_address(&self) -> Option<&str> {
		present(&self.cctp_v2_address)
	}

	pub fn oft_id(&self) -> Option<&str> {
		present(&self.oft_id)
	}

	pub fn oft_bridge_address(&self) -> Option<&str> {
		present(&self.oft_bridge_address)
	}

	/// Returns true if `address` names this token or its pool.
	///
	/// Comparison is case-insensitive so EVM checksummed and lowercase
	/// addresses both resolve.
	pub fn matches_address(&self, address: &str) -> bool {
		self.token_address.eq_ignore_ascii_case(address)
			|| (!self.pool_address.is_empty() && self.pool_address.eq_ignore_ascii_case(address))
	}
}

/// Tokens available on one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDetails {
	pub chain_symbol: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<String>,
	pub tokens: Vec<Token>,
}

/// Groups tokens by chain symbol, keeping the protocol's token order within
/// each chain. The chain id is taken from the first token that carries one.
pub fn group_by_chain(tokens: &[Token]) -> BTreeMap<String, ChainDetails> {
	let mut chains: BTreeMap<String, ChainDetails> = BTreeMap::new();
	for token in tokens {
		let entry = chains
			.entry(token.chain_symbol.clone())
			.or_insert_with(|| ChainDetails {
				chain_symbol: token.chain_symbol.clone(),
				chain_id: None,
				tokens: Vec::new(),
			});
		if entry.chain_id.is_none() {
			entry.chain_id = token.chain_id.clone();
		}
		entry.tokens.push(token.clone());
	}
	chains
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_token_from_protocol_json() {
		let json = r#"{
			"chainSymbol": "SOL",
			"tokenAddress": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
			"poolAddress": "BrEAK7zGZ6dM71zUDACDqJnekihmwF15noTddWTsknjC",
			"symbol": "USDC",
			"decimals": 6,
			"cctpAddress": "",
			"cctpV2Address": "CCTPV2vPZJS2u2BBsUoscuikbYjnpFmbFsvVuJdgUMQe",
			"cctpV2FeeShare": "0.0001",
			"oftId": "usdc",
			"suiAddresses": { "wormholeMessengerAddress": "0xabc" }
		}"#;
		let token: Token = serde_json::from_str(json).unwrap();
		assert_eq!(token.decimals, 6);
		assert_eq!(token.cctp_address(), None);
		assert!(token.cctp_v2_address().is_some());
		assert_eq!(token.cctp_v2_fee_share, Some(crate::amount::parse_decimal("0.0001").unwrap()));
		assert_eq!(token.oft_id(), Some("usdc"));
		assert_eq!(token.wormhole_messenger_address(), Some("0xabc"));
		assert_eq!(token.oft_bridge_address(), None);
	}

	#[test]
	fn test_matches_token_or_pool_address() {
		let token: Token = serde_json::from_str(
			r#"{"chainSymbol":"ETH","tokenAddress":"0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
			"poolAddress":"0xa7062bbA94c91d565Ae33B893Ab5dFAF1Fc57C4d","symbol":"USDC","decimals":6}"#,
		)
		.unwrap();
		assert!(token.matches_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
		assert!(token.matches_address("0xA7062BBA94C91D565AE33B893AB5DFAF1FC57C4D"));
		assert!(!token.matches_address("0x0000000000000000000000000000000000000000"));
		assert!(!token.matches_address(""));
	}

	#[test]
	fn test_group_by_chain() {
		let tokens: Vec<Token> = serde_json::from_str(
			r#"[
				{"chainSymbol":"ETH","tokenAddress":"0x1","symbol":"USDC","decimals":6},
				{"chainSymbol":"SOL","chainId":"sol-mainnet","tokenAddress":"So1","symbol":"USDC","decimals":6},
				{"chainSymbol":"ETH","chainId":"0x1","tokenAddress":"0x2","symbol":"USDT","decimals":6}
			]"#,
		)
		.unwrap();
		let chains = group_by_chain(&tokens);
		assert_eq!(chains.len(), 2);
		let eth = &chains["ETH"];
		assert_eq!(eth.chain_id.as_deref(), Some("0x1"));
		let symbols: Vec<_> = eth.tokens.iter().map(|t| t.symbol.as_str()).collect();
		assert_eq!(symbols, vec!["USDC", "USDT"]);
		assert_eq!(chains["SOL"].chain_id.as_deref(), Some("sol-mainnet"));

		let json = serde_json::to_value(&chains).unwrap();
		assert_eq!(json["SOL"]["chainSymbol"], "SOL");
		assert!(group_by_chain(&[]).is_empty());
	}
}

//! Shared test fixtures.

use bridge_protocol::{MockProtocolInterface, ProtocolInterface, ProtocolService};
use bridge_types::{amount, SuiAddresses, Token};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A plain token with no messenger capabilities beyond Allbridge.
pub fn token(address: &str, decimals: u32) -> Token {
	serde_json::from_value(serde_json::json!({
		"chainSymbol": "ETH",
		"tokenAddress": address,
		"poolAddress": "",
		"symbol": "USDC",
		"decimals": decimals,
	}))
	.unwrap()
}

pub trait TokenExt {
	fn with_wormhole(self, address: &str) -> Self;
	fn with_cctp(self, address: &str, share: Option<&str>) -> Self;
	fn with_cctp_v2(self, address: &str, share: Option<&str>) -> Self;
	fn with_oft(self, id: &str, bridge: &str) -> Self;
}

impl TokenExt for Token {
	fn with_wormhole(mut self, address: &str) -> Self {
		self.sui_addresses = Some(SuiAddresses {
			wormhole_messenger_address: Some(address.to_string()),
		});
		self
	}

	fn with_cctp(mut self, address: &str, share: Option<&str>) -> Self {
		self.cctp_address = Some(address.to_string());
		self.cctp_fee_share = share.map(|s| amount::parse_decimal(s).unwrap());
		self
	}

	fn with_cctp_v2(mut self, address: &str, share: Option<&str>) -> Self {
		self.cctp_v2_address = Some(address.to_string());
		self.cctp_v2_fee_share = share.map(|s| amount::parse_decimal(s).unwrap());
		self
	}

	fn with_oft(mut self, id: &str, bridge: &str) -> Self {
		self.oft_id = Some(id.to_string());
		self.oft_bridge_address = Some(bridge.to_string());
		self
	}
}

/// Wraps a mock protocol in a service registered as "mock".
pub fn protocol_service(mock: MockProtocolInterface) -> Arc<ProtocolService> {
	let mut implementations: HashMap<String, Arc<dyn ProtocolInterface>> = HashMap::new();
	implementations.insert("mock".to_string(), Arc::new(mock));
	Arc::new(
		ProtocolService::new(implementations, "mock".to_string(), Duration::from_secs(300))
			.unwrap(),
	)
}

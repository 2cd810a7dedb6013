//! Transport protocols able to carry a cross-chain transfer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a messenger name is not one of the known protocols.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported messenger: {0}")]
pub struct UnsupportedMessenger(pub String);

/// A transport protocol used to attest or relay a transfer.
///
/// The declaration order is the presentation order of quote options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Messenger {
	/// Default pool-based bridge protocol, always available.
	Allbridge,
	/// Alternate attestation protocol.
	Wormhole,
	/// First generation of the native burn-and-mint protocol.
	Cctp,
	/// Second generation of the native burn-and-mint protocol.
	CctpV2,
	/// Fungible-token bridge protocol.
	Oft,
}

impl Messenger {
	pub const ALL: [Messenger; 5] = [
		Messenger::Allbridge,
		Messenger::Wormhole,
		Messenger::Cctp,
		Messenger::CctpV2,
		Messenger::Oft,
	];

	/// Numeric identifier used by the protocol's contracts.
	pub fn index(self) -> u8 {
		match self {
			Messenger::Allbridge => 1,
			Messenger::Wormhole => 2,
			Messenger::Cctp => 3,
			Messenger::CctpV2 => 4,
			Messenger::Oft => 5,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Messenger::Allbridge => "ALLBRIDGE",
			Messenger::Wormhole => "WORMHOLE",
			Messenger::Cctp => "CCTP",
			Messenger::CctpV2 => "CCTP_V2",
			Messenger::Oft => "OFT",
		}
	}

	/// Returns true for the messengers that route through liquidity pools.
	pub fn uses_liquidity_pools(self) -> bool {
		matches!(self, Messenger::Allbridge | Messenger::Wormhole)
	}
}

impl fmt::Display for Messenger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Messenger {
	type Err = UnsupportedMessenger;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Messenger::ALL
			.into_iter()
			.find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| UnsupportedMessenger(s.to_string()))
	}
}

//! Messenger eligibility for a token pair.

use bridge_types::{Messenger, Token};

/// Returns the messengers able to carry a transfer between `source` and
/// `destination`, in presentation order.
///
/// Allbridge is always eligible. The others need matching capabilities on
/// both tokens: a Wormhole messenger address, a CCTP address of the same
/// generation, or equal non-empty OFT ids.
pub fn detect(source: &Token, destination: &Token) -> Vec<Messenger> {
	Messenger::ALL
		.into_iter()
		.filter(|messenger| supports(*messenger, source, destination))
		.collect()
}

fn supports(messenger: Messenger, source: &Token, destination: &Token) -> bool {
	match messenger {
		Messenger::Allbridge => true,
		Messenger::Wormhole => {
			source.wormhole_messenger_address().is_some()
				&& destination.wormhole_messenger_address().is_some()
		},
		Messenger::Cctp => source.cctp_address().is_some() && destination.cctp_address().is_some(),
		Messenger::CctpV2 => {
			source.cctp_v2_address().is_some() && destination.cctp_v2_address().is_some()
		},
		Messenger::Oft => matches!(
			(source.oft_id(), destination.oft_id()),
			(Some(a), Some(b)) if a == b
		),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::{token, TokenExt};

	#[test]
	fn test_plain_pair_gets_allbridge_only() {
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 18));
		assert_eq!(detect(&src, &dst), vec![Messenger::Allbridge]);
	}

	#[test]
	fn test_capabilities_must_be_on_both_sides() {
		let src = token("0xsrc", 6).with_cctp("0xc1", None).with_oft("usdc", "0xo1");
		let dst = token("0xdst", 6).with_cctp("0xc2", None);
		assert_eq!(
			detect(&src, &dst),
			vec![Messenger::Allbridge, Messenger::Cctp]
		);
	}

	#[test]
	fn test_full_capability_order() {
		let src = token("0xsrc", 6)
			.with_wormhole("0xw1")
			.with_cctp("0xc1", None)
			.with_cctp_v2("0xv1", None)
			.with_oft("usdc", "0xo1");
		let dst = token("0xdst", 6)
			.with_wormhole("0xw2")
			.with_cctp("0xc2", None)
			.with_cctp_v2("0xv2", None)
			.with_oft("usdc", "0xo2");
		assert_eq!(detect(&src, &dst), Messenger::ALL.to_vec());
	}

	#[test]
	fn test_oft_ids_must_match() {
		let src = token("0xsrc", 6).with_oft("usdc", "0xo1");
		let dst = token("0xdst", 6).with_oft("usdt", "0xo2");
		assert!(!detect(&src, &dst).contains(&Messenger::Oft));
	}

	#[test]
	fn test_adding_capability_never_removes_messengers() {
		let src = token("0xsrc", 6).with_cctp("0xc1", None);
		let dst = token("0xdst", 6).with_cctp("0xc2", None);
		let before = detect(&src, &dst);

		let after = detect(&src.clone().with_wormhole("0xw1"), &dst.clone().with_wormhole("0xw2"));
		assert!(before.iter().all(|m| after.contains(m)));
		assert_eq!(after.len(), before.len() + 1);
	}
}

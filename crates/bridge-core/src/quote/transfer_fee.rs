//! Protocol transfer fee charged on top of the relayer fee.

use super::QuoteError;
use bridge_types::{amount, GasFeeOptions, Messenger, Token};
use bigdecimal::BigDecimal;

/// Computes the transfer fee for `amount_int` source units, in source atomic
/// units.
///
/// CCTP generations charge `ceil(amount * feeShare)` when both tokens expose
/// that generation's address and the source carries a share. OFT charges
/// `ceil(amount * adminFeeShareWithExtras / 10^decimals)` when the ids match
/// and both tokens expose an OFT bridge; the admin fee comes from the gas-fee
/// options already fetched for the OFT route. Everything else is free.
pub fn transfer_fee(
	messenger: Messenger,
	amount_int: &str,
	source: &Token,
	destination: &Token,
	gas_fee_options: &GasFeeOptions,
) -> Result<String, QuoteError> {
	match messenger {
		Messenger::Allbridge | Messenger::Wormhole => Ok(zero()),
		Messenger::Cctp => share_fee(
			amount_int,
			source.cctp_address().and(destination.cctp_address()),
			source.cctp_fee_share.as_ref(),
		),
		Messenger::CctpV2 => share_fee(
			amount_int,
			source.cctp_v2_address().and(destination.cctp_v2_address()),
			source.cctp_v2_fee_share.as_ref(),
		),
		Messenger::Oft => {
			let same_id = matches!(
				(source.oft_id(), destination.oft_id()),
				(Some(a), Some(b)) if a == b
			);
			let bridged =
				source.oft_bridge_address().is_some() && destination.oft_bridge_address().is_some();
			if !(same_id && bridged) {
				return Ok(zero());
			}

			let admin_fee = gas_fee_options
				.admin_fee_share_with_extras
				.as_ref()
				.ok_or_else(|| {
					QuoteError::UpstreamFailure("OFT gas fee options carry no adminFeeShareWithExtras".into())
				})?;
			let share = amount::scale_down(admin_fee, source.decimals);
			Ok(amount::apply_share(amount_int, &share)?)
		},
	}
}

fn share_fee(
	amount_int: &str,
	both_addresses: Option<&str>,
	share: Option<&BigDecimal>,
) -> Result<String, QuoteError> {
	match (both_addresses, share) {
		(Some(_), Some(share)) => Ok(amount::apply_share(amount_int, share)?),
		_ => Ok(zero()),
	}
}

fn zero() -> String {
	"0".to_string()
}

//! Receive and send amount estimation.
//!
//! Both directions work in whole-token units and never fail: a collaborator
//! error or a meaningless input yields [`Estimate::Unavailable`] for the
//! computed side, and the error is logged.

use bridge_protocol::ProtocolService;
use bridge_types::{
	amount::{self, Rounding},
	BridgeAmounts, Estimate, Messenger, Token,
};
use bigdecimal::{BigDecimal, Zero};
use std::sync::Arc;

/// Estimates transfer amounts through the protocol collaborator.
#[derive(Clone)]
pub struct AmountEstimator {
	protocol: Arc<ProtocolService>,
}

impl AmountEstimator {
	pub fn new(protocol: Arc<ProtocolService>) -> Self {
		Self { protocol }
	}

	/// Estimates what arrives when `amount_float` is sent.
	///
	/// A stablecoin relayer fee is deducted from the sent amount first and
	/// the remainder rounded half-up to the source decimals. A remainder of
	/// zero or less is unavailable.
	pub async fn receive(
		&self,
		amount_float: &BigDecimal,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
		stable_fee: Option<&BigDecimal>,
	) -> BridgeAmounts {
		let unavailable = BridgeAmounts {
			amount_in_float: Estimate::Available(amount_float.clone()),
			amount_received_in_float: Estimate::Unavailable,
		};

		let to_send = match stable_fee {
			Some(fee) => amount::round_half_up(&(amount_float - fee), source.decimals),
			None => amount_float.clone(),
		};
		if to_send <= BigDecimal::zero() {
			tracing::debug!(
				amount = %amount_float,
				messenger = %messenger,
				"Relayer fee consumes the whole amount"
			);
			return unavailable;
		}

		match self
			.protocol
			.amount_to_be_received(to_send, source, destination, messenger)
			.await
		{
			Ok(received) => BridgeAmounts {
				amount_in_float: Estimate::Available(amount_float.clone()),
				amount_received_in_float: Estimate::Available(received),
			},
			Err(e) => {
				tracing::warn!(
					messenger = %messenger,
					error = %e,
					"Receive estimate unavailable"
				);
				unavailable
			},
		}
	}

	/// Estimates what must be sent for `amount_received_float` to arrive.
	///
	/// The wanted amount is rounded half-up to the destination decimals
	/// before the protocol is asked; a stablecoin relayer fee is added to
	/// the answer, which is then rounded up to the source decimals.
	pub async fn send(
		&self,
		amount_received_float: &BigDecimal,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
		stable_fee: Option<&BigDecimal>,
	) -> BridgeAmounts {
		let unavailable = BridgeAmounts {
			amount_in_float: Estimate::Unavailable,
			amount_received_in_float: Estimate::Available(amount_received_float.clone()),
		};

		let wanted = amount::round_half_up(amount_received_float, destination.decimals);
		let to_send = match self
			.protocol
			.amount_to_send(wanted, source, destination, messenger)
			.await
		{
			Ok(to_send) => to_send,
			Err(e) => {
				tracing::warn!(
					messenger = %messenger,
					error = %e,
					"Send estimate unavailable"
				);
				return unavailable;
			},
		};

		let total = match stable_fee {
			Some(fee) => to_send + fee,
			None => to_send,
		};
		BridgeAmounts {
			amount_in_float: Estimate::Available(amount::round(&total, source.decimals, Rounding::Up)),
			amount_received_in_float: Estimate::Available(amount_received_float.clone()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::{protocol_service, token};
	use bridge_protocol::{MockProtocolInterface, ProtocolError};
	fn dec(s: &str) -> BigDecimal {
		amount::parse_decimal(s).unwrap()
	}

	#[tokio::test]
	async fn test_receive_deducts_stable_fee() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_amount_to_be_received()
			.withf(|amount, _, _, _| *amount == dec("9.98"))
			.times(1)
			.returning(|amount, _, _, _| Ok(amount - dec("0.01")));
		let estimator = AmountEstimator::new(protocol_service(mock));
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 6));

		let result = estimator
			.receive(&dec("10"), &src, &dst, Messenger::Allbridge, Some(&dec("0.02")))
			.await;
		assert_eq!(result.amount_in_float, Estimate::Available(dec("10")));
		assert_eq!(result.amount_received_in_float, Estimate::Available(dec("9.97")));
	}

	#[tokio::test]
	async fn test_receive_unavailable_when_fee_exceeds_amount() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_amount_to_be_received().never();
		let estimator = AmountEstimator::new(protocol_service(mock));
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 6));

		let result = estimator
			.receive(&dec("0.02"), &src, &dst, Messenger::Allbridge, Some(&dec("0.02")))
			.await;
		assert_eq!(result.amount_received_in_float, Estimate::Unavailable);
	}

	#[tokio::test]
	async fn test_receive_failure_is_unavailable_not_zero() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_amount_to_be_received()
			.returning(|_, _, _, _| Err(ProtocolError::Network("timeout".into())));
		let estimator = AmountEstimator::new(protocol_service(mock));
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 6));

		let result = estimator
			.receive(&dec("5"), &src, &dst, Messenger::Cctp, None)
			.await;
		assert_eq!(result.amount_received_in_float, Estimate::Unavailable);
		assert_eq!(result.amount_in_float, Estimate::Available(dec("5")));
	}

	#[tokio::test]
	async fn test_send_rounds_and_adds_fee() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_amount_to_send()
			.withf(|amount, _, _, _| *amount == dec("1.000001"))
			.returning(|_, _, _, _| Ok(dec("1.0100001")));
		let estimator = AmountEstimator::new(protocol_service(mock));
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 6));

		let result = estimator
			.send(&dec("1.0000005"), &src, &dst, Messenger::Allbridge, Some(&dec("0.02")))
			.await;
		assert_eq!(result.amount_in_float, Estimate::Available(dec("1.030001")));
		assert_eq!(result.amount_received_in_float, Estimate::Available(dec("1.0000005")));
	}

	#[tokio::test]
	async fn test_send_failure_keeps_requested_amount() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_amount_to_send()
			.returning(|_, _, _, _| Err(ProtocolError::Internal("no pool".into())));
		let estimator = AmountEstimator::new(protocol_service(mock));
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 6));

		let result = estimator
			.send(&dec("3"), &src, &dst, Messenger::Allbridge, None)
			.await;
		assert_eq!(result.amount_in_float, Estimate::Unavailable);
		assert_eq!(result.amount_received_in_float, Estimate::Available(dec("3")));
	}
}

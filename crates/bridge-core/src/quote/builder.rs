//! Quote assembly.

use super::{messengers, transfer_fee::transfer_fee, AmountEstimator, QuoteError};
use bigdecimal::BigDecimal;
use bridge_protocol::ProtocolService;
use bridge_types::{
	amount::{self, Rounding},
	AmountFormatted, BridgeQuote, EstimatedAmount, FeePaymentMethod, GasFeeOptions, LpFee,
	Messenger, QuoteOption, QuotePayment, Token,
};
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;

/// Per-request inputs shared by every collaborator call.
struct QuoteContext<'a> {
	amount_int: &'a str,
	amount_float: BigDecimal,
	source: &'a Token,
	destination: &'a Token,
}

/// Route-level data fetched once per messenger.
struct Route {
	messenger: Messenger,
	estimated_time_ms: Option<u64>,
	gas_fee_options: Arc<GasFeeOptions>,
}

/// One payment entry to compute: a priced method on one route.
struct PaymentJob {
	route_index: usize,
	messenger: Messenger,
	method: FeePaymentMethod,
	fee: AmountFormatted,
	gas_fee_options: Arc<GasFeeOptions>,
}

/// Builds [`BridgeQuote`]s from protocol data.
pub struct QuoteBuilder {
	protocol: Arc<ProtocolService>,
	estimator: AmountEstimator,
	max_concurrency: usize,
}

impl QuoteBuilder {
	pub fn new(protocol: Arc<ProtocolService>, max_concurrency: usize) -> Self {
		Self {
			estimator: AmountEstimator::new(Arc::clone(&protocol)),
			protocol,
			max_concurrency: max_concurrency.max(1),
		}
	}

	/// Builds a quote for sending `amount_int` source units.
	///
	/// Options follow messenger order and payment entries follow
	/// [`FeePaymentMethod::ALL`]; a method the protocol does not price for a
	/// messenger is left out. Gas fee data is essential and its failure fails
	/// the quote. Transfer time, pending info and receive estimates degrade
	/// to absent values.
	pub async fn build_quote(
		&self,
		amount_int: &str,
		source: &Token,
		destination: &Token,
	) -> Result<BridgeQuote, QuoteError> {
		let ctx = QuoteContext {
			amount_int,
			amount_float: amount::to_float_gt0(amount_int, source.decimals)?,
			source,
			destination,
		};
		let ctx = &ctx;

		let detected = messengers::detect(source, destination);
		tracing::debug!(messengers = ?detected, "Detected messengers");

		let routes: Vec<Route> = stream::iter(detected)
			.map(|messenger| self.route(ctx, messenger))
			.buffered(self.max_concurrency)
			.try_collect()
			.await?;

		let mut jobs = Vec::new();
		for (route_index, route) in routes.iter().enumerate() {
			for method in FeePaymentMethod::ALL {
				if let Some(fee) = route.gas_fee_options.fee_for(method) {
					jobs.push(PaymentJob {
						route_index,
						messenger: route.messenger,
						method,
						fee: fee.clone(),
						gas_fee_options: Arc::clone(&route.gas_fee_options),
					});
				}
			}
		}

		let payments: Vec<(usize, QuotePayment)> = stream::iter(jobs)
			.map(|job| self.payment(ctx, job))
			.buffered(self.max_concurrency)
			.try_collect()
			.await?;

		let mut options: Vec<QuoteOption> = routes
			.iter()
			.map(|route| QuoteOption {
				messenger: route.messenger,
				messenger_index: route.messenger.index(),
				estimated_time_ms: route.estimated_time_ms,
				source_tx_cost_in_native: "0".to_string(),
				payment_methods: Vec::new(),
			})
			.collect();
		for (index, payment) in payments {
			if let Some(option) = options.get_mut(index) {
				option.payment_methods.push(payment);
			}
		}

		Ok(BridgeQuote {
			amount_int: amount_int.to_string(),
			amount_float: amount::format_plain(&ctx.amount_float),
			source_token_address: source.token_address.clone(),
			destination_token_address: destination.token_address.clone(),
			options,
		})
	}

	async fn route(&self, ctx: &QuoteContext<'_>, messenger: Messenger) -> Result<Route, QuoteError> {
		let (time, fees) = tokio::join!(
			self.protocol
				.average_transfer_time(ctx.source, ctx.destination, messenger),
			self.protocol
				.gas_fee_options(ctx.source, ctx.destination, messenger),
		);

		let estimated_time_ms = time.unwrap_or_else(|e| {
			tracing::warn!(messenger = %messenger, error = %e, "Transfer time unavailable");
			None
		});
		let gas_fee_options = fees.map_err(|e| {
			QuoteError::UpstreamFailure(format!("gas fee options for {}: {}", messenger, e))
		})?;

		Ok(Route {
			messenger,
			estimated_time_ms,
			gas_fee_options: Arc::new(gas_fee_options),
		})
	}

	async fn payment(
		&self,
		ctx: &QuoteContext<'_>,
		job: PaymentJob,
	) -> Result<(usize, QuotePayment), QuoteError> {
		let PaymentJob {
			route_index,
			messenger,
			method,
			fee,
			gas_fee_options,
		} = job;
		let stable_fee = match method {
			FeePaymentMethod::WithNativeCurrency => None,
			FeePaymentMethod::WithStablecoin => {
				Some(amount::to_float(&fee.int, ctx.source.decimals).map_err(|e| {
					QuoteError::UpstreamFailure(format!("relayer fee for {}: {}", messenger, e))
				})?)
			},
		};

		let (pending, received, lp) = tokio::join!(
			self.protocol
				.pending_status_info(ctx.amount_int, ctx.source, ctx.destination),
			self.estimator.receive(
				&ctx.amount_float,
				ctx.source,
				ctx.destination,
				messenger,
				stable_fee.as_ref(),
			),
			self.lp_fees(ctx, messenger),
		);

		let (pending_txs, pending_amount) = match pending {
			Ok(info) => (Some(info.pending_txs), Some(info.pending_amount.int)),
			Err(e) => {
				tracing::warn!(messenger = %messenger, error = %e, "Pending info unavailable");
				(None, None)
			},
		};

		let estimated_amount = received.amount_received_in_float.map(|float| {
			let int = amount::to_atomic(&float, ctx.destination.decimals, Rounding::Down);
			EstimatedAmount {
				min: int.clone(),
				max: int,
			}
		});

		let (lp_fee, lp_fee_total) = lp?;
		let transfer_fee = transfer_fee(
			messenger,
			ctx.amount_int,
			ctx.source,
			ctx.destination,
			&gas_fee_options,
		)?;

		let (relayer_fee_in_stable, relayer_fee_in_native) = match method {
			FeePaymentMethod::WithNativeCurrency => ("0".to_string(), fee.int.clone()),
			FeePaymentMethod::WithStablecoin => (fee.int.clone(), "0".to_string()),
		};

		let payment = QuotePayment {
			fee_payment_method: method,
			fee: fee.int,
			pending_txs,
			pending_amount,
			estimated_amount,
			relayer_fee_in_stable,
			relayer_fee_in_native,
			lp_fee,
			lp_fee_total,
			transfer_fee,
		};
		Ok((route_index, payment))
	}

	/// Pool breakdown in atomic units and the negated total liquidity fee.
	/// Only pool-based messengers pay these.
	async fn lp_fees(
		&self,
		ctx: &QuoteContext<'_>,
		messenger: Messenger,
	) -> Result<(LpFee, String), QuoteError> {
		if !messenger.uses_liquidity_pools() {
			return Ok((LpFee::zero(), "0".to_string()));
		}

		let details = self
			.protocol
			.send_amount_details(ctx.amount_int, ctx.source, ctx.destination)
			.await
			.map_err(|e| QuoteError::UpstreamFailure(format!("pool details for {}: {}", messenger, e)))?;

		let (src, dst) = (ctx.source.decimals, ctx.destination.decimals);
		let lp_fee = LpFee {
			source_liquidity_fee: amount::to_atomic(&details.source_liquidity_fee, src, Rounding::Down),
			source_swap: amount::to_atomic(&details.source_swap, src, Rounding::Down),
			destination_liquidity_fee: amount::to_atomic(
				&details.destination_liquidity_fee,
				dst,
				Rounding::Down,
			),
			destination_swap: amount::to_atomic(&details.destination_swap, dst, Rounding::Down),
		};

		let total = &details.source_liquidity_fee + &details.destination_liquidity_fee;
		let lp_fee_total = amount::to_atomic(&-total, dst, Rounding::Down);

		Ok((lp_fee, lp_fee_total))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixtures::{protocol_service, token, TokenExt};
	use bridge_protocol::{MockProtocolInterface, ProtocolError};
	use bridge_types::{Estimate, PendingStatusInfo, SwapCalcInfo};

	fn dec(s: &str) -> BigDecimal {
		amount::parse_decimal(s).unwrap()
	}

	fn assert_fees_non_negative(quote: &BridgeQuote) {
		for option in &quote.options {
			for payment in &option.payment_methods {
				for fee in [
					&payment.fee,
					&payment.relayer_fee_in_stable,
					&payment.relayer_fee_in_native,
					&payment.transfer_fee,
				] {
					let value = amount::parse_atomic(fee).unwrap();
					assert!(
						!fee.starts_with('-') && value >= 0.into(),
						"{} pays negative fee {}",
						option.messenger,
						fee
					);
				}
			}
		}
	}

	fn formatted(int: &str, float: &str) -> AmountFormatted {
		AmountFormatted {
			int: int.to_string(),
			float: float.to_string(),
		}
	}

	fn both_methods() -> GasFeeOptions {
		GasFeeOptions {
			native: Some(formatted("250000000000000", "0.00025")),
			stablecoin: Some(formatted("20000", "0.02")),
			admin_fee_share_with_extras: None,
		}
	}

	fn healthy_protocol() -> MockProtocolInterface {
		let mut mock = MockProtocolInterface::new();
		mock.expect_average_transfer_time()
			.returning(|_, _, _| Ok(Some(60_000)));
		mock.expect_gas_fee_options()
			.returning(|_, _, _| Ok(both_methods()));
		mock.expect_pending_status_info().returning(|_, _, _| {
			Ok(PendingStatusInfo {
				pending_txs: 2,
				pending_amount: formatted("5000000", "5"),
			})
		});
		mock.expect_amount_to_be_received()
			.returning(|amount, _, _, _| Ok(amount - dec("0.1")));
		mock.expect_send_amount_details().returning(|_, _, _| {
			Ok(SwapCalcInfo {
				source_liquidity_fee: dec("0.1"),
				source_swap: dec("99.9"),
				destination_liquidity_fee: dec("0.0999"),
				destination_swap: dec("99.8001"),
			})
		});
		mock
	}

	#[tokio::test]
	async fn test_allbridge_quote_with_both_methods() {
		let builder = QuoteBuilder::new(protocol_service(healthy_protocol()), 4);
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 6));

		let quote = builder.build_quote("100000000", &src, &dst).await.unwrap();
		assert_eq!(quote.amount_float, "100");
		assert_eq!(quote.options.len(), 1);

		let option = &quote.options[0];
		assert_eq!(option.messenger, Messenger::Allbridge);
		assert_eq!(option.messenger_index, 1);
		assert_eq!(option.estimated_time_ms, Some(60_000));
		assert_eq!(option.source_tx_cost_in_native, "0");

		let methods: Vec<FeePaymentMethod> = option
			.payment_methods
			.iter()
			.map(|p| p.fee_payment_method)
			.collect();
		assert_eq!(methods, FeePaymentMethod::ALL.to_vec());

		let native = &option.payment_methods[0];
		assert_eq!(native.relayer_fee_in_native, "250000000000000");
		assert_eq!(native.relayer_fee_in_stable, "0");
		assert_eq!(native.pending_txs, Some(2));
		assert_eq!(native.pending_amount.as_deref(), Some("5000000"));
		// 100 - 0.1
		assert_eq!(
			native.estimated_amount.as_option().map(|e| e.min.as_str()),
			Some("99900000")
		);
		assert_eq!(native.lp_fee.source_liquidity_fee, "100000");
		assert_eq!(native.lp_fee.destination_swap, "99800100");
		assert_eq!(native.lp_fee_total, "-199900");
		assert_eq!(native.transfer_fee, "0");

		let stable = &option.payment_methods[1];
		assert_eq!(stable.relayer_fee_in_stable, "20000");
		assert_eq!(stable.relayer_fee_in_native, "0");
		// 100 - 0.02 - 0.1
		let estimate = stable.estimated_amount.as_option().unwrap();
		assert_eq!(estimate.min, "99880000");
		assert_eq!(estimate.min, estimate.max);
	}

	#[tokio::test]
	async fn test_missing_method_is_skipped() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_average_transfer_time().returning(|_, _, _| Ok(None));
		mock.expect_gas_fee_options().returning(|_, _, _| {
			Ok(GasFeeOptions {
				native: None,
				..both_methods()
			})
		});
		mock.expect_pending_status_info()
			.returning(|_, _, _| Err(ProtocolError::Network("down".into())));
		mock.expect_amount_to_be_received()
			.returning(|_, _, _, _| Err(ProtocolError::Network("down".into())));
		// only the Allbridge route asks for pool details
		mock.expect_send_amount_details()
			.times(1)
			.returning(|_, _, _| Ok(SwapCalcInfo::default()));

		let builder = QuoteBuilder::new(protocol_service(mock), 4);
		let src = token("0xsrc", 6).with_cctp("0xc1", Some("0.001"));
		let dst = token("0xdst", 6).with_cctp("0xc2", None);

		let quote = builder.build_quote("1000000", &src, &dst).await.unwrap();
		let messengers: Vec<Messenger> = quote.options.iter().map(|o| o.messenger).collect();
		assert_eq!(messengers, vec![Messenger::Allbridge, Messenger::Cctp]);

		let cctp = &quote.options[1];
		assert_eq!(cctp.payment_methods.len(), 1);
		let payment = &cctp.payment_methods[0];
		assert_eq!(payment.fee_payment_method, FeePaymentMethod::WithStablecoin);
		assert_eq!(payment.pending_txs, None);
		assert_eq!(payment.estimated_amount, Estimate::Unavailable);
		assert_eq!(payment.lp_fee, LpFee::zero());
		assert_eq!(payment.lp_fee_total, "0");
		assert_eq!(payment.transfer_fee, "1000");
		assert_eq!(cctp.estimated_time_ms, None);
	}

	#[tokio::test]
	async fn test_gas_fee_failure_fails_quote() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_average_transfer_time().returning(|_, _, _| Ok(None));
		mock.expect_gas_fee_options()
			.returning(|_, _, _| Err(ProtocolError::Upstream { status: 502, message: "bad gateway".into() }));

		let builder = QuoteBuilder::new(protocol_service(mock), 4);
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 6));

		let err = builder.build_quote("1000000", &src, &dst).await.unwrap_err();
		assert!(matches!(err, QuoteError::UpstreamFailure(_)));
	}

	#[tokio::test]
	async fn test_transfer_time_failure_degrades() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_average_transfer_time()
			.returning(|_, _, _| Err(ProtocolError::Network("timeout".into())));
		mock.expect_gas_fee_options()
			.returning(|_, _, _| Ok(GasFeeOptions::default()));

		let builder = QuoteBuilder::new(protocol_service(mock), 1);
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 6));

		let quote = builder.build_quote("1000000", &src, &dst).await.unwrap();
		assert_eq!(quote.options[0].estimated_time_ms, None);
		assert!(quote.options[0].payment_methods.is_empty());
	}

	#[tokio::test]
	async fn test_stable_fee_above_amount_leaves_estimate_unavailable() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_average_transfer_time().returning(|_, _, _| Ok(None));
		mock.expect_gas_fee_options().returning(|_, _, _| {
			Ok(GasFeeOptions {
				native: None,
				stablecoin: Some(formatted("2000000", "2")),
				admin_fee_share_with_extras: None,
			})
		});
		mock.expect_pending_status_info().returning(|_, _, _| {
			Ok(PendingStatusInfo {
				pending_txs: 0,
				pending_amount: formatted("0", "0"),
			})
		});
		mock.expect_amount_to_be_received().never();
		mock.expect_send_amount_details()
			.returning(|_, _, _| Ok(SwapCalcInfo::default()));

		let builder = QuoteBuilder::new(protocol_service(mock), 4);
		let (src, dst) = (token("0xsrc", 6), token("0xdst", 6));

		let quote = builder.build_quote("1000000", &src, &dst).await.unwrap();
		let payment = &quote.options[0].payment_methods[0];
		assert_eq!(payment.estimated_amount, Estimate::Unavailable);
		assert_eq!(payment.lp_fee_total, "0");
	}

	#[tokio::test]
	async fn test_wormhole_route_pays_pool_fees() {
		let builder = QuoteBuilder::new(protocol_service(healthy_protocol()), 4);
		let src = token("0xsrc", 6).with_wormhole("0xw1");
		let dst = token("0xdst", 6).with_wormhole("0xw2");

		let quote = builder.build_quote("100000000", &src, &dst).await.unwrap();
		let messengers: Vec<Messenger> = quote.options.iter().map(|o| o.messenger).collect();
		assert_eq!(messengers, vec![Messenger::Allbridge, Messenger::Wormhole]);

		let wormhole = &quote.options[1];
		assert_eq!(wormhole.messenger_index, 2);
		for payment in &wormhole.payment_methods {
			assert_eq!(payment.lp_fee.source_liquidity_fee, "100000");
			assert_eq!(payment.lp_fee.source_swap, "99900000");
			assert_eq!(payment.lp_fee.destination_liquidity_fee, "99900");
			assert_eq!(payment.lp_fee_total, "-199900");
			assert_eq!(payment.transfer_fee, "0");
		}
		assert_eq!(wormhole.payment_methods.len(), 2);
		assert_fees_non_negative(&quote);
	}

	#[tokio::test]
	async fn test_oft_route_takes_admin_fee_from_its_gas_options() {
		let mut mock = MockProtocolInterface::new();
		mock.expect_average_transfer_time().returning(|_, _, _| Ok(None));
		mock.expect_gas_fee_options().returning(|_, _, messenger| {
			Ok(GasFeeOptions {
				admin_fee_share_with_extras: (messenger == Messenger::Oft).then(|| BigDecimal::from(150)),
				..both_methods()
			})
		});
		mock.expect_pending_status_info()
			.returning(|_, _, _| Err(ProtocolError::Network("down".into())));
		mock.expect_amount_to_be_received()
			.returning(|amount, _, _, _| Ok(amount));
		// Allbridge only, once per payment method
		mock.expect_send_amount_details()
			.times(2)
			.returning(|_, _, _| Ok(SwapCalcInfo::default()));

		let builder = QuoteBuilder::new(protocol_service(mock), 2);
		let src = token("0xsrc", 6).with_oft("usdc", "0xo1");
		let dst = token("0xdst", 6).with_oft("usdc", "0xo2");

		let quote = builder.build_quote("2000000", &src, &dst).await.unwrap();
		let messengers: Vec<Messenger> = quote.options.iter().map(|o| o.messenger).collect();
		assert_eq!(messengers, vec![Messenger::Allbridge, Messenger::Oft]);

		for payment in &quote.options[0].payment_methods {
			assert_eq!(payment.transfer_fee, "0");
		}
		let oft = &quote.options[1];
		assert_eq!(oft.payment_methods.len(), 2);
		for payment in &oft.payment_methods {
			// ceil(2000000 * 150 / 10^6)
			assert_eq!(payment.transfer_fee, "300");
			assert_eq!(payment.lp_fee, LpFee::zero());
			assert_eq!(payment.lp_fee_total, "0");
		}
		assert_fees_non_negative(&quote);
	}

	#[tokio::test]
	async fn test_every_route_quotes_non_negative_fees() {
		let builder = QuoteBuilder::new(protocol_service(healthy_protocol()), 3);
		let src = token("0xsrc", 6)
			.with_wormhole("0xw1")
			.with_cctp("0xc1", Some("0.001"))
			.with_cctp_v2("0xv1", Some("0.0005"))
			.with_oft("usdc", "0xo1");
		let dst = token("0xdst", 6)
			.with_wormhole("0xw2")
			.with_cctp("0xc2", None)
			.with_cctp_v2("0xv2", None)
			.with_oft("usdc", "0xo2");

		// no bridge address on the OFT side keeps the admin fee out of it
		let mut src = src;
		src.oft_bridge_address = None;

		let quote = builder.build_quote("1000000", &src, &dst).await.unwrap();
		assert_eq!(quote.options.len(), Messenger::ALL.len());
		assert_eq!(quote.options[2].payment_methods[0].transfer_fee, "1000");
		assert_eq!(quote.options[3].payment_methods[0].transfer_fee, "500");
		assert_eq!(quote.options[4].payment_methods[0].transfer_fee, "0");
		assert_fees_non_negative(&quote);
	}

	#[tokio::test]
	async fn test_large_amount_is_quoted_exactly() {
		let builder = QuoteBuilder::new(protocol_service(healthy_protocol()), 4);
		let (src, dst) = (token("0xsrc", 18), token("0xdst", 18));

		let quote = builder
			.build_quote("100000000000000000000000000000", &src, &dst)
			.await
			.unwrap();
		assert_eq!(quote.amount_float, "100000000000");
		let estimate = quote.options[0].payment_methods[0]
			.estimated_amount
			.as_option()
			.unwrap();
		// 10^11 - 0.1 tokens
		assert_eq!(estimate.min, "99999999999900000000000000000");
	}
}

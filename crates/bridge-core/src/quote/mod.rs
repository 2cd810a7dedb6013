//! Quote computation.
//!
//! Given an atomic amount and a resolved token pair, the builder detects the
//! eligible messengers, fetches fee data for each and assembles one payment
//! entry per offered fee-payment method. Collaborator calls run concurrently
//! with a per-request cap.

use bridge_types::{amount::AmountError, APIError, UnsupportedMessenger};
use thiserror::Error;

pub mod builder;
pub mod estimate;
pub mod messengers;
pub mod transfer_fee;

pub use builder::QuoteBuilder;
pub use estimate::AmountEstimator;

/// Errors that can occur while answering a quote or amount request.
#[derive(Debug, Error)]
pub enum QuoteError {
	#[error("Token not found: {0}")]
	TokenNotFound(String),
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
	#[error(transparent)]
	UnsupportedMessenger(#[from] UnsupportedMessenger),
	/// An essential collaborator call failed.
	#[error("Upstream failure: {0}")]
	UpstreamFailure(String),
}

impl From<AmountError> for QuoteError {
	fn from(err: AmountError) -> Self {
		match err {
			AmountError::InvalidAmount(raw) => QuoteError::InvalidAmount(raw),
		}
	}
}

impl From<QuoteError> for APIError {
	fn from(err: QuoteError) -> Self {
		let message = err.to_string();
		match err {
			QuoteError::TokenNotFound(_) => APIError::bad_request("TOKEN_NOT_FOUND", message),
			QuoteError::InvalidAmount(_) => APIError::bad_request("INVALID_AMOUNT", message),
			QuoteError::UnsupportedMessenger(_) => {
				APIError::bad_request("UNSUPPORTED_MESSENGER", message)
			},
			QuoteError::UpstreamFailure(_) => APIError::unavailable("UPSTREAM_FAILURE", message),
		}
	}
}

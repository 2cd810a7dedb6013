//! API types for the bridge gateway HTTP endpoints.
//!
//! Query parameter structs for each GET endpoint and the structured error
//! envelope returned on failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Query for `GET /bridge/quote`, `GET /pending/info` and
/// `GET /bridge/details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
	/// Atomic amount in source-token units.
	pub amount: String,
	pub source_token: String,
	pub destination_token: String,
}

/// Query for `GET /bridge/receive/calculate` and `GET /bridge/send/calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountCalculationRequest {
	/// Atomic amount: source units of the sent amount for receive,
	/// destination units of the wanted amount for send.
	pub amount: String,
	pub source_token: String,
	pub destination_token: String,
	pub messenger: String,
	/// Relayer fee paid in stablecoin, in source atomic units.
	#[serde(default)]
	pub relayer_fee_in_stables: Option<String>,
}

/// Query for `GET /gas/fee` and `GET /transfer/time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
	pub source_token: String,
	pub destination_token: String,
	pub messenger: String,
}

/// Query for `GET /utils/solana/replace-fee-payer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceFeePayerRequest {
	/// Base58 address of the account that will pay network fees.
	pub sponsor: String,
	/// Hex-encoded serialized transaction, with or without a 0x prefix.
	pub tx: String,
	/// Lamports to move from the sponsor to the original fee payer.
	#[serde(default)]
	pub fund_lamports: Option<u64>,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	pub details: Option<serde_json::Value>,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter")]
	pub retry_after: Option<u64>,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Rejected input (400).
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// A collaborator failed (503).
	ServiceUnavailable {
		error_type: String,
		message: String,
		retry_after: Option<u64>,
	},
	/// Internal server error (500).
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	pub fn bad_request(error_type: impl Into<String>, message: impl Into<String>) -> Self {
		APIError::BadRequest {
			error_type: error_type.into(),
			message: message.into(),
			details: None,
		}
	}

	pub fn unavailable(error_type: impl Into<String>, message: impl Into<String>) -> Self {
		APIError::ServiceUnavailable {
			error_type: error_type.into(),
			message: message.into(),
			retry_after: None,
		}
	}

	pub fn internal(error_type: impl Into<String>, message: impl Into<String>) -> Self {
		APIError::InternalServerError {
			error_type: error_type.into(),
			message: message.into(),
		}
	}

	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error, message, details, retry_after) = match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			} => (error_type, message, details.clone(), None),
			APIError::ServiceUnavailable {
				error_type,
				message,
				retry_after,
			} => (error_type, message, None, *retry_after),
			APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message, None, None),
		};
		ErrorResponse {
			error: error.clone(),
			message: message.clone(),
			details,
			retry_after,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::ServiceUnavailable { message, .. } => {
				write!(f, "Service Unavailable: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}

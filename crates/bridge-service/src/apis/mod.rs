//! Request handlers for the gateway endpoints.

pub mod calculate;
pub mod protocol;
pub mod quote;
pub mod sponsor;
pub mod tokens;

use axum::extract::rejection::QueryRejection;
use bridge_types::APIError;

/// Maps a query string that fails to deserialize to the error envelope.
pub(crate) fn invalid_query(rejection: QueryRejection) -> APIError {
	APIError::bad_request("INVALID_REQUEST", rejection.body_text())
}

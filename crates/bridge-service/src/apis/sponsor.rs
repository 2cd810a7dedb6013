//! Solana fee-payer replacement endpoint.

use crate::{apis::invalid_query, server::AppState};
use axum::extract::{rejection::QueryRejection, Query, State};
use bridge_types::{APIError, ReplaceFeePayerRequest};

/// Handles GET /utils/solana/replace-fee-payer requests.
///
/// Responds with the rewritten transaction as a bare hex string.
pub async fn replace_fee_payer(
	State(state): State<AppState>,
	query: Result<Query<ReplaceFeePayerRequest>, QueryRejection>,
) -> Result<String, APIError> {
	let Query(request) = query.map_err(invalid_query)?;

	state
		.engine
		.replace_fee_payer(&request.sponsor, &request.tx, request.fund_lamports)
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Fee payer replacement failed");
			APIError::from(e)
		})
}

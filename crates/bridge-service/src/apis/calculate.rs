//! Receive and send amount estimation endpoints.
//!
//! Both take atomic amounts and answer in whole-token units; an estimate
//! that cannot be computed is returned as `null`.

use crate::{apis::invalid_query, server::AppState};
use axum::{
	extract::{rejection::QueryRejection, Query, State},
	Json,
};
use bridge_types::{APIError, AmountCalculationRequest, BridgeAmounts};

/// Handles GET /bridge/receive/calculate requests.
pub async fn receive(
	State(state): State<AppState>,
	query: Result<Query<AmountCalculationRequest>, QueryRejection>,
) -> Result<Json<BridgeAmounts>, APIError> {
	let Query(request) = query.map_err(invalid_query)?;

	state
		.engine
		.receive_amount(
			&request.amount,
			&request.source_token,
			&request.destination_token,
			&request.messenger,
			request.relayer_fee_in_stables.as_deref(),
		)
		.await
		.map(Json)
		.map_err(|e| {
			tracing::warn!(error = %e, "Receive calculation failed");
			APIError::from(e)
		})
}

/// Handles GET /bridge/send/calculate requests.
pub async fn send(
	State(state): State<AppState>,
	query: Result<Query<AmountCalculationRequest>, QueryRejection>,
) -> Result<Json<BridgeAmounts>, APIError> {
	let Query(request) = query.map_err(invalid_query)?;

	state
		.engine
		.send_amount(
			&request.amount,
			&request.source_token,
			&request.destination_token,
			&request.messenger,
			request.relayer_fee_in_stables.as_deref(),
		)
		.await
		.map(Json)
		.map_err(|e| {
			tracing::warn!(error = %e, "Send calculation failed");
			APIError::from(e)
		})
}

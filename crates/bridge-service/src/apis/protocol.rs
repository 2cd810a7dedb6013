//! Read-only views of protocol data: chains, relayer gas fees, transfer
//! time, pending transfers and pool details.

use crate::{apis::invalid_query, server::AppState};
use axum::{
	extract::{rejection::QueryRejection, Query, State},
	Json,
};
use bridge_types::{
	APIError, ChainDetails, GasFeeOptions, PendingStatusInfo, QuoteRequest, RouteRequest,
	SwapCalcInfo,
};
use std::collections::BTreeMap;

/// Handles GET /chains requests.
pub async fn get_chains(
	State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, ChainDetails>>, APIError> {
	state.engine.chains().await.map(Json).map_err(|e| {
		tracing::warn!(error = %e, "Chain list request failed");
		APIError::from(e)
	})
}

/// Handles GET /gas/fee requests.
pub async fn get_gas_fee(
	State(state): State<AppState>,
	query: Result<Query<RouteRequest>, QueryRejection>,
) -> Result<Json<GasFeeOptions>, APIError> {
	let Query(request) = query.map_err(invalid_query)?;

	state
		.engine
		.gas_fee_options(&request.source_token, &request.destination_token, &request.messenger)
		.await
		.map(Json)
		.map_err(|e| {
			tracing::warn!(error = %e, "Gas fee request failed");
			APIError::from(e)
		})
}

/// Handles GET /transfer/time requests.
///
/// Answers `null` when the protocol has no estimate for the route.
pub async fn get_transfer_time(
	State(state): State<AppState>,
	query: Result<Query<RouteRequest>, QueryRejection>,
) -> Result<Json<Option<u64>>, APIError> {
	let Query(request) = query.map_err(invalid_query)?;

	state
		.engine
		.transfer_time(&request.source_token, &request.destination_token, &request.messenger)
		.await
		.map(Json)
		.map_err(|e| {
			tracing::warn!(error = %e, "Transfer time request failed");
			APIError::from(e)
		})
}

/// Handles GET /pending/info requests.
pub async fn get_pending_info(
	State(state): State<AppState>,
	query: Result<Query<QuoteRequest>, QueryRejection>,
) -> Result<Json<PendingStatusInfo>, APIError> {
	let Query(request) = query.map_err(invalid_query)?;

	state
		.engine
		.pending_info(&request.amount, &request.source_token, &request.destination_token)
		.await
		.map(Json)
		.map_err(|e| {
			tracing::warn!(error = %e, "Pending info request failed");
			APIError::from(e)
		})
}

/// Handles GET /bridge/details requests.
pub async fn get_bridge_details(
	State(state): State<AppState>,
	query: Result<Query<QuoteRequest>, QueryRejection>,
) -> Result<Json<SwapCalcInfo>, APIError> {
	let Query(request) = query.map_err(invalid_query)?;

	state
		.engine
		.bridge_details(&request.amount, &request.source_token, &request.destination_token)
		.await
		.map(Json)
		.map_err(|e| {
			tracing::warn!(error = %e, "Bridge details request failed");
			APIError::from(e)
		})
}

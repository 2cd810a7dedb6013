//! Quote endpoint.

use crate::{apis::invalid_query, server::AppState};
use axum::{
	extract::{rejection::QueryRejection, Query, State},
	Json,
};
use bridge_types::{APIError, BridgeQuote, QuoteRequest};

/// Handles GET /bridge/quote requests.
pub async fn get_quote(
	State(state): State<AppState>,
	query: Result<Query<QuoteRequest>, QueryRejection>,
) -> Result<Json<BridgeQuote>, APIError> {
	let Query(request) = query.map_err(invalid_query)?;

	match state
		.engine
		.quote(&request.amount, &request.source_token, &request.destination_token)
		.await
	{
		Ok(quote) => Ok(Json(quote)),
		Err(e) => {
			tracing::warn!(error = %e, "Quote request failed");
			Err(APIError::from(e))
		},
	}
}

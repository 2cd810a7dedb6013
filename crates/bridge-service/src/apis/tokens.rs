//! Token list endpoint.

use crate::server::AppState;
use axum::{extract::State, Json};
use bridge_types::{APIError, Token};

/// Handles GET /tokens requests.
///
/// Returns the protocol's token list as currently cached.
pub async fn get_tokens(State(state): State<AppState>) -> Result<Json<Vec<Token>>, APIError> {
	match state.engine.tokens().await {
		Ok(tokens) => Ok(Json(tokens.as_ref().clone())),
		Err(e) => {
			tracing::warn!(error = %e, "Token list request failed");
			Err(APIError::from(e))
		},
	}
}

//! HTTP server for the bridge gateway API.

use crate::apis;
use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing::get, Json, Router};
use bridge_config::ApiConfig;
use bridge_core::BridgeEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{Any, CorsLayer},
	timeout::TimeoutLayer,
};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<BridgeEngine>,
}

/// Builds the router with every gateway endpoint.
pub fn router(api_config: &ApiConfig, engine: Arc<BridgeEngine>) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/tokens", get(apis::tokens::get_tokens))
		.route("/chains", get(apis::protocol::get_chains))
		.route("/gas/fee", get(apis::protocol::get_gas_fee))
		.route("/transfer/time", get(apis::protocol::get_transfer_time))
		.route("/pending/info", get(apis::protocol::get_pending_info))
		.route("/bridge/details", get(apis::protocol::get_bridge_details))
		.route("/bridge/quote", get(apis::quote::get_quote))
		.route("/bridge/receive/calculate", get(apis::calculate::receive))
		.route("/bridge/send/calculate", get(apis::calculate::send))
		.route(
			"/utils/solana/replace-fee-payer",
			get(apis::sponsor::replace_fee_payer),
		)
		.layer(
			ServiceBuilder::new()
				.layer(cors_layer(api_config))
				.layer(DefaultBodyLimit::max(api_config.max_request_size))
				.layer(TimeoutLayer::new(Duration::from_secs(api_config.timeout_seconds))),
		)
		.with_state(AppState { engine })
}

fn cors_layer(api_config: &ApiConfig) -> CorsLayer {
	let Some(cors) = &api_config.cors else {
		return CorsLayer::permissive();
	};

	let origins: Vec<HeaderValue> = cors
		.allowed_origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(e) => {
				tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
				None
			},
		})
		.collect();
	CorsLayer::new()
		.allow_origin(origins)
		.allow_methods(Any)
		.allow_headers(Any)
}

/// Serves the API until the process receives Ctrl-C.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<BridgeEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(&api_config, engine);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;
	tracing::info!("Bridge API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "Failed to listen for shutdown signal");
			}
		})
		.await?;

	Ok(())
}

async fn health() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

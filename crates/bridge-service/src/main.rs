//! Entry point for the bridge quote gateway.
//!
//! Loads the configuration, wires the configured protocol and ledger
//! implementations into a [`BridgeEngine`] and serves the HTTP API until
//! interrupted.

use bridge_config::Config;
use bridge_core::BridgeEngine;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the gateway.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started bridge gateway");

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine: Arc<BridgeEngine> =
		Arc::new(factory_registry::build_engine_from_config(config.clone())?);

	match config.api {
		Some(api) if api.enabled => server::start_server(api, engine).await?,
		_ => tracing::warn!("API server disabled in configuration, nothing to serve"),
	}

	tracing::info!("Stopped bridge gateway");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_args_defaults() {
		let args = Args::parse_from(["bridge-api"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["bridge-api", "-c", "demo.toml", "--log-level", "debug"]);
		assert_eq!(args.config, PathBuf::from("demo.toml"));
		assert_eq!(args.log_level, "debug");
	}
}

//! Protocol implementation backed by an upstream bridge HTTP API.
//!
//! Every operation is a single GET against the upstream with tokens
//! identified by their token address. Amounts sent upstream are atomic
//! integers; whole-token arguments are converted with the relevant token's
//! decimals first.

use crate::{ProtocolError, ProtocolInterface};
use async_trait::async_trait;
use bridge_types::{
	amount::{self, Rounding},
	ConfigSchema, Field, FieldType, GasFeeOptions, ImplementationRegistry, Messenger,
	PendingStatusInfo, Schema, SecretString, SwapCalcInfo, Token, ValidationError,
};
use bigdecimal::BigDecimal;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-api-key";

/// Calculation result as returned upstream. Unavailable amounts come back
/// as an empty string or null.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBridgeAmounts {
	#[serde(default)]
	amount_in_float: Option<String>,
	#[serde(default)]
	amount_received_in_float: Option<String>,
}

fn estimate_field(raw: Option<String>, what: &str) -> Result<BigDecimal, ProtocolError> {
	match raw.as_deref().map(str::trim) {
		None | Some("") => Err(ProtocolError::Unsupported(format!(
			"upstream returned no {}",
			what
		))),
		Some(value) => amount::parse_decimal(value)
			.map_err(|e| ProtocolError::Decode(format!("{}: {}", what, e))),
	}
}

/// Configuration schema for the REST protocol.
pub struct RestProtocolSchema;

impl RestProtocolSchema {
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for RestProtocolSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("api_url", FieldType::Url)],
			vec![
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
				Field::new("api_key", FieldType::String),
				Field::new("headers", FieldType::Table(Schema::new(vec![], vec![]))).with_validator(
					|value| {
						let table = value.as_table().ok_or("headers must be a table")?;
						for (name, v) in table {
							if !v.is_str() {
								return Err(format!("header '{}' must be a string", name));
							}
						}
						Ok(())
					},
				),
			],
		);

		schema.validate(config)
	}
}

/// Protocol that forwards every call to an upstream bridge API.
pub struct RestProtocol {
	client: reqwest::Client,
	api_url: String,
}

impl RestProtocol {
	fn new(
		api_url: String,
		timeout: Duration,
		api_key: Option<SecretString>,
		extra_headers: Vec<(String, String)>,
	) -> Result<Self, ProtocolError> {
		let mut headers = HeaderMap::new();
		for (name, value) in extra_headers {
			let name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|e| ProtocolError::Configuration(format!("Invalid header '{}': {}", name, e)))?;
			let value = HeaderValue::from_str(&value).map_err(|e| {
				ProtocolError::Configuration(format!("Invalid value for header '{}': {}", name, e))
			})?;
			headers.insert(name, value);
		}
		if let Some(key) = api_key {
			let mut value = HeaderValue::from_str(key.expose_secret())
				.map_err(|_| ProtocolError::Configuration("Invalid api_key".into()))?;
			value.set_sensitive(true);
			headers.insert(API_KEY_HEADER, value);
		}

		let client = reqwest::Client::builder()
			.timeout(timeout)
			.default_headers(headers)
			.build()
			.map_err(|e| ProtocolError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			api_url: api_url.trim_end_matches('/').to_string(),
		})
	}

	async fn get<T: DeserializeOwned>(
		&self,
		path: &str,
		query: &[(&str, &str)],
	) -> Result<T, ProtocolError> {
		let url = format!("{}{}", self.api_url, path);
		let response = self
			.client
			.get(&url)
			.query(query)
			.send()
			.await
			.map_err(|e| ProtocolError::Network(format!("GET {} failed: {}", path, e)))?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(ProtocolError::Upstream {
				status: status.as_u16(),
				message,
			});
		}

		response
			.json::<T>()
			.await
			.map_err(|e| ProtocolError::Decode(format!("GET {}: {}", path, e)))
	}
}

#[async_trait]
impl ProtocolInterface for RestProtocol {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(RestProtocolSchema)
	}

	async fn tokens(&self) -> Result<Vec<Token>, ProtocolError> {
		self.get("/tokens", &[]).await
	}

	async fn gas_fee_options(
		&self,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<GasFeeOptions, ProtocolError> {
		self.get(
			"/gas/fee",
			&[
				("sourceToken", source.token_address.as_str()),
				("destinationToken", destination.token_address.as_str()),
				("messenger", messenger.as_str()),
			],
		)
		.await
	}

	async fn send_amount_details(
		&self,
		amount_int: &str,
		source: &Token,
		destination: &Token,
	) -> Result<SwapCalcInfo, ProtocolError> {
		self.get(
			"/bridge/details",
			&[
				("amount", amount_int),
				("sourceToken", source.token_address.as_str()),
				("destinationToken", destination.token_address.as_str()),
			],
		)
		.await
	}

	async fn pending_status_info(
		&self,
		amount_int: &str,
		source: &Token,
		destination: &Token,
	) -> Result<PendingStatusInfo, ProtocolError> {
		self.get(
			"/pending/info",
			&[
				("amount", amount_int),
				("sourceToken", source.token_address.as_str()),
				("destinationToken", destination.token_address.as_str()),
			],
		)
		.await
	}

	async fn average_transfer_time(
		&self,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<Option<u64>, ProtocolError> {
		self.get(
			"/transfer/time",
			&[
				("sourceToken", source.token_address.as_str()),
				("destinationToken", destination.token_address.as_str()),
				("messenger", messenger.as_str()),
			],
		)
		.await
	}

	async fn amount_to_be_received(
		&self,
		amount_float: BigDecimal,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<BigDecimal, ProtocolError> {
		let amount_int = amount::to_atomic(&amount_float, source.decimals, Rounding::Down);
		let raw: RawBridgeAmounts = self
			.get(
				"/bridge/receive/calculate",
				&[
					("amount", amount_int.as_str()),
					("sourceToken", source.token_address.as_str()),
					("destinationToken", destination.token_address.as_str()),
					("messenger", messenger.as_str()),
				],
			)
			.await?;
		estimate_field(raw.amount_received_in_float, "amountReceivedInFloat")
	}

	async fn amount_to_send(
		&self,
		amount_float: BigDecimal,
		source: &Token,
		destination: &Token,
		messenger: Messenger,
	) -> Result<BigDecimal, ProtocolError> {
		let amount_int = amount::to_atomic(&amount_float, destination.decimals, Rounding::Up);
		let raw: RawBridgeAmounts = self
			.get(
				"/bridge/send/calculate",
				&[
					("amount", amount_int.as_str()),
					("sourceToken", source.token_address.as_str()),
					("destinationToken", destination.token_address.as_str()),
					("messenger", messenger.as_str()),
				],
			)
			.await?;
		estimate_field(raw.amount_in_float, "amountInFloat")
	}
}

/// Registry for the REST protocol implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "rest";
	type Factory = crate::ProtocolFactory;

	fn factory() -> Self::Factory {
		create_protocol
	}
}

impl crate::ProtocolRegistry for Registry {}

/// Factory function to create a REST protocol from configuration.
///
/// Configuration parameters:
/// - `api_url`: base URL of the upstream bridge API (required)
/// - `timeout_seconds`: per-request timeout (default 30)
/// - `api_key`: sent as the `x-api-key` header when set
/// - `headers`: extra headers sent with every request
pub fn create_protocol(config: &toml::Value) -> Result<Box<dyn ProtocolInterface>, ProtocolError> {
	RestProtocolSchema::validate_config(config)
		.map_err(|e| ProtocolError::Configuration(format!("Invalid configuration: {}", e)))?;

	let api_url = config
		.get("api_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| ProtocolError::Configuration("api_url is required".into()))?
		.to_string();
	let timeout_seconds = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(30) as u64;
	let api_key = config
		.get("api_key")
		.and_then(|v| v.as_str())
		.filter(|k| !k.is_empty())
		.map(SecretString::from);
	let headers = config
		.get("headers")
		.and_then(|v| v.as_table())
		.map(|table| {
			table
				.iter()
				.filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
				.collect()
		})
		.unwrap_or_default();

	Ok(Box::new(RestProtocol::new(
		api_url,
		Duration::from_secs(timeout_seconds),
		api_key,
		headers,
	)?))
}

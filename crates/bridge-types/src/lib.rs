//! Common types for the bridge quote gateway.
//!
//! This crate holds the data model shared by every other crate in the
//! workspace: token descriptors as reported by the bridge protocol, the closed
//! set of messengers and fee-payment methods, the quote response structures,
//! and the HTTP error envelope. It also carries the decimal amount converter
//! used by both the quote engine and the HTTP layer.

/// API types for HTTP endpoints and error responses.
pub mod api;
/// Fee data reported by the bridge protocol.
pub mod fees;
/// Transport protocols able to carry a transfer.
pub mod messenger;
/// Quote response structures.
pub mod quote;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Redacting wrapper for API keys and other secrets.
pub mod secret_string;
/// Token descriptors.
pub mod token;
/// Amount conversion and string helpers.
pub mod utils;
/// Configuration validation types for implementation tables.
pub mod validation;

pub use api::*;
pub use fees::*;
pub use messenger::*;
pub use quote::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use token::*;
pub use utils::{
	amount::{self, AmountError, Rounding},
	truncate_id, without_0x_prefix,
};
pub use validation::*;

//! Utility functions shared across the workspace.
//!
//! `amount` holds the fixed-point converter used for every monetary field;
//! `formatting` holds small string helpers for hex payloads and log output.

pub mod amount;
pub mod formatting;

pub use formatting::{truncate_id, without_0x_prefix};

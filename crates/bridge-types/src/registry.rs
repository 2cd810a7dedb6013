//! Registry trait for self-registering implementations.
//!
//! Every pluggable collaborator (protocol clients, ledger readers) exposes a
//! `Registry` unit struct so the service can discover it by the name used in
//! the TOML configuration.

/// Base trait for implementation registries.
///
/// Each collaborator crate specialises this with its own factory type and
/// lists its registries in a `get_all_implementations` function.
pub trait ImplementationRegistry {
	/// The key used under `implementations` in the configuration, for example
	/// `rest` for `protocol.implementations.rest` or `rpc` for
	/// `ledger.implementations.rpc`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory that builds this implementation from its
	/// configuration table.
	fn factory() -> Self::Factory;
}

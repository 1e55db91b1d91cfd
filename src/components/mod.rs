//! Sidecar building blocks the feature repositories depend on.
//!
//! Repositories are written against these traits only; which transport
//! client implements them is decided once by the process entry point.

mod secrets;
mod state;

#[cfg(test)]
pub(crate) mod memory;

pub use secrets::SecretStore;
pub use state::{StateItem, StateStore};

/// Everything a transport client offers: state, secrets and a diagnostic name.
pub trait Api: StateStore + SecretStore {
    /// Human readable name of the transport, used in startup logs.
    fn name(&self) -> &'static str;
}

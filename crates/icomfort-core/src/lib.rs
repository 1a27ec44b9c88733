// icomfort-core: domain model, message pump, and controller for the
// iComfort cloud device-state client.

pub mod commands;
pub mod config;
pub mod contract;
pub mod controller;
pub mod error;
pub mod model;
pub mod pump;
pub mod store;

// Re-export the wire crate for consumers that need endpoint overrides
// or raw message types.
pub use icomfort_api as api;

pub use commands::SetpointChange;
pub use config::ClientConfig;
pub use contract::ComfortClient;
pub use controller::CloudController;
pub use error::ClientError;
pub use model::{System, Zone, ZoneKey};
pub use pump::{PumpErrorHandler, PumpState};
pub use store::UpdateObserver;

// The command vocabulary is defined at the wire layer; surface it here
// so integrations depend on one crate.
pub use icomfort_api::messages::{FanMode, HvacMode};

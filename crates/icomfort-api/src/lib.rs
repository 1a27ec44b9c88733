// icomfort-api: Async Rust client for the iComfort cloud messaging endpoints

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod messages;
pub mod transport;

pub use client::{CloudClient, CloudConfig};
pub use endpoints::Endpoints;
pub use error::Error;

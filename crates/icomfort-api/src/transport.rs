// Shared transport configuration for building reqwest::Client instances.
//
// Every component that talks to the cloud goes through a client built
// here; nothing above this module constructs its own HTTP client or
// picks its own timeout.

use std::time::Duration;

use crate::error::Error;

/// Transport settings shared by all wire operations.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. A request that exceeds it is aborted and
    /// surfaces as a transport error.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("icomfort-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)
    }
}

// ── Runtime client configuration ──
//
// These types describe *how* to run one account's client: credentials,
// wire settings, and pump tuning. They carry data only — loading and
// validating configuration is the embedding application's job; this
// crate never reads files or the environment.

use std::time::Duration;

use icomfort_api::CloudConfig;
use secrecy::SecretString;

/// Configuration for one account's cloud client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Account email used for login.
    pub email: String,
    /// Account password. Only exposed at the login form-encoding site.
    pub password: SecretString,
    /// Wire-level settings (endpoints, ids, timeouts, retry counts).
    pub cloud: CloudConfig,
    /// Sleep between poll cycles.
    pub poll_interval: Duration,
    /// Consecutive non-unauthorized cycle failures that trip a reconnect.
    pub failure_threshold: u32,
    /// Upper bound on the initialization barrier. Elapsing it is a
    /// warning, never an error.
    pub init_timeout: Duration,
    /// First schedule id of the manual-mode block; a zone's manual-mode
    /// schedule is `base + zone index`. Configurable because firmware
    /// stability of the base is unverified.
    pub manual_schedule_base: u32,
}

impl ClientConfig {
    /// Config for the given credentials with default tuning.
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: SecretString::from(String::new()),
            cloud: CloudConfig::default(),
            poll_interval: Duration::from_secs(10),
            failure_threshold: 5,
            init_timeout: Duration::from_secs(30),
            manual_schedule_base: 16,
        }
    }
}

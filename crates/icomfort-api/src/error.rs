use thiserror::Error;

/// Top-level error type for the `icomfort-api` crate.
///
/// Covers every wire-level failure mode: the certificate exchange, the
/// credential login, and the post-auth messaging calls. `icomfort-core`
/// folds these into its consumer-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Certificate exchange exhausted its retries. The message carries the
    /// last failure text observed across all attempts.
    #[error("Certificate exchange failed: {message}")]
    AuthFailed { message: String },

    /// Credentials rejected, or the login response was malformed.
    #[error("Login failed: {message}")]
    LoginFailed { message: String },

    /// A required token is missing locally, or the service rejected the
    /// one we sent.
    #[error("Authorization token missing or rejected")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (timeout, DNS failure, connection refused, TLS).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response where no more specific variant applies.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the service rejected our authorization — the one
    /// error class that forces an immediate reconnect instead of counting
    /// toward the pump's failure threshold.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

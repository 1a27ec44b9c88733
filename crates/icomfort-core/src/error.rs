// ── Consumer-facing error types ──
//
// Integrations never see raw HTTP statuses or JSON parse failures; the
// `From<icomfort_api::Error>` impl folds the wire taxonomy into these
// domain-level classes.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Certificate exchange exhausted its retries.
    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    /// Credentials rejected or the login response was malformed.
    #[error("Login failed: {message}")]
    LoginFailed { message: String },

    /// A required token is missing or was rejected by the service.
    #[error("Not authorized -- re-authentication required")]
    Unauthorized,

    /// Any transport-level failure: timeout, DNS, TLS, connection
    /// refused, or a non-2xx where no more specific class applies.
    #[error("Communication error: {message}")]
    Comms { message: String },

    /// Malformed command input. Never raised by the poll path.
    #[error("Bad parameters: {message}")]
    BadParameters { message: String },

    /// A command addressed a zone the client has never seen.
    #[error("Unknown zone: {id}")]
    UnknownZone { id: String },
}

impl ClientError {
    /// Returns `true` for the one error class that short-circuits the
    /// pump straight into reconnection.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<icomfort_api::Error> for ClientError {
    fn from(err: icomfort_api::Error) -> Self {
        match err {
            icomfort_api::Error::AuthFailed { message } => ClientError::AuthFailed { message },
            icomfort_api::Error::LoginFailed { message } => ClientError::LoginFailed { message },
            icomfort_api::Error::Unauthorized => ClientError::Unauthorized,
            icomfort_api::Error::Transport(e) => ClientError::Comms {
                message: e.to_string(),
            },
            icomfort_api::Error::Http { status, body } => ClientError::Comms {
                message: format!("HTTP {status}: {body}"),
            },
            icomfort_api::Error::InvalidUrl(e) => ClientError::Comms {
                message: format!("invalid URL: {e}"),
            },
            icomfort_api::Error::Deserialization { message, .. } => ClientError::Comms {
                message: format!("malformed response: {message}"),
            },
        }
    }
}

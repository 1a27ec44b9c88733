// Cloud messaging HTTP client
//
// Wraps `reqwest::Client` with the service's envelope conventions: the
// token goes out as a raw `Authorization` header value (no `Bearer `
// prefix), retrieve is a bounded single fetch with no long-poll wait,
// and every outbound envelope carries a fresh correlation id. The auth
// handshake itself lives in `auth.rs` as inherent methods on this type.

use std::sync::RwLock;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::SessionTokens;
use crate::endpoints::Endpoints;
use crate::error::Error;
use crate::messages::{CommandMessage, RequestDataMessage, RetrieveResponse};
use crate::transport::TransportConfig;

/// Settings for a [`CloudClient`].
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// URL per wire operation.
    pub endpoints: Endpoints,
    /// The `applicationid` form field sent at login.
    pub app_id: String,
    /// Stable per-install identifier used as `SenderID` on outbound
    /// envelopes. Callers that care about stability across restarts
    /// should supply their own; the default is freshly generated.
    pub client_id: String,
    /// Per-request timeout.
    pub timeout: std::time::Duration,
    /// How long before bearer expiry a refresh becomes due.
    pub refresh_buffer: chrono::Duration,
    /// Attempts for the certificate exchange before giving up.
    pub auth_retries: u32,
    /// Maximum messages requested per retrieve call.
    pub message_count: u32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            app_id: "mapp079020".into(),
            client_id: format!("mapp079020-{}", uuid::Uuid::new_v4()),
            timeout: std::time::Duration::from_secs(30),
            refresh_buffer: chrono::Duration::seconds(300),
            auth_retries: 5,
            message_count: 10,
        }
    }
}

/// Raw HTTP client for the cloud messaging service.
///
/// Owns the session tokens (certificate + bearer) and injects them into
/// every post-auth request. Cheap to share behind an `Arc`; all methods
/// take `&self`.
pub struct CloudClient {
    http: reqwest::Client,
    config: CloudConfig,
    pub(crate) tokens: RwLock<SessionTokens>,
}

impl CloudClient {
    /// Create a new client from a [`CloudConfig`].
    pub fn new(config: CloudConfig) -> Result<Self, Error> {
        let http = TransportConfig {
            timeout: config.timeout,
        }
        .build_client()?;
        Ok(Self::from_reqwest(config, http))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(config: CloudConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config,
            tokens: RwLock::new(SessionTokens::default()),
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Post-auth operations ─────────────────────────────────────────

    /// Fetch one bounded batch of queued update messages, oldest first.
    ///
    /// A batch of zero messages is a normal, successful result.
    pub async fn retrieve_messages(&self) -> Result<RetrieveResponse, Error> {
        let token = self.bearer_token()?;
        let url = self.config.endpoints.retrieve.clone();
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&[
                ("Direction", "Oldest-to-Newest"),
                ("MessageCount", &self.config.message_count.to_string()),
                ("StartTime", "1"),
                ("LongPollingTimeout", "0"),
            ])
            .header(AUTHORIZATION, token)
            .send()
            .await
            .map_err(Error::Transport)?;

        self.parse_json(resp).await
    }

    /// Ask a system to publish the named data paths.
    pub async fn request_data(&self, sys_id: &str, json_path: &str) -> Result<(), Error> {
        let token = self.bearer_token()?;
        let url = self.config.endpoints.request_data.clone();
        let envelope = RequestDataMessage::new(&self.config.client_id, sys_id, json_path);
        debug!(target = sys_id, path = json_path, "POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION, token)
            .json(&envelope)
            .send()
            .await
            .map_err(Error::Transport)?;

        self.check_status(resp).await
    }

    /// Publish a command payload to one system.
    pub async fn publish(&self, sys_id: &str, data: serde_json::Value) -> Result<(), Error> {
        let token = self.bearer_token()?;
        let url = self.config.endpoints.publish.clone();
        let envelope = CommandMessage::new(&self.config.client_id, sys_id, data);
        debug!(target = sys_id, "POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION, token)
            .json(&envelope)
            .send()
            .await
            .map_err(Error::Transport)?;

        self.check_status(resp).await
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// POST an opaque text body without any token (certificate exchange).
    pub(crate) async fn post_plain(
        &self,
        url: Url,
        body: &'static str,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
    }

    /// Map a response to `()` or the appropriate error.
    async fn check_status(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Parse a JSON body, keeping the raw text for error reporting.
    async fn parse_json<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

// Two-step auth session: certificate exchange, then credential login.
//
// The session holds a short-lived certificate token and a bearer token
// with an absolute expiry. There is no refresh-token exchange: a refresh
// re-runs the whole handshake.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::client::CloudClient;
use crate::error::Error;
use crate::messages::{AuthenticateResponse, LoginResponse};

/// Fixed client certificate blob exchanged for the certificate token.
/// Opaque to us; the service validates it server-side.
const CLIENT_CERTIFICATE: &str = concat!(
    "MIIKXAIBAzCCChgGCSqGSIb3DQEHAaCCCgkEggoFMIIKATCCBgoGCSqGSIb3DQEH",
    "AaCCBfsEggX3MIIF8zCCBe8GCyqGSIb3DQEMCgECoIIE/jCCBPowHAYKKoZIhvcN",
    "AQwBAzAOBAhvt2dVYDpuhgICB9AEggTYM1dmy0SWHo9QCDUHPu7hZpQMNNaqVBsT",
    "repeJ8rWHMVzKpkzLehDFiKQpqVmvg1HvW2cSV2Rq5Nx8zeEL4PkhB2LXbJv0t5A",
    "pkDzQ8nG7wxkakEfjnwWcFuMqcKsIjRZ3r1uDQn0HYgqtAtIGBVK8hC2WN2mBdzK",
    "7s4aFHkLXE9rVok0cvPZqAjFwO8sJ6rkQ9efJqY5fwhy9V8cQmTdrhFZ0xNcqWrB",
    "uZUnwCkE0IOM5jc9qZDs0XKvKpduUarY3ZD5lV7FY3mtDbQ7c0vRFnPscw8xJ9Nm",
    "k3g1DUekP8mGDO12yfLjVG1tBoc0Eq48WnIbrFyhJtCwQnhKlrSIk36Vc2j0XHPv",
    "A7dVAL1xm6KiA8nBmxcqEY3P8XtWcZ0wDa6Ln1tZ3qyGqOl4TVsY0Ms2Rt8hwsJd",
    "Cw7wlqDRS2rFB2XE9ZVxuqDHKPtlfAZp1q9O0gFh4QDJcmp1Yl5pKzVct3a8Lw0H",
    "vUj9QnBdrb0oS3ngEX8y6c2XiO4CsZLkQ2VEZm1tbkDN3vLxqNtQmFzS5Jhb4RzV"
);

/// The bearer token obtained via login, plus its absolute expiry.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// Whether a refresh is due at `now`, given the safety buffer:
    /// due once `now >= expires_at - buffer`.
    fn refresh_due(&self, buffer: chrono::Duration, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - buffer
    }
}

/// Session token state. Nothing here survives process restart.
#[derive(Debug, Default)]
pub struct SessionTokens {
    pub certificate: Option<String>,
    pub bearer: Option<BearerToken>,
}

impl CloudClient {
    /// Exchange the fixed client certificate for a certificate token.
    ///
    /// Retries up to the configured attempt count on non-200 responses or
    /// transport errors; exhaustion fails with [`Error::AuthFailed`]
    /// carrying the last observed failure text.
    pub async fn authenticate(&self) -> Result<(), Error> {
        let mut last_failure = String::from("no attempts made");

        for attempt in 1..=self.config().auth_retries {
            debug!(attempt, "exchanging client certificate");
            match self.try_authenticate().await {
                Ok(token) => {
                    self.tokens_mut().certificate = Some(token);
                    debug!("certificate exchange successful");
                    return Ok(());
                }
                Err(text) => {
                    warn!(attempt, failure = %text, "certificate exchange attempt failed");
                    last_failure = text;
                }
            }
        }

        Err(Error::AuthFailed {
            message: last_failure,
        })
    }

    async fn try_authenticate(&self) -> Result<String, String> {
        let url = self.config().endpoints.authenticate.clone();
        let resp = self
            .post_plain(url, CLIENT_CERTIFICATE)
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(if body.is_empty() {
                format!("HTTP {status}")
            } else {
                body
            });
        }

        let parsed: AuthenticateResponse =
            serde_json::from_str(&body).map_err(|e| e.to_string())?;
        parsed
            .certificate_token
            .ok_or_else(|| "certificate token missing from response".into())
    }

    /// Log in with account credentials under the certificate token.
    ///
    /// On success the bearer token and expiry are stored and the response
    /// is returned so the caller can populate its system collection from
    /// the home enumeration.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, Error> {
        let certificate = self
            .tokens_read()
            .certificate
            .clone()
            .ok_or(Error::Unauthorized)?;

        let url = self.config().endpoints.login.clone();
        debug!(%email, "POST {}", url);

        let form = [
            ("username", email),
            ("password", password.expose_secret()),
            ("grant_type", "password"),
            ("applicationid", self.config().app_id.as_str()),
        ];

        let resp = self
            .http()
            .post(url)
            .header(reqwest::header::AUTHORIZATION, certificate)
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::LoginFailed {
                message: format!("login rejected (HTTP {status}): {body}"),
            });
        }

        let parsed: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::LoginFailed {
                message: format!("malformed login response: {e}"),
            })?;

        let token = parsed.user_token().ok_or_else(|| Error::LoginFailed {
            message: "bearer token missing from login response".into(),
        })?;

        self.tokens_mut().bearer = Some(BearerToken {
            token: token.encoded.clone(),
            expires_at: token.expires,
        });

        info!(
            systems = parsed.systems().count(),
            expires = %token.expires,
            "login successful"
        );
        Ok(parsed)
    }

    /// Whether the bearer token is missing or within the refresh buffer
    /// of its expiry. Consulted by the pump before every cycle.
    pub fn needs_refresh(&self) -> bool {
        match &self.tokens_read().bearer {
            None => true,
            Some(bearer) => bearer.refresh_due(self.config().refresh_buffer, Utc::now()),
        }
    }

    /// Unconditionally re-run the full authenticate + login sequence.
    pub async fn force_refresh(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, Error> {
        info!("refreshing session via full re-handshake");
        self.authenticate().await?;
        self.login(email, password).await
    }

    /// The current bearer token, for post-auth request headers.
    pub(crate) fn bearer_token(&self) -> Result<String, Error> {
        self.tokens_read()
            .bearer
            .as_ref()
            .map(|b| b.token.clone())
            .ok_or(Error::Unauthorized)
    }

    /// Drop all session tokens (shutdown path).
    pub fn clear_session(&self) {
        let mut tokens = self.tokens_mut();
        tokens.certificate = None;
        tokens.bearer = None;
    }

    fn tokens_read(&self) -> std::sync::RwLockReadGuard<'_, SessionTokens> {
        self.tokens.read().expect("token lock poisoned")
    }

    fn tokens_mut(&self) -> std::sync::RwLockWriteGuard<'_, SessionTokens> {
        self.tokens.write().expect("token lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_at(expires_at: DateTime<Utc>) -> BearerToken {
        BearerToken {
            token: "tok".into(),
            expires_at,
        }
    }

    #[test]
    fn refresh_not_due_outside_buffer() {
        let now = Utc::now();
        let buffer = chrono::Duration::seconds(300);
        let bearer = token_expiring_at(now + chrono::Duration::seconds(301));
        assert!(!bearer.refresh_due(buffer, now));
    }

    #[test]
    fn refresh_due_at_buffer_boundary() {
        let now = Utc::now();
        let buffer = chrono::Duration::seconds(300);
        let bearer = token_expiring_at(now + chrono::Duration::seconds(300));
        assert!(bearer.refresh_due(buffer, now));
    }

    #[test]
    fn refresh_due_after_expiry() {
        let now = Utc::now();
        let buffer = chrono::Duration::seconds(300);
        let bearer = token_expiring_at(now - chrono::Duration::seconds(1));
        assert!(bearer.refresh_due(buffer, now));
    }
}

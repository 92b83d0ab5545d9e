//! Auth0 authentication for the Havona API
//!
//! Handles token acquisition for both supported grants:
//! - Password grant for trader accounts
//! - Client-credentials grant for service (M2M) accounts
//!
//! Tokens are cached in memory and refreshed shortly before they expire.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::{AuthSettings, Grant};
use crate::error::{AuthError, HavonaMcpError, Result};

/// Refresh tokens this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Used when the token response carries no `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Token response from the Auth0 token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Auth0 token provider
pub struct TokenProvider {
    settings: AuthSettings,
    http_client: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a new token provider
    pub fn new(settings: AuthSettings, http_client: reqwest::Client) -> Self {
        Self {
            settings,
            http_client,
            token: RwLock::new(None),
        }
    }

    /// Get a valid access token, requesting a new one if necessary
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        let mut guard = self.token.write().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = guard.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);

        Ok(access_token)
    }

    /// Drop the cached token so the next call requests a fresh one
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    async fn request_token(&self) -> Result<CachedToken> {
        let audience = self.settings.audience.as_str();
        let params: Vec<(&str, &str)> = match &self.settings.grant {
            Grant::Password {
                client_id,
                username,
                password,
            } => vec![
                ("grant_type", "password"),
                ("client_id", client_id.as_str()),
                ("username", username.as_str()),
                ("password", password.as_str()),
                ("audience", audience),
                ("scope", "openid"),
            ],
            Grant::ClientCredentials {
                client_id,
                client_secret,
            } => vec![
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("audience", audience),
            ],
        };

        tracing::debug!(grant = self.grant_name(), "Requesting Auth0 access token");

        let response = self
            .http_client
            .post(self.settings.token_url())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(HavonaMcpError::Auth(AuthError::TokenRequestFailed {
                status,
                message: text,
            }));
        }

        let token_response: TokenResponse = response.json().await?;
        if token_response.access_token.is_empty() {
            return Err(HavonaMcpError::Auth(AuthError::MissingAccessToken));
        }

        let lifetime = token_response
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        tracing::info!(
            grant = self.grant_name(),
            expires_in_secs = lifetime.as_secs(),
            "Obtained Auth0 access token"
        );

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }

    fn grant_name(&self) -> &'static str {
        match self.settings.grant {
            Grant::Password { .. } => "password",
            Grant::ClientCredentials { .. } => "client_credentials",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_deserialize() {
        let json = r#"{"access_token":"abc","token_type":"Bearer","expires_in":86400}"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "abc");
        assert_eq!(resp.expires_in, Some(86400));
    }

    #[test]
    fn test_token_freshness() {
        let fresh = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(600),
        };
        let stale = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(fresh.is_fresh());
        assert!(!stale.is_fresh());
    }
}

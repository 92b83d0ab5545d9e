//! Configuration management for the Havona MCP Server
//!
//! Reads the API location and Auth0 credentials from the environment. Values
//! are only validated when the platform client is first needed, so the server
//! can start (and list its tools) before credentials are in place.

use std::time::Duration;

use crate::error::{ConfigError, HavonaMcpError, Result};

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable names
pub mod env {
    pub const API_URL: &str = "HAVONA_API_URL";
    pub const AUTH0_DOMAIN: &str = "AUTH0_DOMAIN";
    pub const AUTH0_AUDIENCE: &str = "AUTH0_AUDIENCE";
    pub const AUTH0_CLIENT_ID: &str = "AUTH0_CLIENT_ID";
    pub const EMAIL: &str = "HAVONA_EMAIL";
    pub const PASSWORD: &str = "HAVONA_PASSWORD";
    pub const M2M_CLIENT_ID: &str = "AUTH0_M2M_CLIENT_ID";
    pub const M2M_CLIENT_SECRET: &str = "AUTH0_M2M_CLIENT_SECRET";
    pub const HTTP_TIMEOUT_SECS: &str = "HAVONA_HTTP_TIMEOUT_SECS";
}

/// Raw configuration as read from the environment
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub auth0_domain: Option<String>,
    pub auth0_audience: Option<String>,
    pub auth0_client_id: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub m2m_client_id: Option<String>,
    pub m2m_client_secret: Option<String>,
    pub timeout_secs: Option<String>,
}

/// Auth0 grant used to obtain API tokens
#[derive(Clone)]
pub enum Grant {
    /// Resource-owner password grant for a trader account
    Password {
        client_id: String,
        username: String,
        password: String,
    },

    /// Client-credentials grant for a service account
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

impl std::fmt::Debug for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grant::Password { client_id, username, .. } => f
                .debug_struct("Password")
                .field("client_id", client_id)
                .field("username", username)
                .finish_non_exhaustive(),
            Grant::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Auth0 settings
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Token endpoint base, always with a scheme and without a trailing slash
    pub domain_url: String,
    pub audience: String,
    pub grant: Grant,
}

impl AuthSettings {
    /// Full URL of the Auth0 token endpoint
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.domain_url)
    }
}

/// Validated settings needed to build a platform client
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// API base URL without a trailing slash
    pub base_url: String,
    pub auth: AuthSettings,
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment, honouring a `.env` file
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            api_url: get(env::API_URL),
            auth0_domain: get(env::AUTH0_DOMAIN),
            auth0_audience: get(env::AUTH0_AUDIENCE),
            auth0_client_id: get(env::AUTH0_CLIENT_ID),
            email: get(env::EMAIL),
            password: get(env::PASSWORD),
            m2m_client_id: get(env::M2M_CLIENT_ID),
            m2m_client_secret: get(env::M2M_CLIENT_SECRET),
            timeout_secs: get(env::HTTP_TIMEOUT_SECS),
        }
    }

    /// Whether service-account credentials are configured
    pub fn uses_m2m(&self) -> bool {
        self.m2m_client_id.is_some() && self.m2m_client_secret.is_some()
    }

    /// Validate and resolve the settings for the platform client.
    ///
    /// Service-account credentials take priority when both sets are present.
    pub fn client_settings(&self) -> Result<ClientSettings> {
        let base_url = required(&self.api_url, env::API_URL)?
            .trim_end_matches('/')
            .to_string();

        let domain = required(&self.auth0_domain, env::AUTH0_DOMAIN)?;
        let audience = required(&self.auth0_audience, env::AUTH0_AUDIENCE)?.to_string();

        let grant = match (&self.m2m_client_id, &self.m2m_client_secret) {
            (Some(client_id), Some(client_secret)) => Grant::ClientCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            },
            _ => Grant::Password {
                client_id: required(&self.auth0_client_id, env::AUTH0_CLIENT_ID)?.to_string(),
                username: required(&self.email, env::EMAIL)?.to_string(),
                password: required(&self.password, env::PASSWORD)?.to_string(),
            },
        };

        let timeout_secs = match &self.timeout_secs {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                HavonaMcpError::Config(ConfigError::InvalidConfig {
                    message: format!("{} must be a whole number of seconds, got '{}'", env::HTTP_TIMEOUT_SECS, raw),
                })
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(ClientSettings {
            base_url,
            auth: AuthSettings {
                domain_url: normalize_domain(domain),
                audience,
                grant,
            },
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn required<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str> {
    value.as_deref().ok_or_else(|| {
        HavonaMcpError::Config(ConfigError::MissingEnvVar {
            var: var.to_string(),
        })
    })
}

/// Accept either a bare tenant host or a full URL
fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim_end_matches('/');
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const BASE: &[(&str, &str)] = &[
        (env::API_URL, "https://api.havona.example/"),
        (env::AUTH0_DOMAIN, "tenant.eu.auth0.com"),
        (env::AUTH0_AUDIENCE, "https://api.havona.example"),
    ];

    #[test]
    fn test_missing_api_url() {
        let config = config_from(&[]);
        let err = config.client_settings().unwrap_err();
        assert!(err.to_string().contains("HAVONA_API_URL environment variable is required"));
    }

    #[test]
    fn test_password_grant() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            (env::AUTH0_CLIENT_ID, "spa-client"),
            (env::EMAIL, "trader@example.com"),
            (env::PASSWORD, "hunter2"),
        ]);
        let settings = config_from(&pairs).client_settings().unwrap();

        assert_eq!(settings.base_url, "https://api.havona.example");
        assert_eq!(settings.auth.token_url(), "https://tenant.eu.auth0.com/oauth/token");
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        match settings.auth.grant {
            Grant::Password { username, .. } => assert_eq!(username, "trader@example.com"),
            other => panic!("unexpected grant: {:?}", other),
        }
    }

    #[test]
    fn test_m2m_takes_priority() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            (env::AUTH0_CLIENT_ID, "spa-client"),
            (env::EMAIL, "trader@example.com"),
            (env::PASSWORD, "hunter2"),
            (env::M2M_CLIENT_ID, "m2m-client"),
            (env::M2M_CLIENT_SECRET, "m2m-secret"),
        ]);
        let config = config_from(&pairs);
        assert!(config.uses_m2m());

        let settings = config.client_settings().unwrap();
        assert!(matches!(
            settings.auth.grant,
            Grant::ClientCredentials { ref client_id, .. } if client_id == "m2m-client"
        ));
    }

    #[test]
    fn test_m2m_requires_both_values() {
        let mut pairs = BASE.to_vec();
        pairs.push((env::M2M_CLIENT_ID, "m2m-client"));
        let err = config_from(&pairs).client_settings().unwrap_err();
        assert!(err.to_string().contains("AUTH0_CLIENT_ID"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config_from(&[(env::API_URL, "   ")]);
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_invalid_timeout() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            (env::M2M_CLIENT_ID, "m2m-client"),
            (env::M2M_CLIENT_SECRET, "m2m-secret"),
            (env::HTTP_TIMEOUT_SECS, "soon"),
        ]);
        let err = config_from(&pairs).client_settings().unwrap_err();
        assert!(matches!(err, HavonaMcpError::Config(ConfigError::InvalidConfig { .. })));
    }

    #[test]
    fn test_domain_with_scheme_is_kept() {
        assert_eq!(normalize_domain("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
        assert_eq!(normalize_domain("tenant.auth0.com"), "https://tenant.auth0.com");
    }

    #[test]
    fn test_grant_debug_hides_secrets() {
        let grant = Grant::Password {
            client_id: "spa".to_string(),
            username: "trader".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", grant).contains("hunter2"));
    }
}

//! Havona API client
//!
//! Authenticated HTTP client for the Havona GraphQL and REST endpoints.
//! Resource-specific calls live in the manager types returned by
//! [`HavonaClient::trades`], [`HavonaClient::blockchain`],
//! [`HavonaClient::agents`] and [`HavonaClient::documents`].

use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::config::ClientSettings;
use crate::error::{ApiError, HavonaMcpError, Result};
use crate::havona::agents::AgentManager;
use crate::havona::auth::TokenProvider;
use crate::havona::blockchain::BlockchainManager;
use crate::havona::documents::DocumentManager;
use crate::havona::trades::TradeManager;
use crate::havona::types::{GraphQlRequest, GraphQlResponse};

/// Havona API client
pub struct HavonaClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// API base URL without a trailing slash
    base_url: String,

    /// Auth0 token provider
    tokens: TokenProvider,
}

impl HavonaClient {
    /// Create a new client from validated settings
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("havona-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let tokens = TokenProvider::new(settings.auth, http_client.clone());

        Ok(Self {
            http_client,
            base_url: settings.base_url,
            tokens,
        })
    }

    /// API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the configured credentials yield an access token
    pub async fn verify(&self) -> Result<()> {
        self.tokens.access_token().await.map(|_| ())
    }

    // ==================== Resource Managers ====================

    /// Trade contract operations
    pub fn trades(&self) -> TradeManager<'_> {
        TradeManager::new(self)
    }

    /// Blockchain status operations
    pub fn blockchain(&self) -> BlockchainManager<'_> {
        BlockchainManager::new(self)
    }

    /// ERC-8004 agent operations
    pub fn agents(&self) -> AgentManager<'_> {
        AgentManager::new(self)
    }

    /// Document extraction operations
    pub fn documents(&self) -> DocumentManager<'_> {
        DocumentManager::new(self)
    }

    // ==================== GraphQL ====================

    /// Execute a GraphQL operation and return its `data` object
    pub async fn graphql(&self, query: &str, variables: Option<&Value>) -> Result<Value> {
        let url = format!("{}/graphql", self.base_url);
        let body = GraphQlRequest { query, variables };

        let response = self
            .send(|| self.http_client.post(&url).json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(Self::request_failed(response, "GraphQL request failed").await);
        }

        let envelope: GraphQlResponse = response.json().await?;
        if !envelope.errors.is_empty() {
            return Err(HavonaMcpError::Api(ApiError::GraphQl {
                messages: envelope.errors.into_iter().map(|e| e.message).collect(),
            }));
        }

        Ok(envelope.data.unwrap_or(Value::Null))
    }

    // ==================== REST ====================

    /// Full URL of a REST path under `/api`
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Authenticated GET against a REST path
    pub(crate) async fn get(&self, path: &str) -> Result<Response> {
        let url = self.api_url(path);
        tracing::debug!("GET {}", url);
        self.send(|| self.http_client.get(&url)).await
    }

    /// Authenticated POST of a request built by `build`
    pub(crate) async fn post_with<F>(&self, path: &str, build: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = self.api_url(path);
        tracing::debug!("POST {}", url);
        self.send(|| build(self.http_client.post(&url))).await
    }

    /// Send a request with a bearer token.
    ///
    /// A 401 drops the cached token and the request is sent once more.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let token = self.tokens.access_token().await?;
        let response = build().bearer_auth(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!("Access token rejected, retrying with a fresh token");
        self.tokens.invalidate().await;
        let token = self.tokens.access_token().await?;
        Ok(build().bearer_auth(&token).send().await?)
    }

    /// Turn a non-success response into an API error
    pub(crate) async fn request_failed(response: Response, context: &str) -> HavonaMcpError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        HavonaMcpError::Api(ApiError::RequestFailed {
            status,
            message: format!("{}: {}", context, text),
        })
    }
}

/// Take a named field out of a GraphQL `data` object
pub(crate) fn take_field(mut data: Value, name: &str) -> Result<Value> {
    match data.get_mut(name) {
        Some(value) => Ok(value.take()),
        None => Err(HavonaMcpError::Api(ApiError::UnexpectedResponse {
            message: format!("missing '{}' in GraphQL response", name),
        })),
    }
}

//! ERC-8004 agent registry and reputation

use reqwest::StatusCode;

use crate::error::{ApiError, HavonaMcpError, Result};
use crate::havona::client::HavonaClient;
use crate::havona::types::{Agent, AgentReputation};

/// Agent manager for Havona operations
pub struct AgentManager<'a> {
    client: &'a HavonaClient,
}

impl<'a> AgentManager<'a> {
    /// Create a new agent manager
    pub fn new(client: &'a HavonaClient) -> Self {
        Self { client }
    }

    /// List registered agents.
    ///
    /// The registry lives on-chain; when the platform reports the chain as
    /// unavailable the list is empty rather than an error.
    pub async fn list(&self) -> Result<Vec<Agent>> {
        let response = self.client.get("agents").await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::SERVICE_UNAVAILABLE => {
                tracing::warn!("Agent registry unavailable, returning no agents");
                Ok(Vec::new())
            }
            _ => Err(HavonaClient::request_failed(response, "Failed to list agents").await),
        }
    }

    /// Aggregated reputation for an agent
    pub async fn reputation(&self, agent_id: u64) -> Result<AgentReputation> {
        let response = self
            .client
            .get(&format!("agents/{}/reputation", agent_id))
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else if response.status() == StatusCode::NOT_FOUND {
            Err(HavonaMcpError::Api(ApiError::NotFound {
                resource: "Agent".to_string(),
                id: agent_id.to_string(),
            }))
        } else {
            Err(HavonaClient::request_failed(response, "Failed to get agent reputation").await)
        }
    }
}

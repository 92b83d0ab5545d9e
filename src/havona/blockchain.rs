//! Blockchain status for the Havona platform

use reqwest::StatusCode;

use crate::error::{ApiError, HavonaMcpError, Result};
use crate::havona::client::HavonaClient;
use crate::havona::types::{BlockchainStatus, PersistenceRecord};

/// Blockchain manager for Havona operations
pub struct BlockchainManager<'a> {
    client: &'a HavonaClient,
}

impl<'a> BlockchainManager<'a> {
    /// Create a new blockchain manager
    pub fn new(client: &'a HavonaClient) -> Self {
        Self { client }
    }

    /// Connection status of the platform's confidential EVM chain
    pub async fn status(&self) -> Result<BlockchainStatus> {
        let response = self.client.get("blockchain/status").await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(HavonaClient::request_failed(response, "Failed to get blockchain status").await)
        }
    }

    /// On-chain persistence record for a trade
    pub async fn persistence(&self, trade_id: &str) -> Result<PersistenceRecord> {
        let path = format!("blockchain/persistence/{}", urlencoding::encode(trade_id));
        let response = self.client.get(&path).await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else if response.status() == StatusCode::NOT_FOUND {
            Err(HavonaMcpError::Api(ApiError::NotFound {
                resource: "Persistence record for trade".to_string(),
                id: trade_id.to_string(),
            }))
        } else {
            Err(HavonaClient::request_failed(response, "Failed to get persistence record").await)
        }
    }
}

//! Trade contract operations
//!
//! Trades are read and written through the Havona GraphQL API. Writes are
//! dual-persisted by the platform to its database and the confidential chain.

use serde_json::{json, Value};

use crate::error::{ApiError, HavonaMcpError, Result};
use crate::havona::client::{take_field, HavonaClient};
use crate::havona::types::{TradeContract, TradeInput};

const LIST_TRADES: &str = r#"
query ListTrades($first: Int) {
  queryTradeContract(first: $first) {
    id contractNo status contractType blockchainStatus txHash
  }
}"#;

const GET_TRADE: &str = r#"
query GetTrade($id: ID!) {
  getTradeContract(id: $id) {
    id contractNo status contractType blockchainStatus txHash blockNumber
    commodity quantity unit currency totalValue originCountry destinationCountry
    createdAt updatedAt
  }
}"#;

const CREATE_TRADE: &str = r#"
mutation CreateTrade($input: [AddTradeContractInput!]!) {
  addTradeContract(input: $input) {
    tradeContract { id contractNo status blockchainStatus }
  }
}"#;

const UPDATE_TRADE_STATUS: &str = r#"
mutation UpdateTradeStatus($id: [ID!], $status: String) {
  updateTradeContract(input: { filter: { id: $id }, set: { status: $status } }) {
    tradeContract { id contractNo status blockchainStatus }
  }
}"#;

/// Trade manager for Havona operations
pub struct TradeManager<'a> {
    client: &'a HavonaClient,
}

impl<'a> TradeManager<'a> {
    /// Create a new trade manager
    pub fn new(client: &'a HavonaClient) -> Self {
        Self { client }
    }

    /// List up to `limit` trade contracts visible to the caller
    pub async fn list(&self, limit: u32) -> Result<Vec<TradeContract>> {
        let data = self
            .client
            .graphql(LIST_TRADES, Some(&json!({ "first": limit })))
            .await?;

        match take_field(data, "queryTradeContract")? {
            Value::Null => Ok(Vec::new()),
            trades => Ok(serde_json::from_value(trades)?),
        }
    }

    /// Fetch a single trade contract by ID
    pub async fn get(&self, trade_id: &str) -> Result<TradeContract> {
        let data = self
            .client
            .graphql(GET_TRADE, Some(&json!({ "id": trade_id })))
            .await?;

        match take_field(data, "getTradeContract")? {
            Value::Null => Err(not_found(trade_id)),
            trade => Ok(serde_json::from_value(trade)?),
        }
    }

    /// Create a trade contract and return it with its server-assigned ID
    pub async fn create(&self, input: TradeInput) -> Result<TradeContract> {
        let contract_no = input.contract_no.clone();
        let data = self
            .client
            .graphql(CREATE_TRADE, Some(&json!({ "input": [input] })))
            .await?;

        let created = first_trade(data, "addTradeContract")?.ok_or_else(|| {
            HavonaMcpError::Api(ApiError::UnexpectedResponse {
                message: format!("no trade returned for contract {}", contract_no),
            })
        })?;

        let trade: TradeContract = serde_json::from_value(created)?;
        tracing::info!(trade_id = %trade.id, contract_no = %contract_no, "Created trade contract");
        Ok(trade)
    }

    /// Update the status of a trade and return the updated record
    pub async fn update_status(&self, trade_id: &str, status: &str) -> Result<Value> {
        let data = self
            .client
            .graphql(
                UPDATE_TRADE_STATUS,
                Some(&json!({ "id": [trade_id], "status": status })),
            )
            .await?;

        let updated = first_trade(data, "updateTradeContract")?.ok_or_else(|| not_found(trade_id))?;
        tracing::info!(trade_id = %trade_id, status = %status, "Updated trade status");
        Ok(updated)
    }
}

/// First entry of `<mutation>.tradeContract`, if any
fn first_trade(data: Value, mutation: &str) -> Result<Option<Value>> {
    let payload = take_field(data, mutation)?;
    let trades = payload
        .get("tradeContract")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    Ok(trades.into_iter().next())
}

fn not_found(trade_id: &str) -> HavonaMcpError {
    HavonaMcpError::Api(ApiError::NotFound {
        resource: "Trade".to_string(),
        id: trade_id.to_string(),
    })
}

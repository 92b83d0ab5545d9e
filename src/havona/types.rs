//! Havona API type definitions
//!
//! These types mirror the Havona GraphQL and REST payloads and are used for
//! serialization/deserialization. Unknown fields are tolerated everywhere.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A trade contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeContract {
    /// DGraph UID
    pub id: String,

    /// Human-facing contract number (e.g. "TC-2026-001")
    #[serde(default)]
    pub contract_no: Option<String>,

    /// Lifecycle status (DRAFT, ACTIVE, COMPLETED, ...)
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub contract_type: Option<String>,

    /// Blockchain persistence state
    #[serde(default)]
    pub blockchain_status: Option<String>,

    #[serde(default)]
    pub tx_hash: Option<String>,

    #[serde(default)]
    pub block_number: Option<u64>,

    /// Any other fields returned by the API
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for creating a trade contract
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeInput {
    pub contract_no: String,
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_country: Option<String>,
}

/// Blockchain connection status of the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainStatus {
    #[serde(default)]
    pub connected: bool,

    #[serde(default)]
    pub chain_id: Option<Value>,

    #[serde(default)]
    pub network: Option<String>,

    #[serde(default)]
    pub contract_address: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// On-chain persistence record for a trade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceRecord {
    #[serde(default)]
    pub record_id: Option<String>,

    /// PENDING, CONFIRMED or FAILED
    pub status: String,

    #[serde(default)]
    pub tx_hash: Option<String>,

    #[serde(default)]
    pub block_number: Option<u64>,

    #[serde(default)]
    pub attempt_count: u32,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// A registered ERC-8004 agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// On-chain agent ID
    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub agent_type: Option<String>,

    #[serde(default)]
    pub wallet: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, alias = "metadataURI")]
    pub metadata_uri: Option<String>,
}

/// Aggregated reputation of an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReputation {
    pub agent_id: u64,

    #[serde(default)]
    pub total_feedback: u64,

    /// Average score, 0 to 5
    #[serde(default)]
    pub average_score: f64,

    /// Score breakdown by category
    #[serde(default)]
    pub breakdown: Value,
}

/// A document type supported for extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Fields extracted from a trade document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub document_type: String,

    #[serde(default)]
    pub fields: Value,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub source: Option<String>,
}

/// GraphQL request body
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<&'a Value>,
}

/// GraphQL response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// A single GraphQL error entry
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

//! MCP Tool definitions and handlers
//!
//! Defines all available tools and their implementations.

use std::path::PathBuf;

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use validator::Validate;

use crate::config::Config;
use crate::error::{HavonaMcpError, McpError, Result, ValidationError};
use crate::havona::client::HavonaClient;
use crate::havona::types::TradeInput;
use crate::mcp::types::{CallToolResult, Tool};

/// Tool handler
pub struct ToolHandler {
    config: Config,

    /// Created from `config` on the first tool call
    client: OnceCell<HavonaClient>,
}

impl ToolHandler {
    /// Create a tool handler that builds its client lazily from `config`
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Create a tool handler around an existing client
    pub fn with_client(client: HavonaClient) -> Self {
        Self {
            config: Config::default(),
            client: OnceCell::new_with(Some(client)),
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            tool_def(
                "list_trades",
                "List trade contracts visible to the authenticated user. Returns up to `limit` records with id, contractNo, status, contractType and blockchain persistence state.",
                schema_of::<ListTradesArgs>(),
            ),
            tool_def(
                "get_trade",
                "Fetch a single trade contract by its ID, including blockchain persistence state.",
                schema_of::<TradeIdArgs>(),
            ),
            tool_def(
                "create_trade",
                "Create a new trade contract. The record is dual-persisted to the database and the confidential blockchain. Returns the new trade including its server-assigned id.",
                schema_of::<CreateTradeArgs>(),
            ),
            tool_def(
                "update_trade_status",
                "Update the status of an existing trade contract (e.g. ACTIVE, COMPLETED, CANCELLED). Returns the updated trade.",
                schema_of::<UpdateTradeStatusArgs>(),
            ),
            tool_def(
                "blockchain_status",
                "Check the blockchain connection status of the Havona platform: whether it is connected to its confidential EVM chain, the chain ID, and the deployed contract address.",
                empty_schema(),
            ),
            tool_def(
                "get_trade_blockchain_record",
                "Fetch the on-chain persistence record for a trade: confirmation status (PENDING, CONFIRMED, FAILED), transaction hash and block number.",
                schema_of::<TradeIdArgs>(),
            ),
            tool_def(
                "list_agents",
                "List all ERC-8004 AI agents registered on the Havona platform with their on-chain ID, name, type, wallet address and status. Returns an empty list if the blockchain connection is unavailable.",
                empty_schema(),
            ),
            tool_def(
                "get_agent_reputation",
                "Get the aggregated reputation score for an AI agent: total feedback count, average score (0-5) and a breakdown by category.",
                schema_of::<AgentReputationArgs>(),
            ),
            tool_def(
                "list_supported_document_types",
                "List the ETR document types supported for AI extraction, such as COMMERCIAL_INVOICE, BILL_OF_LADING and CERTIFICATE_OF_ORIGIN.",
                empty_schema(),
            ),
            tool_def(
                "extract_trade_document",
                "Extract structured trade data from an ETR document PDF using AI. Does not save anything: call create_trade with the returned fields to persist.",
                schema_of::<ExtractDocumentArgs>(),
            ),
            tool_def(
                "graphql_query",
                "Execute a raw GraphQL query against the Havona API, for queries not covered by the other tools. Example: query { queryTradeContract(first: 5) { id contractNo status } }",
                schema_of::<GraphqlQueryArgs>(),
            ),
        ]
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        let result = match name {
            "list_trades" => self.handle_list_trades(args).await,
            "get_trade" => self.handle_get_trade(args).await,
            "create_trade" => self.handle_create_trade(args).await,
            "update_trade_status" => self.handle_update_trade_status(args).await,
            "blockchain_status" => self.handle_blockchain_status().await,
            "get_trade_blockchain_record" => self.handle_trade_blockchain_record(args).await,
            "list_agents" => self.handle_list_agents().await,
            "get_agent_reputation" => self.handle_agent_reputation(args).await,
            "list_supported_document_types" => self.handle_document_types().await,
            "extract_trade_document" => self.handle_extract_document(args).await,
            "graphql_query" => return self.handle_graphql_query(args).await,
            _ => Err(HavonaMcpError::Mcp(McpError::UnknownTool {
                name: name.to_string(),
            })),
        };

        to_tool_result(name, result)
    }

    /// The platform client, created on first use
    async fn client(&self) -> Result<&HavonaClient> {
        self.client
            .get_or_try_init(|| async {
                let settings = self.config.client_settings()?;
                tracing::info!(
                    base_url = %settings.base_url,
                    m2m = self.config.uses_m2m(),
                    "Initialising Havona client"
                );
                HavonaClient::new(settings)
            })
            .await
    }

    // ==================== Trade Tools ====================

    async fn handle_list_trades(&self, args: Value) -> Result<Value> {
        let args: ListTradesArgs = parse_args(args)?;
        let trades = self.client().await?.trades().list(args.limit).await?;

        Ok(Value::Array(
            trades
                .into_iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "contractNo": t.contract_no,
                        "status": t.status,
                        "contractType": t.contract_type,
                        "blockchainStatus": t.blockchain_status,
                        "txHash": t.tx_hash,
                    })
                })
                .collect(),
        ))
    }

    async fn handle_get_trade(&self, args: Value) -> Result<Value> {
        let args: TradeIdArgs = parse_args(args)?;
        let t = self.client().await?.trades().get(&args.trade_id).await?;

        let mut out = Map::new();
        out.insert("id".into(), json!(t.id));
        out.insert("contractNo".into(), json!(t.contract_no));
        out.insert("status".into(), json!(t.status));
        out.insert("contractType".into(), json!(t.contract_type));
        out.insert("blockchainStatus".into(), json!(t.blockchain_status));
        out.insert("txHash".into(), json!(t.tx_hash));
        out.insert("blockNumber".into(), json!(t.block_number));
        out.extend(t.extra);

        Ok(Value::Object(out))
    }

    async fn handle_create_trade(&self, args: Value) -> Result<Value> {
        let args: CreateTradeArgs = parse_args(args)?;
        let trade = self.client().await?.trades().create(args.into_input()).await?;

        Ok(json!({
            "id": trade.id,
            "contractNo": trade.contract_no,
            "status": trade.status,
            "blockchainStatus": trade.blockchain_status,
        }))
    }

    async fn handle_update_trade_status(&self, args: Value) -> Result<Value> {
        let args: UpdateTradeStatusArgs = parse_args(args)?;
        self.client()
            .await?
            .trades()
            .update_status(&args.trade_id, &args.status)
            .await
    }

    // ==================== Blockchain Tools ====================

    async fn handle_blockchain_status(&self) -> Result<Value> {
        let s = self.client().await?.blockchain().status().await?;

        let mut out = Map::new();
        out.insert("connected".into(), json!(s.connected));
        out.insert("chainId".into(), json!(s.chain_id));
        out.insert("network".into(), json!(s.network));
        out.insert("contractAddress".into(), json!(s.contract_address));
        out.extend(s.extra);

        Ok(Value::Object(out))
    }

    async fn handle_trade_blockchain_record(&self, args: Value) -> Result<Value> {
        let args: TradeIdArgs = parse_args(args)?;
        let p = self
            .client()
            .await?
            .blockchain()
            .persistence(&args.trade_id)
            .await?;

        Ok(json!({
            "recordId": p.record_id,
            "status": p.status,
            "txHash": p.tx_hash,
            "blockNumber": p.block_number,
            "attemptCount": p.attempt_count,
            "createdAt": p.created_at,
        }))
    }

    // ==================== Agent Tools ====================

    async fn handle_list_agents(&self) -> Result<Value> {
        let agents = self.client().await?.agents().list().await?;

        Ok(Value::Array(
            agents
                .into_iter()
                .map(|a| {
                    json!({
                        "id": a.id,
                        "name": a.name,
                        "agentType": a.agent_type,
                        "wallet": a.wallet,
                        "status": a.status,
                        "metadataUri": a.metadata_uri,
                    })
                })
                .collect(),
        ))
    }

    async fn handle_agent_reputation(&self, args: Value) -> Result<Value> {
        let args: AgentReputationArgs = parse_args(args)?;
        let rep = self.client().await?.agents().reputation(args.agent_id).await?;

        Ok(json!({
            "agentId": rep.agent_id,
            "totalFeedback": rep.total_feedback,
            "averageScore": rep.average_score,
            "breakdown": rep.breakdown,
        }))
    }

    // ==================== Document Tools ====================

    async fn handle_document_types(&self) -> Result<Value> {
        let types = self.client().await?.documents().supported_types().await?;

        Ok(Value::Array(
            types
                .into_iter()
                .map(|t| json!({"id": t.id, "name": t.name, "description": t.description}))
                .collect(),
        ))
    }

    async fn handle_extract_document(&self, args: Value) -> Result<Value> {
        let args: ExtractDocumentArgs = parse_args(args)?;
        let path = PathBuf::from(&args.file_path);
        let document_type = args.document_type.trim().to_uppercase();
        let result = self
            .client()
            .await?
            .documents()
            .extract(&path, &document_type)
            .await?;

        Ok(json!({
            "documentType": result.document_type,
            "fields": result.fields,
            "confidence": result.confidence,
            "source": result.source,
        }))
    }

    // ==================== Raw Passthrough ====================

    async fn handle_graphql_query(&self, args: Value) -> CallToolResult {
        let args: GraphqlQueryArgs = match parse_args(args) {
            Ok(args) => args,
            Err(e) => return to_tool_result("graphql_query", Err(e)),
        };
        // Bad variables are reported as a bare {"error": ...} payload
        let variables = match parse_variables(args.variables) {
            Ok(variables) => variables,
            Err(message) => {
                tracing::warn!(tool = "graphql_query", error = %message, "Tool call failed");
                return CallToolResult::error(message);
            }
        };

        let result = match self.client().await {
            Ok(client) => client.graphql(&args.query, variables.as_ref()).await,
            Err(e) => Err(e),
        };
        to_tool_result("graphql_query", result)
    }
}

// ==================== Tool Arguments ====================

fn default_limit() -> u32 {
    20
}

fn default_status() -> String {
    "DRAFT".to_string()
}

/// Arguments for list_trades
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct ListTradesArgs {
    /// Maximum number of trades to return
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub limit: u32,
}

/// Arguments naming a single trade
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct TradeIdArgs {
    /// The DGraph UUID of the trade contract
    #[serde(alias = "tradeId")]
    #[validate(length(min = 1))]
    pub trade_id: String,
}

/// Arguments for create_trade
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct CreateTradeArgs {
    /// Unique contract identifier (e.g. "TC-2026-001")
    #[validate(length(min = 1))]
    pub contract_no: String,

    /// Initial status: DRAFT (default) or ACTIVE
    #[serde(default = "default_status")]
    #[validate(length(min = 1))]
    pub status: String,

    /// Contract type, e.g. "SPOT" or "FORWARD"
    pub contract_type: Option<String>,

    /// Member UUID of the selling party
    pub seller_id: Option<String>,

    /// Member UUID of the buying party
    pub buyer_id: Option<String>,

    /// Commodity name (e.g. "Crude Oil", "Wheat")
    pub commodity: Option<String>,

    /// Quantity as a string (e.g. "50000")
    pub quantity: Option<String>,

    /// Unit of measure (e.g. "BBL", "MT")
    pub unit: Option<String>,

    /// ISO currency code (e.g. "USD")
    pub currency: Option<String>,

    /// Total contract value as a string
    pub total_value: Option<String>,

    /// ISO country code of origin
    pub origin_country: Option<String>,

    /// ISO country code of destination
    pub destination_country: Option<String>,
}

impl CreateTradeArgs {
    /// Convert to the API input, dropping empty optional values
    pub fn into_input(self) -> TradeInput {
        let set = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        TradeInput {
            contract_no: self.contract_no,
            status: self.status,
            contract_type: set(self.contract_type),
            seller_id: set(self.seller_id),
            buyer_id: set(self.buyer_id),
            commodity: set(self.commodity),
            quantity: set(self.quantity),
            unit: set(self.unit),
            currency: set(self.currency),
            total_value: set(self.total_value),
            origin_country: set(self.origin_country),
            destination_country: set(self.destination_country),
        }
    }
}

/// Arguments for update_trade_status
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct UpdateTradeStatusArgs {
    /// The DGraph UUID of the trade
    #[serde(alias = "tradeId")]
    #[validate(length(min = 1))]
    pub trade_id: String,

    /// New status (e.g. "ACTIVE", "COMPLETED", "CANCELLED")
    #[validate(length(min = 1))]
    pub status: String,
}

/// Arguments for get_agent_reputation
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct AgentReputationArgs {
    /// The integer on-chain agent ID
    #[serde(alias = "agentId")]
    pub agent_id: u64,
}

/// Arguments for extract_trade_document
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct ExtractDocumentArgs {
    /// Absolute path to the PDF file on this machine
    #[validate(length(min = 1))]
    pub file_path: String,

    /// One of COMMERCIAL_INVOICE, BILL_OF_LADING, CERTIFICATE_OF_ORIGIN
    #[validate(length(min = 1))]
    pub document_type: String,
}

/// Arguments for graphql_query
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct GraphqlQueryArgs {
    /// GraphQL query string
    #[validate(length(min = 1))]
    pub query: String,

    /// Optional JSON string of query variables
    #[schemars(with = "Option<String>")]
    pub variables: Option<Value>,
}

/// Deserialize and validate tool arguments
fn parse_args<T>(args: Value) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let args = if args.is_null() { json!({}) } else { args };
    let parsed: T = serde_json::from_value(args).map_err(|e| {
        HavonaMcpError::Validation(ValidationError::InvalidArguments {
            message: e.to_string(),
        })
    })?;
    parsed.validate()?;
    Ok(parsed)
}

/// Map a handler outcome onto the tool result sent to the client
fn to_tool_result(name: &str, result: Result<Value>) -> CallToolResult {
    match result {
        Ok(value) => CallToolResult::json(&value),
        Err(e) => {
            tracing::warn!(tool = %name, error = %e, "Tool call failed");
            CallToolResult::from_error(&e)
        }
    }
}

/// GraphQL variables arrive as a JSON string, but an object is accepted too.
/// The error is the message reported to the client.
fn parse_variables(variables: Option<Value>) -> std::result::Result<Option<Value>, String> {
    match variables {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| format!("Invalid variables JSON: {}", e)),
        Some(value @ Value::Object(_)) => Ok(Some(value)),
        Some(_) => Err("Invalid variables JSON: expected a JSON object or a JSON string".to_string()),
    }
}

// ==================== Schema Helpers ====================

/// Helper to create a tool definition
fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// JSON schema for a tool's argument struct, inlined and without metadata
fn schema_of<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.option_add_null_type = false;
            s.inline_subschemas = true;
        })
        .into_generator();
    let schema = generator.into_root_schema_for::<T>();

    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| empty_schema());
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.remove("description");
        obj.remove("definitions");
        obj.entry("properties").or_insert_with(|| json!({}));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> ToolHandler {
        ToolHandler::new(Config::default())
    }

    #[test]
    fn test_tool_names() {
        let names: Vec<String> = handler().list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "list_trades",
                "get_trade",
                "create_trade",
                "update_trade_status",
                "blockchain_status",
                "get_trade_blockchain_record",
                "list_agents",
                "get_agent_reputation",
                "list_supported_document_types",
                "extract_trade_document",
                "graphql_query",
            ]
        );
    }

    #[test]
    fn test_create_trade_schema() {
        let schema = schema_of::<CreateTradeArgs>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["status"]["default"], "DRAFT");
        assert_eq!(schema["properties"]["contract_no"]["type"], "string");

        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(required, vec!["contract_no"]);
    }

    #[test]
    fn test_list_trades_defaults() {
        let args: ListTradesArgs = parse_args(Value::Null).unwrap();
        assert_eq!(args.limit, 20);
    }

    #[test]
    fn test_list_trades_limit_validated() {
        let err = parse_args::<ListTradesArgs>(json!({"limit": 0})).unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_trade_id_alias() {
        let args: TradeIdArgs = parse_args(json!({"tradeId": "0x4e21"})).unwrap();
        assert_eq!(args.trade_id, "0x4e21");
    }

    #[test]
    fn test_empty_trade_id_rejected() {
        assert!(parse_args::<TradeIdArgs>(json!({"trade_id": ""})).is_err());
    }

    #[test]
    fn test_create_trade_drops_empty_values() {
        let args: CreateTradeArgs = parse_args(json!({
            "contract_no": "TC-2026-001",
            "commodity": "Wheat",
            "currency": "",
            "unit": "  "
        }))
        .unwrap();
        let input = args.into_input();

        assert_eq!(input.status, "DRAFT");
        assert_eq!(input.commodity.as_deref(), Some("Wheat"));
        assert!(input.currency.is_none());
        assert!(input.unit.is_none());
    }

    #[test]
    fn test_parse_variables() {
        assert_eq!(parse_variables(None).unwrap(), None);
        assert_eq!(parse_variables(Some(json!(""))).unwrap(), None);
        assert_eq!(
            parse_variables(Some(json!(r#"{"first": 5}"#))).unwrap(),
            Some(json!({"first": 5}))
        );
        assert_eq!(
            parse_variables(Some(json!({"first": 5}))).unwrap(),
            Some(json!({"first": 5}))
        );

        let err = parse_variables(Some(json!("{not json"))).unwrap_err();
        assert!(err.starts_with("Invalid variables JSON:"));

        let err = parse_variables(Some(json!([1, 2]))).unwrap_err();
        assert!(err.starts_with("Invalid variables JSON:"));
    }

    #[tokio::test]
    async fn test_invalid_variables_payload_has_no_type() {
        let result = handler()
            .call_tool("graphql_query", json!({"query": "{ x }", "variables": "{oops"}))
            .await;
        assert!(result.is_error);

        let payload: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid variables JSON:"));
        assert!(payload.get("type").is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = handler().call_tool("send_email", json!({})).await;
        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains("Unknown tool: send_email"));
    }

    #[tokio::test]
    async fn test_missing_config_is_tool_error() {
        let result = handler().call_tool("blockchain_status", json!({})).await;
        assert!(result.is_error);

        let payload: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(payload["type"], "ConfigError");
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .contains("HAVONA_API_URL environment variable is required"));
    }
}

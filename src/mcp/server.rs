//! MCP Server implementation
//!
//! Dispatches JSON-RPC messages to the tool handler. The same server backs
//! both the stdio transport defined here and the SSE transport in
//! [`crate::mcp::sse`].

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

/// MCP Server info
pub const SERVER_NAME: &str = "havona";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Usage hints sent to the client on initialize
pub const SERVER_INSTRUCTIONS: &str = "Havona trade finance platform. \
Use these tools to query trade contracts, check blockchain status, \
list AI agents and their reputation scores, and extract structured \
data from trade documents (Commercial Invoice, Bill of Lading, etc.).";

/// MCP Server for Havona
pub struct McpServer {
    /// Tool handler
    tool_handler: ToolHandler,

    /// Whether a client has completed initialization
    initialized: AtomicBool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: ToolHandler) -> Self {
        Self {
            tool_handler,
            initialized: false.into(),
        }
    }

    /// Whether the client has sent `notifications/initialized`
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    /// Run the server on stdio
    pub async fn run_stdio(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        tracing::info!("Havona MCP server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line).await {
                let mut response_str = serde_json::to_string(&response)?;
                response_str.push('\n');
                stdout.write_all(response_str.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle an incoming JSON-RPC message.
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::error(None, JsonRpcError::parse_error(e.to_string())));
            }
        };

        self.handle_request(request).await
    }

    /// Handle a parsed JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(format!("Unsupported jsonrpc version: {}", request.jsonrpc)),
            ));
        }

        if request.is_notification() {
            if request.method == methods::INITIALIZED {
                self.initialized.store(true, Ordering::Relaxed);
                tracing::debug!("Client initialized");
            } else {
                tracing::debug!("Ignoring notification {}", request.method);
            }
            return None;
        }

        let id = request.id.clone();
        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(&request),
            methods::PING => Ok(serde_json::json!({})),
            methods::LIST_TOOLS => self.handle_list_tools(),
            methods::CALL_TOOL => self.handle_call_tool(&request).await,
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    /// Handle initialize request
    fn handle_initialize(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: Option<InitializeParams> = request
            .params
            .clone()
            .and_then(|p| serde_json::from_value(p).ok());

        let requested = params.as_ref().map(|p| p.protocol_version.as_str());
        let protocol_version = negotiate_version(requested);

        if let Some(client) = params.as_ref().and_then(|p| p.client_info.as_ref()) {
            tracing::info!(
                client = %client.name,
                client_version = %client.version,
                protocol_version = %protocol_version,
                "Client connected"
            );
        }

        let result = InitializeResult {
            protocol_version: protocol_version.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        };

        to_result(&result)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> std::result::Result<Value, JsonRpcError> {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        to_result(&result)
    }

    /// Handle call tool request
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = match request.params.as_ref() {
            Some(p) => serde_json::from_value(p.clone())
                .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tool parameters: {}", e)))?,
            None => return Err(JsonRpcError::invalid_params("Missing tool parameters")),
        };

        tracing::debug!(tool = %params.name, "Calling tool");
        let result = self.tool_handler.call_tool(&params.name, params.arguments).await;

        to_result(&result)
    }
}

/// Echo the client's version when we speak it, otherwise offer our latest
fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_VERSIONS.iter().copied().find(|s| *s == v))
        .unwrap_or(MCP_VERSION)
}

fn to_result<T: serde::Serialize>(value: &T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn server() -> McpServer {
        McpServer::new(ToolHandler::new(Config::default()))
    }

    #[test]
    fn test_server_info() {
        assert_eq!(SERVER_NAME, "havona");
    }

    #[test]
    fn test_negotiate_version() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_version(Some("1999-01-01")), MCP_VERSION);
        assert_eq!(negotiate_version(None), MCP_VERSION);
    }

    #[tokio::test]
    async fn test_initialized_notification() {
        let server = server();
        assert!(!server.is_initialized());

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_ping() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":"p1","method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, Some(RequestId::String("p1".to_string())));
        assert_eq!(response.result, Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
    }
}

//! Error types for the Havona MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Havona MCP Server
#[derive(Error, Debug)]
pub enum HavonaMcpError {
    /// Auth0 token errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Havona API errors
    #[error("Havona API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HavonaMcpError {
    /// Stable type name reported to MCP clients alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            HavonaMcpError::Auth(_) => "AuthError",
            HavonaMcpError::Api(ApiError::NotFound { .. }) => "NotFoundError",
            HavonaMcpError::Api(ApiError::GraphQl { .. }) => "GraphQLError",
            HavonaMcpError::Api(_) => "ApiError",
            HavonaMcpError::Config(_) => "ConfigError",
            HavonaMcpError::Validation(_) => "ValidationError",
            HavonaMcpError::Mcp(_) => "McpError",
            HavonaMcpError::Io(_) => "IoError",
            HavonaMcpError::Json(_) => "JsonError",
            HavonaMcpError::Http(_) => "HttpError",
        }
    }
}

/// Auth0 token errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token request failed ({status}): {message}")]
    TokenRequestFailed { status: u16, message: String },

    #[error("Token response did not contain an access token")]
    MissingAccessToken,
}

/// Havona API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("API request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("GraphQL error: {}", .messages.join("; "))]
    GraphQl { messages: Vec<String> },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} environment variable is required")]
    MissingEnvVar { var: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Unknown session: {session_id}")]
    UnknownSession { session_id: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },
}

/// Result type alias for Havona MCP operations
pub type Result<T> = std::result::Result<T, HavonaMcpError>;

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let reasons = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", field, reasons)
            })
            .collect::<Vec<_>>()
            .join("; ");
        ValidationError::InvalidArguments { message }
    }
}

impl From<validator::ValidationErrors> for HavonaMcpError {
    fn from(errors: validator::ValidationErrors) -> Self {
        HavonaMcpError::Validation(ValidationError::from(errors))
    }
}

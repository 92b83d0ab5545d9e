//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol for tool invocation over stdio and SSE.

pub mod server;
pub mod sse;
pub mod tools;
pub mod types;

//! Havona MCP Server Library
//!
//! A Model Context Protocol (MCP) server for the Havona trade finance API.
//! Provides tools for querying and creating trade contracts, checking
//! blockchain status, inspecting agent reputation and extracting trade
//! documents.

pub mod config;
pub mod error;
pub mod havona;
pub mod mcp;

pub use config::Config;
pub use error::{HavonaMcpError, Result};

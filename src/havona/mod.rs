//! Havona API module
//!
//! Contains types, Auth0 authentication, and the client for the Havona
//! trade finance API.

pub mod agents;
pub mod auth;
pub mod blockchain;
pub mod client;
pub mod documents;
pub mod trades;
pub mod types;

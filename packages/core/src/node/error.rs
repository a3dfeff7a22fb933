//! Node-level error types
//!
//! Errors that can occur while provisioning a node from the inventory.

use thiserror::Error;

use crate::client::ClientError;

/// Errors that can occur during node operations
#[derive(Error, Debug)]
pub enum NodeError {
    /// Opening the session failed
    #[error("Failed to connect to '{host}': {error}")]
    Connect { host: String, error: ClientError },

    /// A provisioning step failed after the session was open
    #[error("{step}: {error}")]
    Step {
        step: &'static str,
        error: ClientError,
    },

    /// Node not found in nodes.json
    #[error("Node not found: {0}")]
    NotFound(String),

    /// Failed to load nodes file
    #[error("Failed to load nodes file: {0}")]
    LoadFailed(String),

    /// Failed to save nodes file
    #[error("Failed to save nodes file: {0}")]
    SaveFailed(String),

    /// Invalid node configuration
    #[error("Invalid node configuration: {0}")]
    InvalidConfig(String),
}

impl NodeError {
    /// The underlying client error, if this failure came from the remote side
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            NodeError::Connect { error, .. } | NodeError::Step { error, .. } => Some(error),
            _ => None,
        }
    }
}

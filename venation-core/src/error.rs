//! Error types for the growth engine.

use thiserror::Error;

use crate::types::NodeId;

/// Errors surfaced synchronously by the growth entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// A configuration value was rejected before any work was done.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A node id that does not exist in the tree.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
}

/// Result type alias for growth engine operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

//! Error types for the ENS light resolver
//!
//! This module defines all error types used throughout the crate.
//!
//! The error type is `Clone`: a single upstream resolution is shared by
//! every caller waiting on the same name, and each of them receives its
//! own copy of the outcome.

use thiserror::Error;

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ENS light resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The chain client cannot be attached yet
    #[error("Node is still initializing")]
    ChainInitializing,

    /// The chain client reports an active sync
    #[error("Cannot resolve names while the chain is syncing")]
    ChainSyncing,

    /// No resolver registered, or the resolver returned no usable record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport or contract-call failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A contract call reverted
    #[error("Contract call reverted: {0}")]
    CallReverted(String),

    /// Name failed syntactic validation
    #[error("Malformed name: {0}")]
    MalformedInput(String),

    /// Record or ABI payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an upstream (transport) error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a reverted-call error
    pub fn reverted(msg: impl Into<String>) -> Self {
        Self::CallReverted(msg.into())
    }

    /// Create a malformed input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether a later attempt may succeed without any change to the request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ChainInitializing | Self::ChainSyncing | Self::Upstream(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

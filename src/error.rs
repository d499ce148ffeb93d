//! Error types for provisioning operations

use thiserror::Error;

/// Errors surfaced by the management client and the resource adapters.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The management API answered a call with a status >= 400
    #[error("{context}: {status}")]
    RemoteRejected { context: String, status: String },

    /// The management API answered a GET with 404
    #[error("{0} not found")]
    NotFound(String),

    /// Input attributes or an identifier could not be interpreted
    #[error("{0}")]
    MalformedInput(String),

    /// The management API answered with something we cannot decode
    #[error("unexpected response from management API: {0}")]
    UnexpectedResponse(String),

    /// Provider connection settings are unusable
    #[error("invalid provider configuration: {0}")]
    Configuration(String),

    /// Connection-level failure, propagated unchanged
    #[error("management API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProviderError {
    pub fn rejected(context: impl Into<String>, status: impl Into<String>) -> Self {
        Self::RemoteRejected {
            context: context.into(),
            status: status.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

//! Registry error model.

use thiserror::Error;

/// Result type for the fallible (configuration) surfaces of this crate.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while building a registry.
///
/// Registry operations themselves never fail; handler panics propagate to the
/// publisher untouched.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A configuration value could not be understood.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration JSON could not be parsed.
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

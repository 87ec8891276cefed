//! Registry configuration.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Environment variable read by [`RegistryConfig::from_env`].
pub const MISSING_HANDLER_ENV: &str = "TINYBUS_MISSING_HANDLER";

/// What `unsubscribe(type, Some(handler))` does when `handler` is not in the list.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingHandlerPolicy {
    /// Leave the list untouched.
    #[default]
    Ignore,
    /// Remove the first handler of the list instead (drop-in compatibility
    /// with emitters that treat "not found" as index 0).
    RemoveFirst,
}

impl FromStr for MissingHandlerPolicy {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "remove_first" | "remove-first" => Ok(Self::RemoveFirst),
            other => Err(RegistryError::invalid_config(format!(
                "unknown missing handler policy: {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub missing_handler: MissingHandlerPolicy,
}

impl RegistryConfig {
    pub fn from_json(json: &str) -> RegistryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build from the process environment; unset variables keep their defaults.
    pub fn from_env() -> RegistryResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RegistryResult<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(MISSING_HANDLER_ENV) {
            config.missing_handler = raw.parse()?;
        }
        Ok(config)
    }
}

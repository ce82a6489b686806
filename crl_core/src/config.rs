//! Store configuration and the shared TOML loader.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::CoreResult;

/// Limits applied while dispatching change notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// Maximum function invocations in a single drain.
    pub max_function_calls: usize,

    /// Maximum length of a notification's underlying chain before forwarding stops.
    pub max_notification_depth: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            max_function_calls: 100_000,
            max_notification_depth: 64,
        }
    }
}

impl UniverseConfig {
    /// Load from a TOML document; missing keys keep their defaults.
    pub fn from_toml(source: &str) -> CoreResult<Self> {
        from_toml_str(source)
    }
}

/// Parse any config struct from TOML.
pub fn from_toml_str<T: DeserializeOwned>(source: &str) -> CoreResult<T> {
    Ok(toml::from_str(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = UniverseConfig::from_toml("").unwrap();
        assert_eq!(config, UniverseConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = UniverseConfig::from_toml("max_notification_depth = 8").unwrap();
        assert_eq!(config.max_notification_depth, 8);
        assert_eq!(config.max_function_calls, 100_000);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(UniverseConfig::from_toml("max_function_calls = \"many\"").is_err());
    }
}

//! Configuration for the settlement engine

use serde::{Deserialize, Serialize};

/// Default event namespace, inherited from the original network definition
pub const DEFAULT_NAMESPACE: &str = "org.coyote.playground.blockchain.demo";

/// Settlement engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Namespace stamped onto emitted event type names
    pub namespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "freight-settlement".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(ns) = std::env::var("FREIGHT_EVENT_NAMESPACE") {
            config.namespace = ns;
        }

        if let Ok(name) = std::env::var("FREIGHT_SERVICE_NAME") {
            config.service_name = name;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespace() {
        let config = Config::default();
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            service_name = "freight-settlement"
            service_version = "0.1.0"
            namespace = "org.example.freight"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.namespace, "org.example.freight");
    }
}

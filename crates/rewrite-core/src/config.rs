//! Configuration types for the rewrite registry
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// Main rewrite registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Persistence sink configuration
    #[serde(default)]
    pub sink: SinkConfig,

    /// Rules seeded into the store when the sink has nothing persisted
    #[serde(default)]
    pub rewrites: Vec<Rule>,
}

impl RewriteConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sink configuration
    pub fn with_sink(mut self, sink: SinkConfig) -> Self {
        self.sink = sink;
        self
    }

    /// Add a seed rule
    pub fn with_rewrite(mut self, domain: impl Into<String>, answer: impl Into<String>) -> Self {
        self.rewrites.push(Rule::new(domain, answer));
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.sink.validate()?;

        for rule in &self.rewrites {
            rule.normalize().map_err(|e| {
                crate::Error::config(format!("Invalid seed rewrite {}: {}", rule, e))
            })?;
        }

        Ok(())
    }
}

/// Persistence sink configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// JSON file sink
    File {
        /// Path to the rewrites file
        path: String,
    },

    /// In-memory sink (not persistent)
    #[default]
    Memory,

    /// Custom sink
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SinkConfig {
    /// Validate the sink configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SinkConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File sink path cannot be empty"));
                }
                Ok(())
            }
            SinkConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom sink factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom sink config cannot be null"));
                }
                Ok(())
            }
            SinkConfig::Memory => Ok(()),
        }
    }

    /// Get the sink type name used for registry lookup
    pub fn type_name(&self) -> &str {
        match self {
            SinkConfig::File { .. } => "file",
            SinkConfig::Memory => "memory",
            SinkConfig::Custom { factory, .. } => factory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_memory() {
        let config = RewriteConfig::new();
        assert_eq!(config.sink.type_name(), "memory");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_file_path() {
        let config = RewriteConfig::new().with_sink(SinkConfig::File {
            path: String::new(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_seed_rules() {
        let config = RewriteConfig::new()
            .with_rewrite("a.com", "1.1.1.1")
            .with_rewrite("", "2.2.2.2");
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_deserialize_tagged_sink() {
        let json = r#"{
            "sink": {"type": "file", "path": "/var/lib/rewrites.json"},
            "rewrites": [{"domain": "a.com", "answer": "1.1.1.1"}]
        }"#;
        let config: RewriteConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sink.type_name(), "file");
        assert_eq!(config.rewrites, vec![Rule::new("a.com", "1.1.1.1")]);
    }
}

//! Plugin-based sink registry
//!
//! The registry allows persistence sinks to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains over [`SinkConfig`] variants.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rewrite_core::registry::SinkRegistry;
//! use rewrite_core::config::SinkConfig;
//!
//! // Built-in "memory" and "file" sinks
//! let registry = SinkRegistry::with_builtin();
//!
//! // Add a custom one
//! registry.register_sink("sqlite", Box::new(sqlite_factory));
//!
//! let sink = registry.create_sink(&SinkConfig::Memory).await?;
//! ```

use crate::config::SinkConfig;
use crate::error::{Error, Result};
use crate::sink::{FileSinkFactory, MemorySinkFactory};
use crate::traits::{ConfigSink, SinkFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry for plugin-based sink creation
///
/// Maps sink type names to factory objects.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: RwLock<HashMap<String, Arc<dyn SinkFactory>>>,
}

impl SinkRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` sinks registered
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_sink("memory", Box::new(MemorySinkFactory));
        registry.register_sink("file", Box::new(FileSinkFactory));
        registry
    }

    /// Register a sink factory
    ///
    /// # Parameters
    ///
    /// - `name`: Sink type name (e.g., "file", "memory")
    /// - `factory`: Factory object for creating sink instances
    pub fn register_sink(&self, name: impl Into<String>, factory: Box<dyn SinkFactory>) {
        let mut sinks = self.sinks.write().unwrap_or_else(PoisonError::into_inner);
        sinks.insert(name.into(), Arc::from(factory));
    }

    /// Create a sink from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ConfigSink>)`: Created sink instance
    /// - `Err(Error)`: If the sink type is not registered or creation fails
    pub async fn create_sink(&self, config: &SinkConfig) -> Result<Box<dyn ConfigSink>> {
        config.validate()?;
        let sink_type = config.type_name();

        let factory = {
            let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
            sinks
                .get(sink_type)
                .ok_or_else(|| Error::config(format!("Unknown sink type: {}", sink_type)))?
                .clone()
        };

        factory.create(config).await
    }

    /// List all registered sink types
    pub fn list_sinks(&self) -> Vec<String> {
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
        sinks.keys().cloned().collect()
    }

    /// Check if a sink type is registered
    pub fn has_sink(&self, name: &str) -> bool {
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
        sinks.contains_key(name)
    }
}

// # Config Sink Trait
//
// Defines the interface the rule store calls after it commits a mutation.
//
// ## Purpose
//
// The rule store only keeps rules in memory. Whoever owns the configuration
// (a config file, a database, a parent process) implements this trait to
// persist the collection and to supply the initial rules on startup.
//
// ## Ordering
//
// The store invokes the sink after releasing its lock. Two writers can
// therefore deliver their snapshots out of order. Every snapshot carries the
// store generation it was taken at; sinks that persist must ignore a
// snapshot older than the newest one they have already written.
//
// `load` returns the persisted generation along with the rules. A store
// built from it continues counting from there, and the sink resets its
// own high-water mark to the loaded generation, so a store reloaded from a
// sink it already wrote to is never mistaken for a stale writer.
//
// ## Usage
//
// ```rust,ignore
// use rewrite_core::{ConfigSink, RuleSnapshot};
//
// let loaded = sink.load().await?;
// // ... mutations happen ...
// sink.config_modified(&snapshot).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SinkConfig;
use crate::rule::Rule;

/// Copy of the rule collection taken under the store lock
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSnapshot {
    /// Store generation the snapshot was taken at
    pub generation: u64,
    /// Rules in collection order
    pub rules: Vec<Rule>,
}

impl RuleSnapshot {
    /// Create a snapshot
    pub fn new(generation: u64, rules: Vec<Rule>) -> Self {
        Self { generation, rules }
    }

    /// Whether this snapshot supersedes one taken at `generation`
    pub fn is_newer_than(&self, generation: u64) -> bool {
        self.generation > generation
    }
}

/// Trait for persistence hooks notified by the rule store
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Failure
///
/// A failing `config_modified` does not roll back the in-memory mutation.
/// The store logs the error and reports success to its caller, so sinks
/// should keep enough state to retry on the next notification.
#[async_trait]
pub trait ConfigSink: Send + Sync {
    /// Persist the collection after a committed mutation
    ///
    /// # Parameters
    ///
    /// - `snapshot`: The collection as of the mutation
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Persisted, or skipped because a newer snapshot was already written
    /// - `Err(Error)`: Storage error
    async fn config_modified(&self, snapshot: &RuleSnapshot) -> Result<(), crate::Error>;

    /// Load the persisted collection
    ///
    /// Implementations that skip stale snapshots must reset their
    /// high-water mark to the returned generation.
    ///
    /// # Returns
    ///
    /// - `Ok(RuleSnapshot)`: Rules in persisted order with the generation
    ///   they were saved at (empty at generation 0 if nothing saved yet)
    /// - `Err(Error)`: Storage error
    async fn load(&self) -> Result<RuleSnapshot, crate::Error>;

    /// Short name used in log lines
    fn sink_name(&self) -> &'static str;
}

/// Helper trait for constructing sinks from configuration
#[async_trait]
pub trait SinkFactory: Send + Sync {
    /// Create a ConfigSink instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Sink configuration
    ///
    /// # Returns
    ///
    /// A boxed ConfigSink trait object
    async fn create(&self, config: &SinkConfig) -> Result<Box<dyn ConfigSink>, crate::Error>;
}

// # Memory Sink
//
// In-memory implementation of ConfigSink.
//
// ## Purpose
//
// Keeps the latest snapshot in memory and counts notifications. Useful for
// tests, for embedding where the host owns persistence, and for deployments
// where rewrites are re-seeded from configuration on every start.
//
// ## Crash Behavior
//
// - All rewrites added at runtime are lost on restart/crash

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::config::SinkConfig;
use crate::rule::Rule;
use crate::traits::config_sink::{ConfigSink, RuleSnapshot, SinkFactory};

/// In-memory sink implementation
///
/// Stores the newest snapshot it has been handed. Snapshots older than the
/// stored one are counted but otherwise ignored.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    latest: Arc<RwLock<RuleSnapshot>>,
    notify_count: Arc<AtomicUsize>,
}

impl MemorySink {
    /// Create a new empty memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory sink that loads `rules`
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            latest: Arc::new(RwLock::new(RuleSnapshot::new(0, rules))),
            notify_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `config_modified` calls received
    pub fn notify_count(&self) -> usize {
        self.notify_count.load(Ordering::SeqCst)
    }

    /// The newest snapshot received
    pub async fn latest(&self) -> RuleSnapshot {
        self.latest.read().await.clone()
    }
}

#[async_trait]
impl ConfigSink for MemorySink {
    async fn config_modified(&self, snapshot: &RuleSnapshot) -> Result<(), Error> {
        self.notify_count.fetch_add(1, Ordering::SeqCst);

        let mut guard = self.latest.write().await;
        if snapshot.is_newer_than(guard.generation) {
            *guard = snapshot.clone();
        }
        Ok(())
    }

    async fn load(&self) -> Result<RuleSnapshot, Error> {
        Ok(self.latest.read().await.clone())
    }

    fn sink_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for [`MemorySink`]
#[derive(Debug, Default)]
pub struct MemorySinkFactory;

#[async_trait]
impl SinkFactory for MemorySinkFactory {
    async fn create(&self, config: &SinkConfig) -> Result<Box<dyn ConfigSink>, Error> {
        match config {
            SinkConfig::Memory => Ok(Box::new(MemorySink::new())),
            other => Err(Error::config(format!(
                "Memory sink factory cannot build a {} sink",
                other.type_name()
            ))),
        }
    }
}

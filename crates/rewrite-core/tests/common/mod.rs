//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal sinks that record how the store calls them.

#![allow(dead_code)]

use rewrite_core::{ConfigSink, Error, Result, Rule, RuleSnapshot, RuleStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// A sink that records every snapshot it receives
pub struct RecordingSink {
    /// Call counter for config_modified()
    notify_count: Arc<AtomicUsize>,
    /// Snapshots in arrival order
    snapshots: Arc<Mutex<Vec<RuleSnapshot>>>,
    /// Fail every config_modified() call when set
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            notify_count: Arc::new(AtomicUsize::new(0)),
            snapshots: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// A sink whose config_modified() always errors
    pub fn failing() -> Self {
        let sink = Self::new();
        sink.failing.store(true, Ordering::SeqCst);
        sink
    }

    /// Get the number of times config_modified() was called
    pub fn notify_count(&self) -> usize {
        self.notify_count.load(Ordering::SeqCst)
    }

    /// Get the snapshots received so far
    pub fn snapshots(&self) -> Vec<RuleSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ConfigSink for RecordingSink {
    async fn config_modified(&self, snapshot: &RuleSnapshot) -> Result<()> {
        self.notify_count.fetch_add(1, Ordering::SeqCst);
        self.snapshots.lock().unwrap().push(snapshot.clone());

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::sink("disk full"));
        }
        Ok(())
    }

    async fn load(&self) -> Result<RuleSnapshot> {
        Ok(RuleSnapshot::default())
    }

    fn sink_name(&self) -> &'static str {
        "recording"
    }
}

/// A sink that reads back from the store while being notified
///
/// If the store still held its write lock during notification, the read
/// in config_modified() would never complete.
pub struct ReentrantSink {
    store: OnceLock<RuleStore>,
    observed: Mutex<Vec<usize>>,
}

impl ReentrantSink {
    pub fn new() -> Self {
        Self {
            store: OnceLock::new(),
            observed: Mutex::new(Vec::new()),
        }
    }

    /// Attach the store to read from
    pub fn attach(&self, store: RuleStore) {
        let _ = self.store.set(store);
    }

    /// Collection sizes seen from inside config_modified()
    pub fn observed(&self) -> Vec<usize> {
        self.observed.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ConfigSink for ReentrantSink {
    async fn config_modified(&self, _snapshot: &RuleSnapshot) -> Result<()> {
        if let Some(store) = self.store.get() {
            let len = store.list("").await.len();
            self.observed.lock().unwrap().push(len);
        }
        Ok(())
    }

    async fn load(&self) -> Result<RuleSnapshot> {
        Ok(RuleSnapshot::default())
    }

    fn sink_name(&self) -> &'static str {
        "reentrant"
    }
}

/// Build rules from `(domain, answer)` pairs
pub fn rules(pairs: &[(&str, &str)]) -> Vec<Rule> {
    pairs.iter().map(|(d, a)| Rule::new(*d, *a)).collect()
}

/// Build a store over `pairs` with a recording sink
pub fn store_with(pairs: &[(&str, &str)]) -> (RuleStore, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let store = RuleStore::with_rules(rules(pairs), sink.clone());
    (store, sink)
}

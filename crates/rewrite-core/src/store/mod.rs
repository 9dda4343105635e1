//! Rule store
//!
//! The [`RuleStore`] owns the rewrite rule collection and the lock guarding
//! it. All access goes through its operations:
//!
//! ```text
//!            list ──── read lock ────┐
//!                                    ▼
//!  add / delete / update ── write lock ──► Vec<Rule> ──► snapshot
//!                                                          │
//!                                   lock released ◄────────┘
//!                                          │
//!                                          ▼
//!                                   ConfigSink::config_modified
//! ```
//!
//! ## Locking
//!
//! - Readers share the lock and receive owned copies of the rules.
//! - Writers hold the exclusive lock across normalization, the duplicate
//!   check and the mutation, so two concurrent adds of the same pair cannot
//!   both pass the check.
//! - Nothing awaits while the lock is held. The sink is called after the
//!   guard is dropped, with a snapshot taken under the lock.
//!
//! ## Failure
//!
//! A failed operation leaves the collection untouched and does not notify
//! the sink. A sink failure after a committed mutation is logged and
//! otherwise ignored.

pub mod duplicate;
pub mod filter;

pub use duplicate::{check_duplicate, count_matches};
pub use filter::{filter_rules, matches_query};

use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::RewriteConfig;
use crate::error::{Error, Result};
use crate::registry::SinkRegistry;
use crate::rule::Rule;
use crate::traits::{ConfigSink, RuleSnapshot};

/// Rules plus the mutation counter, guarded together
#[derive(Debug, Default)]
struct Collection {
    rules: Vec<Rule>,
    generation: u64,
}

impl Collection {
    /// Record a committed mutation and take the snapshot handed to the sink
    fn commit(&mut self) -> RuleSnapshot {
        self.generation += 1;
        RuleSnapshot::new(self.generation, self.rules.clone())
    }
}

/// Concurrency-safe registry of rewrite rules
///
/// Cloning is cheap and yields a handle to the same collection.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use rewrite_core::{MemorySink, RuleStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = RuleStore::new(Arc::new(MemorySink::new()));
///
///     store.add("ads.example.com", "0.0.0.0").await?;
///     store.update("ads.example.com", "0.0.0.0", "ads.example.com", "::").await?;
///
///     let rules = store.list("example").await;
///     assert_eq!(rules.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RuleStore {
    inner: Arc<RwLock<Collection>>,
    sink: Arc<dyn ConfigSink>,
}

impl RuleStore {
    /// Create an empty store notifying `sink`
    pub fn new(sink: Arc<dyn ConfigSink>) -> Self {
        Self::with_rules(Vec::new(), sink)
    }

    /// Create a store holding `rules`
    ///
    /// Every rule is normalized. Rules failing normalization are dropped with
    /// a warning. Exact duplicates are kept; they can only be introduced out
    /// of band and [`RuleStore::delete`] removes all of them.
    pub fn with_rules(rules: Vec<Rule>, sink: Arc<dyn ConfigSink>) -> Self {
        Self::with_snapshot(RuleSnapshot::new(0, rules), sink)
    }

    /// Create a store holding a persisted snapshot
    ///
    /// Rules are normalized as in [`RuleStore::with_rules`]. The generation
    /// continues from the snapshot's, so the next commit is newer than
    /// anything the sink already holds.
    pub fn with_snapshot(snapshot: RuleSnapshot, sink: Arc<dyn ConfigSink>) -> Self {
        let rules: Vec<Rule> = snapshot
            .rules
            .into_iter()
            .filter_map(|rule| match rule.normalize() {
                Ok(normalized) => Some(normalized),
                Err(e) => {
                    warn!("rewrite: skipping invalid rule {}: {}", rule, e);
                    None
                }
            })
            .collect();

        Self {
            inner: Arc::new(RwLock::new(Collection {
                rules,
                generation: snapshot.generation,
            })),
            sink,
        }
    }

    /// Create a store from whatever `sink` has persisted
    pub async fn load(sink: Arc<dyn ConfigSink>) -> Result<Self> {
        let loaded = sink.load().await?;
        info!(
            "rewrite: loaded {} rules at generation {} from {} sink",
            loaded.rules.len(),
            loaded.generation,
            sink.sink_name()
        );
        Ok(Self::with_snapshot(loaded, sink))
    }

    /// Create a store from configuration
    ///
    /// The sink is built through `registry`. If it has nothing persisted yet,
    /// the store starts from the configured seed rules.
    pub async fn from_config(config: &RewriteConfig, registry: &SinkRegistry) -> Result<Self> {
        config.validate()?;

        let sink: Arc<dyn ConfigSink> = Arc::from(registry.create_sink(&config.sink).await?);
        let mut loaded = sink.load().await?;
        if loaded.rules.is_empty() && !config.rewrites.is_empty() {
            info!(
                "rewrite: {} sink is empty, seeding {} rules from config",
                sink.sink_name(),
                config.rewrites.len()
            );
            loaded.rules = config.rewrites.clone();
        }

        Ok(Self::with_snapshot(loaded, sink))
    }

    /// List rules whose domain or answer contains `filter`
    ///
    /// An empty filter returns every rule. Matching is case-sensitive and the
    /// collection order is preserved.
    pub async fn list(&self, filter: &str) -> Vec<Rule> {
        let guard = self.inner.read().await;
        filter_rules(&guard.rules, filter)
    }

    /// Check whether `(domain, answer)` is already registered
    ///
    /// This is a standalone pre-flight check under the read lock. The
    /// mutating operations repeat it under their own write lock.
    pub async fn check_duplicate(&self, domain: &str, answer: &str) -> Result<()> {
        let candidate = canonical_or_raw(Rule::new(domain, answer));
        let guard = self.inner.read().await;
        check_duplicate(&guard.rules, &candidate.domain, &candidate.answer)
    }

    /// Append a rule
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: domain or answer is empty
    /// - [`Error::Duplicate`]: the normalized pair is already registered
    pub async fn add(&self, domain: &str, answer: &str) -> Result<()> {
        let snapshot = {
            let mut guard = self.inner.write().await;

            let rule = Rule::new(domain, answer).normalize()?;
            check_duplicate(&guard.rules, &rule.domain, &rule.answer)?;

            debug!(
                "rewrite: added element: {} [{}]",
                rule,
                guard.rules.len() + 1
            );
            guard.rules.push(rule);

            guard.commit()
        };

        self.notify(snapshot).await;
        Ok(())
    }

    /// Remove every rule equal to `(domain, answer)`
    ///
    /// Never fails; returns the number of rules removed. The sink is only
    /// notified when something was removed.
    pub async fn delete(&self, domain: &str, answer: &str) -> Result<usize> {
        let target = canonical_or_raw(Rule::new(domain, answer));

        let (removed, snapshot) = {
            let mut guard = self.inner.write().await;

            let before = guard.rules.len();
            guard.rules.retain(|rule| {
                if rule.equal(&target) {
                    debug!("rewrite: removed element: {}", rule);
                    false
                } else {
                    true
                }
            });
            let removed = before - guard.rules.len();

            if removed == 0 {
                debug!("rewrite: nothing to remove for {}", target);
                return Ok(0);
            }

            (removed, guard.commit())
        };

        self.notify(snapshot).await;
        Ok(removed)
    }

    /// Replace the first rule equal to the target pair, keeping its position
    ///
    /// The duplicate check covers the whole collection, the target included,
    /// so resubmitting a rule unchanged is rejected as a duplicate.
    ///
    /// # Errors
    ///
    /// - [`Error::Duplicate`]: the new pair is already registered
    /// - [`Error::Validation`]: new domain or answer is empty
    /// - [`Error::NotFound`]: no rule equals the target
    pub async fn update(
        &self,
        target_domain: &str,
        target_answer: &str,
        new_domain: &str,
        new_answer: &str,
    ) -> Result<()> {
        let target = canonical_or_raw(Rule::new(target_domain, target_answer));

        let snapshot = {
            let mut guard = self.inner.write().await;

            let replacement = Rule::new(new_domain, new_answer).normalize()?;
            check_duplicate(&guard.rules, &replacement.domain, &replacement.answer)?;

            let index = guard
                .rules
                .iter()
                .position(|rule| rule.equal(&target))
                .ok_or_else(|| Error::not_found(target_domain, target_answer))?;

            let removed = std::mem::replace(&mut guard.rules[index], replacement);
            debug!("rewrite: removed element: {}", removed);
            debug!("rewrite: added element: {}", guard.rules[index]);

            guard.commit()
        };

        self.notify(snapshot).await;
        Ok(())
    }

    /// Number of rules
    pub async fn len(&self) -> usize {
        self.inner.read().await.rules.len()
    }

    /// Whether the store holds no rules
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.rules.is_empty()
    }

    /// Number of committed mutations since the store was created
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Copy of the collection with its generation
    pub async fn snapshot(&self) -> RuleSnapshot {
        let guard = self.inner.read().await;
        RuleSnapshot::new(guard.generation, guard.rules.clone())
    }

    /// Hand a committed snapshot to the sink
    async fn notify(&self, snapshot: RuleSnapshot) {
        if let Err(e) = self.sink.config_modified(&snapshot).await {
            warn!(
                "rewrite: {} sink failed to persist generation {}: {}",
                self.sink.sink_name(),
                snapshot.generation,
                e
            );
        }
    }
}

impl fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleStore")
            .field("sink", &self.sink.sink_name())
            .finish_non_exhaustive()
    }
}

/// Normalized form of a lookup key, or the key itself if it cannot be
/// normalized (such a key cannot match a stored rule anyway)
fn canonical_or_raw(rule: Rule) -> Rule {
    rule.normalize().unwrap_or(rule)
}

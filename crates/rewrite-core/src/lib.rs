// # rewrite-core
//
// Core library for the DNS rewrite registry.
//
// ## Architecture Overview
//
// This library keeps the rewrite rules a resolver consults instead of the
// normal lookup:
// - **Rule**: Domain/answer pair with normalization and exact-pair equality
// - **RuleStore**: The single owner of the rule collection and its lock
// - **ConfigSink**: Trait for the persistence hook called after mutations
// - **SinkRegistry**: Plugin-based registry for sinks
//
// ## Design Principles
//
// 1. **Single Owner**: Only the store touches the collection; readers get copies
// 2. **Atomic Mutations**: Validate, check for duplicates and mutate under one write lock
// 3. **Notify After Unlock**: Sinks never run while the lock is held
// 4. **Library-First**: Transport and resolution live outside this crate

pub mod config;
pub mod error;
pub mod registry;
pub mod rule;
pub mod sink;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{RewriteConfig, SinkConfig};
pub use error::{Error, Result};
pub use registry::SinkRegistry;
pub use rule::{Rule, RuleKind};
pub use sink::{FileSink, MemorySink};
pub use store::RuleStore;
pub use traits::{ConfigSink, RuleSnapshot, SinkFactory};

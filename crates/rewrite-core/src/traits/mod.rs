//! Core traits for the rewrite registry
//!
//! This module defines the abstract interfaces that collaborators implement.
//!
//! - [`ConfigSink`]: Persist the rule collection after every mutation

pub mod config_sink;

pub use config_sink::{ConfigSink, RuleSnapshot, SinkFactory};

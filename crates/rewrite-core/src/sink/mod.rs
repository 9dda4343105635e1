// # Config Sink Implementations
//
// This module provides implementations of the ConfigSink trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::{FileSink, FileSinkFactory};
pub use memory::{MemorySink, MemorySinkFactory};

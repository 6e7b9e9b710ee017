//! Persistence sinks and agent definition sources.

mod file;
mod memory;

pub use file::FileAgentSource;
pub use memory::{InMemoryAgentSource, InMemorySink};

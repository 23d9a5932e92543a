//! Bundled port bindings.

pub mod memory;
pub mod snapshot;

pub use memory::MemoryCorpus;
pub use snapshot::CorpusSnapshot;

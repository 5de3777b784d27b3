//! Backing stores for drafts, snapshots and the registry.

mod fs;
mod memory;

pub use fs::FileStore;
pub use memory::MemoryStore;

//! JSON document stores backed by a local file or plain memory.

mod file;
mod in_memory;

pub use file::FileStore;
pub use in_memory::MemoryStore;

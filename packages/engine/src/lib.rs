//! Dotted-key document database engine.
//!
//! `nestdb` addresses JSON documents by dotted keys: the segment before
//! the first dot names a stored record, the rest descends into it
//! (`"user.stats.wins"` reads the record `user`, then `stats`, then
//! `wins`). The engine layers path-addressed operations, arithmetic
//! updates and collection queries over any document store; the companion
//! crates provide file-backed, in-memory and HTTP collection stores.
//!
//! Two engines share one operation set: [`Database`] for synchronous
//! stores and [`AsyncDatabase`] for asynchronous ones.

mod async_engine;
mod engine;
mod locks;
mod math;

pub use async_engine::AsyncDatabase;
pub use engine::Database;
pub use math::MathOp;

pub use nestdb_core::{
    AsyncDocumentStore, DocumentStore, Entry, Error, Key, KeyPath, LogSink, Notification,
    NotificationKind, NotificationSink,
};

/// How [`Database::import`] writes incoming entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportMode {
    /// Write each entry's key verbatim as a root key, without value
    /// validation. Fast path for restoring an export.
    Bulk,
    /// Route each entry through `set`, with full key and value checking.
    Upsert,
}

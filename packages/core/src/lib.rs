//! Core nestdb types.
//!
//! nestdb addresses nested values inside JSON document trees with a single
//! dotted key string (`"user.items.0"`). This crate holds the pieces every
//! backend shares:
//!
//! - [`Key`]: splits a dotted key into a root key and an optional sub-path.
//! - [`value_path`]: get/set/unset/contains over a `serde_json::Value` tree,
//!   keyed by a sub-path.
//! - [`DocumentStore`] / [`AsyncDocumentStore`]: the storage seam. One
//!   document per root key; the engine re-reads before every mutation.
//! - [`Entry`]: the `(key, value)` projection returned to callers.
//! - [`Error`]: the shared error taxonomy.
//! - [`Notification`] / [`NotificationSink`]: the structured event boundary.

pub mod error;
pub mod event;
pub mod key;
pub mod record;
pub mod store;
pub mod value_path;

pub use error::Error;
pub use event::{LogSink, Notification, NotificationKind, NotificationSink};
pub use key::{Key, KeyPath};
pub use record::Entry;
pub use store::{AsyncDocumentStore, DocumentStore};

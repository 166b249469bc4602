//! Remote collection-backed document store.
//!
//! Talks to a record collection over HTTP, one record per root key.

mod collection;
mod error;

pub use collection::{CollectionStore, Latency, RawRecord};
pub use error::Error;

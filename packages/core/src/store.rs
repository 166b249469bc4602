//! The storage seam: `DocumentStore` and its async mirror.
//!
//! One document per root key. The engine owns the in-memory working copy
//! only for the duration of one operation: every operation re-reads
//! through `load` before mutating and writes the whole document back
//! through `save`. Durability belongs exclusively to the store.

use async_trait::async_trait;
use serde_json::Value;

use crate::{Entry, Error};

/// Synchronous document storage, keyed by root key.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn DocumentStore>`.
pub trait DocumentStore: Send {
    /// Load the document for a root key.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - No document exists for this root key.
    /// * `Ok(Some(doc))` - The current document.
    fn load(&mut self, root: &str) -> Result<Option<Value>, Error>;

    /// Persist the document for a root key, replacing any previous value.
    fn save(&mut self, root: &str, doc: Value) -> Result<(), Error>;

    /// Remove the document for a root key. Returns true iff one existed.
    fn remove(&mut self, root: &str) -> Result<bool, Error>;

    /// All `(root key, document)` pairs, optionally truncated to `limit`.
    fn load_all(&mut self, limit: Option<usize>) -> Result<Vec<Entry>, Error>;

    /// Remove every document.
    fn clear(&mut self) -> Result<(), Error>;

    /// Number of documents. Remote backends may return an estimate.
    fn count(&mut self) -> Result<u64, Error>;

    /// Name of this store, used in notifications.
    fn name(&self) -> &str;
}

/// Async document storage with the same semantics as [`DocumentStore`].
///
/// Only backends that actually suspend (network round trips) implement
/// this; the file-backed store stays fully synchronous.
#[async_trait]
pub trait AsyncDocumentStore: Send {
    async fn load(&mut self, root: &str) -> Result<Option<Value>, Error>;

    async fn save(&mut self, root: &str, doc: Value) -> Result<(), Error>;

    async fn remove(&mut self, root: &str) -> Result<bool, Error>;

    async fn load_all(&mut self, limit: Option<usize>) -> Result<Vec<Entry>, Error>;

    async fn clear(&mut self) -> Result<(), Error>;

    async fn count(&mut self) -> Result<u64, Error>;

    fn name(&self) -> &str;
}

// Blanket implementations for boxes, so engines can hold trait objects.

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn load(&mut self, root: &str) -> Result<Option<Value>, Error> {
        self.as_mut().load(root)
    }

    fn save(&mut self, root: &str, doc: Value) -> Result<(), Error> {
        self.as_mut().save(root, doc)
    }

    fn remove(&mut self, root: &str) -> Result<bool, Error> {
        self.as_mut().remove(root)
    }

    fn load_all(&mut self, limit: Option<usize>) -> Result<Vec<Entry>, Error> {
        self.as_mut().load_all(limit)
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.as_mut().clear()
    }

    fn count(&mut self) -> Result<u64, Error> {
        self.as_mut().count()
    }

    fn name(&self) -> &str {
        self.as_ref().name()
    }
}

#[async_trait]
impl<T: AsyncDocumentStore + ?Sized> AsyncDocumentStore for Box<T> {
    async fn load(&mut self, root: &str) -> Result<Option<Value>, Error> {
        self.as_mut().load(root).await
    }

    async fn save(&mut self, root: &str, doc: Value) -> Result<(), Error> {
        self.as_mut().save(root, doc).await
    }

    async fn remove(&mut self, root: &str) -> Result<bool, Error> {
        self.as_mut().remove(root).await
    }

    async fn load_all(&mut self, limit: Option<usize>) -> Result<Vec<Entry>, Error> {
        self.as_mut().load_all(limit).await
    }

    async fn clear(&mut self) -> Result<(), Error> {
        self.as_mut().clear().await
    }

    async fn count(&mut self) -> Result<u64, Error> {
        self.as_mut().count().await
    }

    fn name(&self) -> &str {
        self.as_ref().name()
    }
}

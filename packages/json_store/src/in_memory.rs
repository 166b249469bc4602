//! In-memory document store.
//!
//! Keeps every document in a `BTreeMap` so `load_all` ordering is
//! deterministic. Implements both the sync and async store traits; the
//! async impl never actually suspends, which makes it handy for engine
//! tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use nestdb_core::{AsyncDocumentStore, DocumentStore, Entry, Error};

/// A document store with no persistence at all.
pub struct MemoryStore {
    docs: BTreeMap<String, Value>,
    name: String,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            docs: BTreeMap::new(),
            name: "memory".to_string(),
        }
    }

    /// Seed the store with initial documents.
    pub fn with_documents(docs: BTreeMap<String, Value>) -> Self {
        MemoryStore {
            docs,
            name: "memory".to_string(),
        }
    }

    fn load_entries(&self, limit: Option<usize>) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .docs
            .iter()
            .map(|(key, value)| Entry::new(key.clone(), value.clone()))
            .collect();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&mut self, root: &str) -> Result<Option<Value>, Error> {
        Ok(self.docs.get(root).cloned())
    }

    fn save(&mut self, root: &str, doc: Value) -> Result<(), Error> {
        self.docs.insert(root.to_string(), doc);
        Ok(())
    }

    fn remove(&mut self, root: &str) -> Result<bool, Error> {
        Ok(self.docs.remove(root).is_some())
    }

    fn load_all(&mut self, limit: Option<usize>) -> Result<Vec<Entry>, Error> {
        Ok(self.load_entries(limit))
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.docs.clear();
        Ok(())
    }

    fn count(&mut self) -> Result<u64, Error> {
        Ok(self.docs.len() as u64)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl AsyncDocumentStore for MemoryStore {
    async fn load(&mut self, root: &str) -> Result<Option<Value>, Error> {
        Ok(self.docs.get(root).cloned())
    }

    async fn save(&mut self, root: &str, doc: Value) -> Result<(), Error> {
        self.docs.insert(root.to_string(), doc);
        Ok(())
    }

    async fn remove(&mut self, root: &str) -> Result<bool, Error> {
        Ok(self.docs.remove(root).is_some())
    }

    async fn load_all(&mut self, limit: Option<usize>) -> Result<Vec<Entry>, Error> {
        Ok(self.load_entries(limit))
    }

    async fn clear(&mut self) -> Result<(), Error> {
        self.docs.clear();
        Ok(())
    }

    async fn count(&mut self) -> Result<u64, Error> {
        Ok(self.docs.len() as u64)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

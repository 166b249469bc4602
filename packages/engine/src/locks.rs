//! Per-root-key mutual exclusion.
//!
//! Every engine operation wraps its load-mutate-save sequence in the lock
//! for its root key, so two in-process operations on the same root key can
//! never interleave and lose an update. Operations on different root keys
//! proceed independently. Cross-process writers are not covered; that gap
//! belongs to the store's own consistency model.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Lock table for the synchronous engine.
pub struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        KeyLocks {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// The lock for one root key, created on first use. Lock entries are
    /// kept for the lifetime of the engine; the table grows with the set
    /// of root keys touched, not with operation count.
    pub fn acquire(&self, root: &str) -> Arc<Mutex<()>> {
        let mut table = self.inner.lock().unwrap();
        table
            .entry(root.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock table for the async engine.
pub struct AsyncKeyLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AsyncKeyLocks {
    pub fn new() -> Self {
        AsyncKeyLocks {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn acquire(&self, root: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut table = self.inner.lock().unwrap();
        table
            .entry(root.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

impl Default for AsyncKeyLocks {
    fn default() -> Self {
        Self::new()
    }
}

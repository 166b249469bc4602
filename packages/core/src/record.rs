//! The Entry type - a `(key, value)` projection returned to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A read-only snapshot of one record after an operation.
///
/// An `Entry` is not live: it captures the value at the moment the
/// operation completed and does not reflect later mutations. For bulk
/// projections (`load_all`, export/import) the key is the root key; for
/// single-key operations it is the full dotted key the caller passed in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The key this value was addressed with.
    pub key: String,
    /// The value at that key when the operation completed.
    pub value: Value,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Entry {
            key: key.into(),
            value,
        }
    }
}

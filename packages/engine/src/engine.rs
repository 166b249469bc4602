//! The synchronous record engine.
//!
//! Orchestrates key parsing, document loading, path-addressed mutation and
//! persistence over any [`DocumentStore`]. Every operation is a full
//! read-modify-write: the engine never caches documents across calls, and
//! it wraps each load-mutate-save in the per-root-key lock so concurrent
//! in-process operations on one root key cannot lose updates.

use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};

use rand::seq::SliceRandom;
use serde_json::Value;

use nestdb_core::value_path;
use nestdb_core::{DocumentStore, Entry, Error, Key};

use crate::locks::KeyLocks;
use crate::math::{self, MathOp};
use crate::ImportMode;

/// Reject values the engine refuses to store: the absent sentinel.
///
/// Non-finite numbers cannot be represented in a JSON value at all, so the
/// null check is the whole boundary here; math operands are checked for
/// finiteness separately.
pub(crate) fn ensure_value(value: &Value) -> Result<(), Error> {
    if value.is_null() {
        return Err(Error::InvalidValue {
            message: "value must not be null".to_string(),
        });
    }
    Ok(())
}

/// Resolve a parsed key inside a loaded document.
pub(crate) fn resolve<'a>(doc: &'a Value, key: &Key) -> Result<Option<&'a Value>, Error> {
    match &key.sub {
        Some(sub) if !sub.is_empty() => value_path::get_path(doc, sub),
        _ => Ok(Some(doc)),
    }
}

/// Place `value` at the parsed key within `doc`, creating the document
/// (and intermediate objects) as needed. A key without a sub-path replaces
/// the whole document slot.
pub(crate) fn write_at(doc: Option<Value>, key: &Key, value: Value) -> Result<Value, Error> {
    match &key.sub {
        Some(sub) if !sub.is_empty() => {
            let mut doc = doc.unwrap_or(Value::Null);
            value_path::set_path(&mut doc, sub, value)?;
            Ok(doc)
        }
        _ => Ok(value),
    }
}

/// Combine an absent-or-array current value with a pushed value.
pub(crate) fn push_into(current: Option<Value>, key: &str, value: Value) -> Result<Vec<Value>, Error> {
    match current {
        None | Some(Value::Null) => Ok(match value {
            Value::Array(items) => items,
            single => vec![single],
        }),
        Some(Value::Array(mut items)) => {
            match value {
                Value::Array(mut more) => items.append(&mut more),
                single => items.push(single),
            }
            Ok(items)
        }
        Some(other) => Err(Error::target_type(format!(
            "cannot push into {} at '{}'",
            value_path::type_tag(&other),
            key
        ))),
    }
}

/// A dotted-key database over a synchronous document store.
///
/// # Example
///
/// ```rust,ignore
/// use nestdb::Database;
/// use nestdb_json_store::FileStore;
/// use serde_json::json;
///
/// let db = Database::new(FileStore::new("my-db")?);
/// db.set("user.age", json!(16))?;
/// assert_eq!(db.get("user")?, Some(json!({ "age": 16 })));
/// ```
pub struct Database<S: DocumentStore> {
    store: Mutex<S>,
    locks: KeyLocks,
}

impl<S: DocumentStore> Database<S> {
    pub fn new(store: S) -> Self {
        Database {
            store: Mutex::new(store),
            locks: KeyLocks::new(),
        }
    }

    /// Name of the underlying store.
    pub fn store_name(&self) -> String {
        self.store().name().to_string()
    }

    fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap()
    }

    /// Set a value at a dotted key, creating the document and any missing
    /// intermediate objects.
    pub fn set(&self, key: &str, value: Value) -> Result<Entry, Error> {
        let parsed = Key::parse(key)?;
        ensure_value(&value)?;

        let lock = self.locks.acquire(&parsed.root);
        let _guard = lock.lock().unwrap();

        let doc = self.store().load(&parsed.root)?;
        let new_doc = write_at(doc, &parsed, value.clone())?;
        self.store().save(&parsed.root, new_doc)?;

        Ok(Entry::new(parsed.dotted(), value))
    }

    /// Get the value at a dotted key. An unresolved key is `None`, not an
    /// error; use [`Database::get_required`] for the erroring flavor.
    pub fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let parsed = Key::parse(key)?;
        match self.store().load(&parsed.root)? {
            None => Ok(None),
            Some(doc) => Ok(resolve(&doc, &parsed)?.cloned()),
        }
    }

    /// Like [`Database::get`], but an unresolved key is `Error::NotFound`.
    pub fn get_required(&self, key: &str) -> Result<Value, Error> {
        self.get(key)?.ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })
    }

    /// Alias of [`Database::get`].
    pub fn fetch(&self, key: &str) -> Result<Option<Value>, Error> {
        self.get(key)
    }

    /// Whether the key resolves to a value. Descending through a scalar
    /// counts as unresolved, never an error.
    pub fn exists(&self, key: &str) -> Result<bool, Error> {
        let parsed = Key::parse(key)?;
        match self.store().load(&parsed.root)? {
            None => Ok(false),
            Some(doc) => Ok(match &parsed.sub {
                Some(sub) if !sub.is_empty() => value_path::contains_path(&doc, sub),
                _ => true,
            }),
        }
    }

    /// Alias of [`Database::exists`].
    pub fn has(&self, key: &str) -> Result<bool, Error> {
        self.exists(key)
    }

    /// Delete the value at a dotted key.
    ///
    /// With a sub-path this unsets within the document and reports whether
    /// anything changed; without one it removes the whole root record.
    /// Deleting twice is safe: the second call returns false.
    pub fn delete(&self, key: &str) -> Result<bool, Error> {
        let parsed = Key::parse(key)?;
        match &parsed.sub {
            Some(sub) if !sub.is_empty() => {
                let lock = self.locks.acquire(&parsed.root);
                let _guard = lock.lock().unwrap();

                let Some(mut doc) = self.store().load(&parsed.root)? else {
                    return Ok(false);
                };
                let changed = value_path::unset_path(&mut doc, sub);
                if changed {
                    self.store().save(&parsed.root, doc)?;
                }
                Ok(changed)
            }
            _ => self.store().remove(&parsed.root),
        }
    }

    /// Delete every record in the store.
    pub fn delete_all(&self) -> Result<(), Error> {
        self.store().clear()
    }

    /// Append to the array at a dotted key.
    ///
    /// An absent value becomes a fresh array; pushing an array onto an
    /// array concatenates; anything else in the slot is a target type
    /// error.
    pub fn push(&self, key: &str, value: Value) -> Result<Entry, Error> {
        let parsed = Key::parse(key)?;
        ensure_value(&value)?;

        let lock = self.locks.acquire(&parsed.root);
        let _guard = lock.lock().unwrap();

        let doc = self.store().load(&parsed.root)?;
        let current = match &doc {
            Some(doc) => resolve(doc, &parsed)?.cloned(),
            None => None,
        };
        let items = push_into(current, key, value)?;

        let result = Value::Array(items);
        let new_doc = write_at(doc, &parsed, result.clone())?;
        self.store().save(&parsed.root, new_doc)?;

        Ok(Entry::new(parsed.dotted(), result))
    }

    /// Remove element(s) structurally equal to `target` from the array at
    /// a dotted key. `multiple` removes every match instead of just the
    /// first. An absent value is `NotFound`; a non-array is a target type
    /// error; no match is a no-op.
    pub fn pull(&self, key: &str, target: &Value, multiple: bool) -> Result<Entry, Error> {
        let parsed = Key::parse(key)?;
        ensure_value(target)?;

        let lock = self.locks.acquire(&parsed.root);
        let _guard = lock.lock().unwrap();

        let doc = self.store().load(&parsed.root)?;
        let current = match &doc {
            Some(doc) => resolve(doc, &parsed)?.cloned(),
            None => None,
        };
        let Some(current) = current else {
            return Err(Error::NotFound {
                key: key.to_string(),
            });
        };
        let Value::Array(mut items) = current else {
            return Err(Error::target_type(format!(
                "cannot pull from {} at '{}'",
                value_path::type_tag(&current),
                key
            )));
        };

        let before = items.len();
        if multiple {
            items.retain(|item| item != target);
        } else if let Some(position) = items.iter().position(|item| item == target) {
            items.remove(position);
        }

        let result = Value::Array(items);
        if result.as_array().map(Vec::len) != Some(before) {
            let new_doc = write_at(doc, &parsed, result.clone())?;
            self.store().save(&parsed.root, new_doc)?;
        }
        Ok(Entry::new(parsed.dotted(), result))
    }

    /// Apply an arithmetic operator to the number at a dotted key.
    ///
    /// An absent current value coerces to 0. The operand and the result
    /// must both be finite.
    pub fn math(&self, key: &str, operator: &str, operand: f64) -> Result<Entry, Error> {
        let parsed = Key::parse(key)?;
        let op = MathOp::parse(operator)?;
        if !operand.is_finite() {
            return Err(Error::InvalidValue {
                message: format!("math operand must be finite, got {}", operand),
            });
        }

        let lock = self.locks.acquire(&parsed.root);
        let _guard = lock.lock().unwrap();

        let doc = self.store().load(&parsed.root)?;
        let current = match &doc {
            Some(doc) => resolve(doc, &parsed)?.cloned(),
            None => None,
        };
        let current_num = math::coerce_numeric(current.as_ref(), key)?;
        let number = math::to_number(op.apply(current_num, operand)?);

        let new_doc = write_at(doc, &parsed, number.clone())?;
        self.store().save(&parsed.root, new_doc)?;

        Ok(Entry::new(parsed.dotted(), number))
    }

    /// `math(key, "+", operand)`.
    pub fn add(&self, key: &str, operand: f64) -> Result<Entry, Error> {
        self.math(key, "+", operand)
    }

    /// `math(key, "-", operand)`.
    pub fn subtract(&self, key: &str, operand: f64) -> Result<Entry, Error> {
        self.math(key, "-", operand)
    }

    /// The dynamic type tag of the value at a dotted key, with arrays
    /// tagged distinctly from objects. `None` when the key is unresolved.
    pub fn value_type(&self, key: &str) -> Result<Option<&'static str>, Error> {
        Ok(self.get(key)?.as_ref().map(value_path::type_tag))
    }

    /// All `(root key, document)` entries, optionally truncated.
    pub fn all(&self, limit: Option<usize>) -> Result<Vec<Entry>, Error> {
        self.store().load_all(limit)
    }

    /// All root keys.
    pub fn key_array(&self) -> Result<Vec<String>, Error> {
        Ok(self.all(None)?.into_iter().map(|e| e.key).collect())
    }

    /// All root documents.
    pub fn value_array(&self) -> Result<Vec<Value>, Error> {
        Ok(self.all(None)?.into_iter().map(|e| e.value).collect())
    }

    /// Entries satisfying the predicate.
    pub fn filter(&self, predicate: impl FnMut(&Entry) -> bool) -> Result<Vec<Entry>, Error> {
        let mut predicate = predicate;
        Ok(self.all(None)?.into_iter().filter(|e| predicate(e)).collect())
    }

    /// Entries ordered by the comparator.
    pub fn sort_by(
        &self,
        comparator: impl FnMut(&Entry, &Entry) -> Ordering,
    ) -> Result<Vec<Entry>, Error> {
        let mut entries = self.all(None)?;
        entries.sort_by(comparator);
        Ok(entries)
    }

    /// Entries whose root key contains the fragment.
    pub fn includes(&self, fragment: &str) -> Result<Vec<Entry>, Error> {
        if fragment.is_empty() {
            return Err(Error::InvalidArgument {
                message: "search fragment must not be empty".to_string(),
            });
        }
        self.filter(|e| e.key.contains(fragment))
    }

    /// Entries whose root key starts with the prefix.
    pub fn starts_with(&self, prefix: &str) -> Result<Vec<Entry>, Error> {
        if prefix.is_empty() {
            return Err(Error::InvalidArgument {
                message: "search prefix must not be empty".to_string(),
            });
        }
        self.filter(|e| e.key.starts_with(prefix))
    }

    /// `n` entries chosen without replacement from a shuffled snapshot.
    pub fn random(&self, n: usize) -> Result<Vec<Entry>, Error> {
        let mut entries = self.all(None)?;
        if n > entries.len() {
            return Err(Error::Range {
                requested: n,
                available: entries.len(),
            });
        }
        entries.shuffle(&mut rand::thread_rng());
        entries.truncate(n);
        Ok(entries)
    }

    /// Number of records; remote stores may estimate.
    pub fn count(&self) -> Result<u64, Error> {
        self.store().count()
    }

    /// Snapshot of every record, suitable for external serialization.
    pub fn export(&self) -> Result<Vec<Entry>, Error> {
        self.all(None)
    }

    /// Import `(root key, value)` entries.
    ///
    /// `Bulk` writes each entry's key verbatim as a root key, assuming
    /// uniqueness and skipping value validation; `Upsert` routes every
    /// entry through [`Database::set`] in order, with full key/value
    /// checking and locking. Returns the number of entries written.
    pub fn import(&self, entries: Vec<Entry>, mode: ImportMode) -> Result<usize, Error> {
        match mode {
            ImportMode::Bulk => {
                let count = entries.len();
                let mut store = self.store();
                for entry in entries {
                    store.save(&entry.key, entry.value)?;
                }
                Ok(count)
            }
            ImportMode::Upsert => {
                let mut written = 0;
                for entry in entries {
                    self.set(&entry.key, entry.value)?;
                    written += 1;
                }
                Ok(written)
            }
        }
    }
}

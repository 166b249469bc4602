//! The asynchronous record engine.
//!
//! Same operation set and semantics as the synchronous engine, expressed
//! over [`AsyncDocumentStore`] backends such as the HTTP collection store.

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};

use nestdb_core::value_path;
use nestdb_core::{AsyncDocumentStore, Entry, Error, Key};

use crate::engine::{ensure_value, push_into, resolve, write_at};
use crate::locks::AsyncKeyLocks;
use crate::math::{self, MathOp};
use crate::ImportMode;

/// A dotted-key database over an asynchronous document store.
pub struct AsyncDatabase<S: AsyncDocumentStore> {
    store: Mutex<S>,
    locks: AsyncKeyLocks,
}

impl<S: AsyncDocumentStore> AsyncDatabase<S> {
    pub fn new(store: S) -> Self {
        AsyncDatabase {
            store: Mutex::new(store),
            locks: AsyncKeyLocks::new(),
        }
    }

    /// Name of the underlying store.
    pub async fn store_name(&self) -> String {
        self.store().await.name().to_string()
    }

    async fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().await
    }

    /// Set a value at a dotted key.
    pub async fn set(&self, key: &str, value: Value) -> Result<Entry, Error> {
        let parsed = Key::parse(key)?;
        ensure_value(&value)?;

        let lock = self.locks.acquire(&parsed.root);
        let _guard = lock.lock().await;

        let doc = self.store().await.load(&parsed.root).await?;
        let new_doc = write_at(doc, &parsed, value.clone())?;
        self.store().await.save(&parsed.root, new_doc).await?;

        Ok(Entry::new(parsed.dotted(), value))
    }

    /// Get the value at a dotted key. An unresolved key is `None`.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let parsed = Key::parse(key)?;
        match self.store().await.load(&parsed.root).await? {
            None => Ok(None),
            Some(doc) => Ok(resolve(&doc, &parsed)?.cloned()),
        }
    }

    /// Like [`AsyncDatabase::get`], but an unresolved key is `Error::NotFound`.
    pub async fn get_required(&self, key: &str) -> Result<Value, Error> {
        self.get(key).await?.ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })
    }

    /// Alias of [`AsyncDatabase::get`].
    pub async fn fetch(&self, key: &str) -> Result<Option<Value>, Error> {
        self.get(key).await
    }

    /// Whether the key resolves to a value.
    pub async fn exists(&self, key: &str) -> Result<bool, Error> {
        let parsed = Key::parse(key)?;
        match self.store().await.load(&parsed.root).await? {
            None => Ok(false),
            Some(doc) => Ok(match &parsed.sub {
                Some(sub) if !sub.is_empty() => value_path::contains_path(&doc, sub),
                _ => true,
            }),
        }
    }

    /// Alias of [`AsyncDatabase::exists`].
    pub async fn has(&self, key: &str) -> Result<bool, Error> {
        self.exists(key).await
    }

    /// Delete the value at a dotted key; see the sync engine for semantics.
    pub async fn delete(&self, key: &str) -> Result<bool, Error> {
        let parsed = Key::parse(key)?;
        match &parsed.sub {
            Some(sub) if !sub.is_empty() => {
                let lock = self.locks.acquire(&parsed.root);
                let _guard = lock.lock().await;

                let Some(mut doc) = self.store().await.load(&parsed.root).await? else {
                    return Ok(false);
                };
                let changed = value_path::unset_path(&mut doc, sub);
                if changed {
                    self.store().await.save(&parsed.root, doc).await?;
                }
                Ok(changed)
            }
            _ => self.store().await.remove(&parsed.root).await,
        }
    }

    /// Delete every record in the store.
    pub async fn delete_all(&self) -> Result<(), Error> {
        self.store().await.clear().await
    }

    /// Append to the array at a dotted key.
    pub async fn push(&self, key: &str, value: Value) -> Result<Entry, Error> {
        let parsed = Key::parse(key)?;
        ensure_value(&value)?;

        let lock = self.locks.acquire(&parsed.root);
        let _guard = lock.lock().await;

        let doc = self.store().await.load(&parsed.root).await?;
        let current = match &doc {
            Some(doc) => resolve(doc, &parsed)?.cloned(),
            None => None,
        };
        let items = push_into(current, key, value)?;

        let result = Value::Array(items);
        let new_doc = write_at(doc, &parsed, result.clone())?;
        self.store().await.save(&parsed.root, new_doc).await?;

        Ok(Entry::new(parsed.dotted(), result))
    }

    /// Remove element(s) structurally equal to `target` from the array at
    /// a dotted key.
    pub async fn pull(&self, key: &str, target: &Value, multiple: bool) -> Result<Entry, Error> {
        let parsed = Key::parse(key)?;
        ensure_value(target)?;

        let lock = self.locks.acquire(&parsed.root);
        let _guard = lock.lock().await;

        let doc = self.store().await.load(&parsed.root).await?;
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
            self.store().await.save(&parsed.root, new_doc).await?;
        }
        Ok(Entry::new(parsed.dotted(), result))
    }

    /// Apply an arithmetic operator to the number at a dotted key.
    pub async fn math(&self, key: &str, operator: &str, operand: f64) -> Result<Entry, Error> {
        let parsed = Key::parse(key)?;
        let op = MathOp::parse(operator)?;
        if !operand.is_finite() {
            return Err(Error::InvalidValue {
                message: format!("math operand must be finite, got {}", operand),
            });
        }

        let lock = self.locks.acquire(&parsed.root);
        let _guard = lock.lock().await;

        let doc = self.store().await.load(&parsed.root).await?;
        let current = match &doc {
            Some(doc) => resolve(doc, &parsed)?.cloned(),
            None => None,
        };
        let current_num = math::coerce_numeric(current.as_ref(), key)?;
        let number = math::to_number(op.apply(current_num, operand)?);

        let new_doc = write_at(doc, &parsed, number.clone())?;
        self.store().await.save(&parsed.root, new_doc).await?;

        Ok(Entry::new(parsed.dotted(), number))
    }

    /// `math(key, "+", operand)`.
    pub async fn add(&self, key: &str, operand: f64) -> Result<Entry, Error> {
        self.math(key, "+", operand).await
    }

    /// `math(key, "-", operand)`.
    pub async fn subtract(&self, key: &str, operand: f64) -> Result<Entry, Error> {
        self.math(key, "-", operand).await
    }

    /// The dynamic type tag of the value at a dotted key.
    pub async fn value_type(&self, key: &str) -> Result<Option<&'static str>, Error> {
        Ok(self.get(key).await?.as_ref().map(value_path::type_tag))
    }

    /// All `(root key, document)` entries, optionally truncated.
    pub async fn all(&self, limit: Option<usize>) -> Result<Vec<Entry>, Error> {
        self.store().await.load_all(limit).await
    }

    /// All root keys.
    pub async fn key_array(&self) -> Result<Vec<String>, Error> {
        Ok(self.all(None).await?.into_iter().map(|e| e.key).collect())
    }

    /// All root documents.
    pub async fn value_array(&self) -> Result<Vec<Value>, Error> {
        Ok(self
            .all(None)
            .await?
            .into_iter()
            .map(|e| e.value)
            .collect())
    }

    /// Entries satisfying the predicate.
    pub async fn filter(
        &self,
        predicate: impl FnMut(&Entry) -> bool,
    ) -> Result<Vec<Entry>, Error> {
        let mut predicate = predicate;
        Ok(self
            .all(None)
            .await?
            .into_iter()
            .filter(|e| predicate(e))
            .collect())
    }

    /// Entries ordered by the comparator.
    pub async fn sort_by(
        &self,
        comparator: impl FnMut(&Entry, &Entry) -> Ordering,
    ) -> Result<Vec<Entry>, Error> {
        let mut entries = self.all(None).await?;
        entries.sort_by(comparator);
        Ok(entries)
    }

    /// Entries whose root key contains the fragment.
    pub async fn includes(&self, fragment: &str) -> Result<Vec<Entry>, Error> {
        if fragment.is_empty() {
            return Err(Error::InvalidArgument {
                message: "search fragment must not be empty".to_string(),
            });
        }
        self.filter(|e| e.key.contains(fragment)).await
    }

    /// Entries whose root key starts with the prefix.
    pub async fn starts_with(&self, prefix: &str) -> Result<Vec<Entry>, Error> {
        if prefix.is_empty() {
            return Err(Error::InvalidArgument {
                message: "search prefix must not be empty".to_string(),
            });
        }
        self.filter(|e| e.key.starts_with(prefix)).await
    }

    /// `n` entries chosen without replacement from a shuffled snapshot.
    pub async fn random(&self, n: usize) -> Result<Vec<Entry>, Error> {
        let mut entries = self.all(None).await?;
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
    pub async fn count(&self) -> Result<u64, Error> {
        self.store().await.count().await
    }

    /// Snapshot of every record.
    pub async fn export(&self) -> Result<Vec<Entry>, Error> {
        self.all(None).await
    }

    /// Import `(root key, value)` entries; see the sync engine for the
    /// mode semantics.
    pub async fn import(&self, entries: Vec<Entry>, mode: ImportMode) -> Result<usize, Error> {
        match mode {
            ImportMode::Bulk => {
                let count = entries.len();
                let mut store = self.store().await;
                for entry in entries {
                    store.save(&entry.key, entry.value).await?;
                }
                Ok(count)
            }
            ImportMode::Upsert => {
                let mut written = 0;
                for entry in entries {
                    self.set(&entry.key, entry.value).await?;
                    written += 1;
                }
                Ok(written)
            }
        }
    }
}

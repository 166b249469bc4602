//! File-backed document store.
//!
//! The entire keyspace lives in one on-disk JSON object: top-level
//! properties are root keys, property values are documents. Every `load`
//! reads the whole file and every `save` rewrites it, so write atomicity
//! is bounded by whole-file replacement. A crash mid-write can corrupt the
//! file; callers needing stronger guarantees should snapshot via
//! `load_all` externally.

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde_json::{Map, Value};

use nestdb_core::{
    DocumentStore, Entry, Error, LogSink, Notification, NotificationKind, NotificationSink,
};

/// A document store persisted as one JSON file.
pub struct FileStore {
    path: PathBuf,
    name: String,
    sink: Box<dyn NotificationSink>,
}

impl FileStore {
    /// Open (or create) a store by logical name, rooted under the current
    /// working directory. A `.json` suffix is appended when missing and
    /// parent directories are created; a missing file is initialized to
    /// `{}`.
    pub fn new(name: &str) -> Result<Self, Error> {
        let cwd = env::current_dir()?;
        Self::with_root(&cwd, name)
    }

    /// Open (or create) a store by logical name under an explicit base
    /// directory.
    pub fn with_root(root: &Path, name: &str) -> Result<Self, Error> {
        if name.is_empty() {
            return Err(Error::InvalidArgument {
                message: "store name must not be empty".to_string(),
            });
        }

        let mut file_name = name.trim_start_matches("./").trim_start_matches('/').to_string();
        if !file_name.ends_with(".json") {
            file_name.push_str(".json");
        }

        let path = root.join(file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            fs::write(&path, "{}")?;
        }

        let store = FileStore {
            path,
            name: name.strip_suffix(".json").unwrap_or(name).to_string(),
            sink: Box::new(LogSink),
        };
        store.notify(NotificationKind::Ready, "file store is ready");
        Ok(store)
    }

    /// Replace the notification sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The on-disk location of this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the backing file. The store must not be used afterwards.
    pub fn destroy(self) -> Result<(), Error> {
        self.notify(NotificationKind::Debug, "destroying backing file");
        fs::remove_file(&self.path)?;
        Ok(())
    }

    fn notify(&self, kind: NotificationKind, message: &str) {
        self.sink.notify(Notification::new(kind, message, &*self.name));
    }

    fn read_document(&self) -> Result<Map<String, Value>, Error> {
        log::debug!("reading {}", self.path.display());
        let text = fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&text)?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(Error::Store {
                message: format!(
                    "backing file {} holds a {} instead of an object",
                    self.path.display(),
                    nestdb_core::value_path::type_tag(&other)
                ),
            }),
        }
    }

    fn write_document(&self, map: &Map<String, Value>) -> Result<(), Error> {
        log::debug!("rewriting {}", self.path.display());
        let text = serde_json::to_string(&Value::Object(map.clone()))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl DocumentStore for FileStore {
    fn load(&mut self, root: &str) -> Result<Option<Value>, Error> {
        Ok(self.read_document()?.get(root).cloned())
    }

    fn save(&mut self, root: &str, doc: Value) -> Result<(), Error> {
        let mut map = self.read_document()?;
        map.insert(root.to_string(), doc);
        self.write_document(&map)
    }

    fn remove(&mut self, root: &str) -> Result<bool, Error> {
        let mut map = self.read_document()?;
        let existed = map.remove(root).is_some();
        if existed {
            self.write_document(&map)?;
        }
        Ok(existed)
    }

    fn load_all(&mut self, limit: Option<usize>) -> Result<Vec<Entry>, Error> {
        let map = self.read_document()?;
        let mut entries: Vec<Entry> = map
            .into_iter()
            .map(|(key, value)| Entry::new(key, value))
            .collect();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.notify(NotificationKind::Debug, "deleting every document");
        self.write_document(&Map::new())
    }

    fn count(&mut self) -> Result<u64, Error> {
        Ok(self.read_document()?.len() as u64)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

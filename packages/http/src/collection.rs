//! Collection store over HTTP.
//!
//! Each root key is one record in a remote collection:
//! `{ "id": string (unique), "data": any }`.
//!
//! ## Protocol
//!
//! - `load(root)` → `GET /collections/{name}/records/{root}` (404 → absent)
//! - `save(root, doc)` → `PUT /collections/{name}/records/{root}` (upsert)
//! - `remove(root)` → `DELETE /collections/{name}/records/{root}`
//! - `load_all(limit)` → `GET /collections/{name}/records?limit={n}`
//! - `clear()` → `DELETE /collections/{name}/records`
//! - `count()` → `GET /collections/{name}/count` (estimated)
//!
//! Record ids are percent-encoded into the URL path, so a root key is
//! always one path segment no matter what it contains. The count endpoint
//! lives outside the record namespace, so a record named `count` is
//! addressable like any other.
//!
//! Mutation happens entirely in the engine's memory before `save`, so a
//! save is always a full-field overwrite of `data`. Two writers racing on
//! the same root key from different processes can still lose an update at
//! this boundary; the in-process engine lock only closes the gap for one
//! process. No retries are performed; a failed round trip surfaces to the
//! caller.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use nestdb_core::{
    AsyncDocumentStore, Entry, Error as CoreError, LogSink, Notification, NotificationKind,
    NotificationSink,
};

use crate::Error;

/// The wire shape of one remote record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub data: Value,
}

/// Read/write round-trip latency in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Latency {
    pub read_ms: u128,
    pub write_ms: u128,
    pub average_ms: u128,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

/// Root key used by `ping` probes. Cleaned up after each probe.
const PING_KEY: &str = "__nestdb_latency__";

/// A document store backed by a remote record collection.
pub struct CollectionStore {
    client: Client,
    records_url: Url,
    name: String,
    sink: Box<dyn NotificationSink>,
}

impl CollectionStore {
    /// Connect to `base_url` and address the named collection.
    ///
    /// The base URL is the server root, e.g. `http://localhost:8080`.
    /// Connection lifecycle beyond building the client (reconnects,
    /// timeouts) is the transport's concern, not this store's.
    pub fn new(base_url: &str, collection: &str) -> Result<Self, Error> {
        if collection.is_empty() {
            return Err(Error::InvalidUrl {
                message: "collection name must not be empty".to_string(),
            });
        }

        let base_url = Url::parse(base_url)?;
        let records_url = base_url
            .join(&format!("collections/{}/records/", collection))
            .map_err(|e| Error::InvalidUrl {
                message: e.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;

        let store = CollectionStore {
            client,
            records_url,
            name: collection.to_string(),
            sink: Box::new(LogSink),
        };
        store.notify(NotificationKind::Ready, "collection store is ready");
        Ok(store)
    }

    /// Replace the notification sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Measure read and write latency with a probe record, then delete it.
    ///
    /// The cleanup delete is secondary: its failure is reported through
    /// the notification sink, never raised.
    pub async fn ping(&mut self) -> Result<Latency, CoreError> {
        let write_started = Instant::now();
        self.save(PING_KEY, Value::from(write_started.elapsed().as_millis() as u64))
            .await?;
        let write_ms = write_started.elapsed().as_millis();

        let read_started = Instant::now();
        self.load(PING_KEY).await?;
        let read_ms = read_started.elapsed().as_millis();

        if let Err(e) = self.remove(PING_KEY).await {
            self.notify(
                NotificationKind::Error,
                &format!("failed to clean up latency probe: {}", e),
            );
        }

        Ok(Latency {
            read_ms,
            write_ms,
            average_ms: (read_ms + write_ms) / 2,
        })
    }

    fn notify(&self, kind: NotificationKind, message: &str) {
        self.sink
            .notify(Notification::new(kind, message, &*self.name));
    }

    fn record_url(&self, root: &str) -> Result<Url, Error> {
        // Dot segments would be resolved by the server against the path
        // itself; they can never name a record.
        if root.is_empty() || root == "." || root == ".." {
            return Err(Error::InvalidUrl {
                message: format!("'{}' cannot address a record", root),
            });
        }

        let mut url = self.records_root_url();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl {
                message: "URL cannot hold path segments".to_string(),
            })?
            .push(root);
        Ok(url)
    }

    /// The collection-level count endpoint, outside the record namespace.
    fn count_url(&self) -> Result<Url, Error> {
        self.records_url
            .join("../count")
            .map_err(|e| Error::InvalidUrl {
                message: e.to_string(),
            })
    }

    /// The records endpoint without a trailing record id.
    fn records_root_url(&self) -> Url {
        let mut url = self.records_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
        }
        url
    }

    fn ensure_success(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }
}

/// Lift a transport failure into the shared error taxonomy.
fn transport(e: reqwest::Error) -> CoreError {
    Error::from(e).into()
}

#[async_trait]
impl AsyncDocumentStore for CollectionStore {
    async fn load(&mut self, root: &str) -> Result<Option<Value>, CoreError> {
        let url = self.record_url(root)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::ensure_success(response)?;

        let record: RawRecord = response
            .json()
            .await
            .map_err(transport)?;
        Ok(Some(record.data))
    }

    async fn save(&mut self, root: &str, doc: Value) -> Result<(), CoreError> {
        let url = self.record_url(root)?;
        let record = RawRecord {
            id: root.to_string(),
            data: doc,
        };

        let response = self
            .client
            .put(url)
            .json(&record)
            .send()
            .await
            .map_err(transport)?;
        Self::ensure_success(response)?;
        Ok(())
    }

    async fn remove(&mut self, root: &str) -> Result<bool, CoreError> {
        let url = self.record_url(root)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::ensure_success(response)?;
        Ok(true)
    }

    async fn load_all(&mut self, limit: Option<usize>) -> Result<Vec<Entry>, CoreError> {
        let mut url = self.records_root_url();
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport)?;
        let response = Self::ensure_success(response)?;

        let records: Vec<RawRecord> = response
            .json()
            .await
            .map_err(transport)?;
        Ok(records
            .into_iter()
            .map(|record| Entry::new(record.id, record.data))
            .collect())
    }

    async fn clear(&mut self) -> Result<(), CoreError> {
        self.notify(NotificationKind::Debug, "deleting every record");
        let response = self
            .client
            .delete(self.records_root_url())
            .send()
            .await
            .map_err(transport)?;
        Self::ensure_success(response)?;
        Ok(())
    }

    async fn count(&mut self) -> Result<u64, CoreError> {
        let url = self.count_url()?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport)?;
        let response = Self::ensure_success(response)?;

        let body: CountResponse = response
            .json()
            .await
            .map_err(transport)?;
        Ok(body.count)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

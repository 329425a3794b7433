//! In-process document collection backed by `DashMap`.
//!
//! `MemoryCollection` stands in for a database collection with a TTL index:
//! a background reaper removes expired records on a fixed interval, while
//! reads may still observe expired records between passes.
//! `MemoryConnection` plays the role of the database connection that
//! registers and generates named collections.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};
use tokio::sync::watch;

use crate::collection::{CollectionFactory, DocumentCollection};
use crate::config::ModelOptions;
use crate::error::{BackendError, StoreError};
use crate::record::{Record, RecordFields};

/// Internal shared state for a collection
struct CollectionInner {
    name: String,
    data: DashMap<String, Record>,
    /// Sender to signal shutdown to the reaper task
    shutdown_tx: watch::Sender<bool>,
}

/// Concurrent in-memory collection of records
///
/// Reads never block other reads, and writes only block access to the
/// specific id being written. Clones share the same records.
#[derive(Clone)]
pub struct MemoryCollection {
    inner: Arc<CollectionInner>,
}

impl MemoryCollection {
    /// Creates a collection without background expiry.
    ///
    /// Expired records stay until removed through the collection API or
    /// [`purge_expired`](Self::purge_expired).
    pub fn new(name: impl Into<String>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(CollectionInner {
                name: name.into(),
                data: DashMap::new(),
                shutdown_tx,
            }),
        }
    }

    /// Creates a collection whose reaper removes expired records every `interval`.
    ///
    /// The reaper runs on the current Tokio runtime; calling this outside a
    /// runtime is a configuration error.
    pub fn with_reaper(name: impl Into<String>, interval: Duration) -> Result<Self, StoreError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            StoreError::configuration(
                "a background-expiring collection requires a Tokio runtime; \
                 create it from within a #[tokio::main] or #[tokio::test] context",
            )
        })?;
        if interval.is_zero() {
            return Err(StoreError::configuration("reap interval must be greater than zero"));
        }

        let collection = Self::new(name);
        let shutdown_rx = collection.inner.shutdown_tx.subscribe();
        handle.spawn(Self::reaper_task(
            Arc::downgrade(&collection.inner),
            interval,
            shutdown_rx,
        ));

        Ok(collection)
    }

    /// Background task that periodically removes expired records.
    ///
    /// Holds only a weak reference so dropping the last collection handle
    /// ends the task.
    async fn reaper_task(
        inner: Weak<CollectionInner>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(strong) = inner.upgrade() else {
                        break;
                    };
                    let removed = Self::purge_internal(&strong);
                    if removed > 0 {
                        tracing::debug!(collection = %strong.name, removed, "reaped expired records");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    }

    fn purge_internal(inner: &CollectionInner) -> usize {
        let now = SystemTime::now();
        let before = inner.data.len();
        inner.data.retain(|_, record| !record.is_expired_at(now));
        before.saturating_sub(inner.data.len())
    }

    /// Runs one expiry pass immediately, returning the approximate number
    /// of records removed.
    pub fn purge_expired(&self) -> usize {
        Self::purge_internal(&self.inner)
    }

    /// Number of physically stored records, including expired ones
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }

    /// Stops the reaper task, if any.
    pub fn shutdown(&self) {
        let _ = self.inner.shutdown_tx.send(true);
    }
}

impl Drop for CollectionInner {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn find_one(&self, id: &str) -> Result<Option<Record>, BackendError> {
        Ok(self.inner.data.get(id).map(|record| record.value().clone()))
    }

    async fn upsert(&self, id: &str, fields: RecordFields) -> Result<(), BackendError> {
        self.inner
            .data
            .insert(id.to_string(), Record::from_fields(id, fields));
        Ok(())
    }

    async fn delete_one(&self, id: &str) -> Result<(), BackendError> {
        self.inner.data.remove(id);
        Ok(())
    }

    async fn delete_expired(&self, id: &str) -> Result<(), BackendError> {
        // remove_if keeps a record rewritten since the caller's read
        self.inner.data.remove_if(id, |_, record| record.is_expired());
        Ok(())
    }

    async fn delete_many(&self) -> Result<(), BackendError> {
        self.inner.data.clear();
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Record>, BackendError> {
        Ok(self
            .inner
            .data
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}

/// Registry of named collections, able to generate new ones
#[derive(Clone, Default)]
pub struct MemoryConnection {
    models: Arc<DashMap<String, Arc<dyn DocumentCollection>>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `collection` under a model name, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, collection: Arc<dyn DocumentCollection>) {
        self.models.insert(name.into(), collection);
    }

    /// Returns `true` if a model is registered under `name`
    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }
}

impl CollectionFactory for MemoryConnection {
    fn model(&self, name: &str) -> Result<Arc<dyn DocumentCollection>, StoreError> {
        self.models
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                StoreError::configuration(format!("schema hasn't been registered for model '{}'", name))
            })
    }

    fn create_model(&self, options: &ModelOptions) -> Result<Arc<dyn DocumentCollection>, StoreError> {
        if let Some(existing) = self.models.get(&options.model_name) {
            return Ok(Arc::clone(existing.value()));
        }

        let collection: Arc<dyn DocumentCollection> = Arc::new(MemoryCollection::with_reaper(
            options.collection.clone(),
            options.reap_interval,
        )?);

        // entry() keeps a concurrent create_model for the same name from
        // registering a second collection
        let registered = self
            .models
            .entry(options.model_name.clone())
            .or_insert(collection)
            .value()
            .clone();

        tracing::info!(
            model = %options.model_name,
            collection = %registered.name(),
            reap_interval_secs = options.reap_interval.as_secs(),
            "created cache model"
        );

        Ok(registered)
    }
}

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::SystemTime;

use crate::collection::{CollectionFactory, CollectionSource, DocumentCollection};
use crate::config::{ModelOptions, StoreConfig};
use crate::error::StoreError;
use crate::record::RecordFields;

/// Default limit for search_keys operations
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Maximum limit for search_keys operations (hard cap)
pub const MAX_SEARCH_LIMIT: usize = 250;

/// Truncates a key for safe logging (prevents leaking sensitive key data)
fn truncate_key_for_log(key: &str) -> String {
    const MAX_LOG_LEN: usize = 16;
    match key.char_indices().nth(MAX_LOG_LEN) {
        Some((idx, _)) => format!("{}...", &key[..idx]),
        None => key.to_string(),
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("key cannot be empty".into()));
    }
    Ok(())
}

/// Per-call options for [`TtlStore::set`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// TTL in seconds overriding the store default. `Some(0)` means never expire.
    pub ttl: Option<u64>,
}

impl SetOptions {
    pub fn ttl(ttl_seconds: u64) -> Self {
        Self {
            ttl: Some(ttl_seconds),
        }
    }

    /// Entry never expires, whatever the store default
    pub fn never_expire() -> Self {
        Self::ttl(0)
    }
}

/// A model reference handed to [`StoreBuilder::model`]
pub enum ModelRef {
    /// A ready-made collection
    Handle(Arc<dyn DocumentCollection>),
    /// The name of a model registered on the connection
    Name(String),
}

impl From<Arc<dyn DocumentCollection>> for ModelRef {
    fn from(collection: Arc<dyn DocumentCollection>) -> Self {
        ModelRef::Handle(collection)
    }
}

impl From<&str> for ModelRef {
    fn from(name: &str) -> Self {
        ModelRef::Name(name.to_string())
    }
}

impl From<String> for ModelRef {
    fn from(name: String) -> Self {
        ModelRef::Name(name)
    }
}

/// Builds a [`TtlStore`] from a connection, a model reference, or both.
///
/// # Example
///
/// ```rust,no_run
/// use doccache_core::{MemoryConnection, StoreBuilder, StoreConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), doccache_core::StoreError> {
///     // Generate the default "DocCache" model on the connection
///     let store = StoreBuilder::new()
///         .connection(Arc::new(MemoryConnection::new()))
///         .config(StoreConfig::default().with_default_ttl(300))
///         .build()?;
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct StoreBuilder {
    connection: Option<Arc<dyn CollectionFactory>>,
    model: Option<ModelRef>,
    model_options: Option<ModelOptions>,
    config: StoreConfig,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection used to resolve model names and generate collections
    pub fn connection(mut self, connection: Arc<dyn CollectionFactory>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Collection handle or model name to use instead of generating one
    pub fn model(mut self, model: impl Into<ModelRef>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Options for the generated collection, used only when no model is given
    pub fn model_options(mut self, options: ModelOptions) -> Self {
        self.model_options = Some(options);
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolves the collection and builds the store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` when neither a connection nor a
    /// model is given, or when the model cannot be resolved.
    pub fn build(self) -> Result<TtlStore, StoreError> {
        let source = match self.model {
            Some(ModelRef::Handle(collection)) => CollectionSource::Direct(collection),
            Some(ModelRef::Name(name)) => CollectionSource::ByName(name),
            None if self.connection.is_some() => {
                CollectionSource::Generated(self.model_options.unwrap_or_default())
            }
            None => {
                return Err(StoreError::configuration(
                    "either a connection or a model must be provided",
                ))
            }
        };

        TtlStore::from_source(source, self.connection.as_deref(), self.config)
    }
}

/// TTL-aware key/value store over a document collection
///
/// Values are arbitrary JSON. Every write stamps an absolute expiration time
/// (or none, for a TTL of 0). The collection may expire records in the
/// background on its own schedule, so reads re-check expiration and delete
/// expired records they observe.
///
/// The store keeps no copy of the data; clones share the same collection.
///
/// # Example
///
/// ```rust,no_run
/// use doccache_core::{MemoryCollection, SetOptions, StoreConfig, TtlStore};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), doccache_core::StoreError> {
///     let store = TtlStore::new(Arc::new(MemoryCollection::new("cache")), StoreConfig::default());
///
///     store.set("user:123", json!({"name": "John"}), SetOptions::ttl(300)).await?;
///     if let Some(user) = store.get("user:123").await? {
///         println!("User: {}", user);
///     }
///     store.del("user:123").await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct TtlStore {
    collection: Arc<dyn DocumentCollection>,
    config: StoreConfig,
}

impl TtlStore {
    /// Creates a store over a ready collection handle
    pub fn new(collection: Arc<dyn DocumentCollection>, config: StoreConfig) -> Self {
        Self { collection, config }
    }

    /// Resolves `source` (through `connection` where needed) and creates a store.
    pub fn from_source(
        source: CollectionSource,
        connection: Option<&dyn CollectionFactory>,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        tracing::debug!(?source, "resolving cache collection");
        let collection = source.resolve(connection)?;
        Ok(Self::new(collection, config))
    }

    /// Returns a builder for configuring a store
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The collection backing this store
    pub fn collection(&self) -> &Arc<dyn DocumentCollection> {
        &self.collection
    }

    /// Retrieves a value by key
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    /// Expired records are deleted before returning, exactly as [`del`](Self::del)
    /// would; a failure of that delete is returned as `StoreError::Backend`.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        validate_key(key)?;
        tracing::debug!("GET {}", truncate_key_for_log(key));

        let Some(record) = self.collection.find_one(key).await? else {
            return Ok(None);
        };

        if record.is_expired() {
            tracing::debug!("expired {}", truncate_key_for_log(key));
            self.collection.delete_expired(key).await?;
            return Ok(None);
        }

        Ok(Some(record.into_value()))
    }

    /// Stores a value, replacing any existing value and expiry for the key
    ///
    /// # TTL Semantics
    ///
    /// - `options.ttl` of `None` uses the store's default TTL.
    /// - A TTL of **0** (per call or as the store default) means the entry
    ///   **never expires**: no expiration time is stored at all.
    /// - Non-zero TTLs are seconds from now, capped at ~100 years.
    pub async fn set(&self, key: &str, value: Value, options: SetOptions) -> Result<(), StoreError> {
        validate_key(key)?;
        let ttl_seconds = options.ttl.unwrap_or(self.config.default_ttl_seconds);

        let ttl_display = if ttl_seconds == 0 {
            "never".to_string()
        } else {
            format!("{}s", ttl_seconds)
        };
        tracing::debug!("SET {} (ttl: {})", truncate_key_for_log(key), ttl_display);

        let fields = RecordFields::with_ttl(value, ttl_seconds, SystemTime::now());
        self.collection.upsert(key, fields).await?;
        Ok(())
    }

    /// Deletes a key. Deleting a missing key succeeds.
    pub async fn del(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        tracing::debug!("DEL {}", truncate_key_for_log(key));

        self.collection.delete_one(key).await?;
        Ok(())
    }

    /// Deletes every record, expired or not.
    ///
    /// # ⚠️ Warning: Destructive Operation
    ///
    /// All cached data in the collection is permanently removed, including
    /// records written by other stores sharing the collection.
    pub async fn reset(&self) -> Result<(), StoreError> {
        tracing::debug!(collection = %self.collection.name(), "RESET");
        self.collection.delete_many().await?;
        Ok(())
    }

    /// Returns the keys of all live records, in no particular order
    ///
    /// Expired records still present in the collection are skipped.
    pub async fn keys(&self) -> Result<Vec<String>, StoreError> {
        tracing::debug!(collection = %self.collection.name(), "KEYS");
        let now = SystemTime::now();

        Ok(self
            .collection
            .find_all()
            .await?
            .into_iter()
            .filter(|record| !record.is_expired_at(now))
            .map(|record| record.id().to_string())
            .collect())
    }

    /// Searches live keys by prefix with pagination support
    ///
    /// Returns a tuple of (matching keys, total count).
    /// Keys are sorted alphabetically for deterministic pagination.
    ///
    /// # Arguments
    /// * `prefix` - Keys must start with this prefix (empty matches all)
    /// * `limit` - Maximum keys to return (default 50, capped at 250)
    /// * `skip` - Number of matching keys to skip
    pub async fn search_keys(
        &self,
        prefix: &str,
        limit: Option<usize>,
        skip: Option<usize>,
    ) -> Result<(Vec<String>, usize), StoreError> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_SEARCH_LIMIT);
        let skip = skip.unwrap_or(0);

        let mut matching_keys: Vec<String> = self
            .keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        matching_keys.sort();

        let total_count = matching_keys.len();
        let page = matching_keys.into_iter().skip(skip).take(limit).collect();

        Ok((page, total_count))
    }

    /// Serializes `value` to JSON and stores it.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_value(value).map_err(StoreError::Serialization)?;
        self.set(key, json, options).await
    }

    /// Retrieves a value and deserializes it into `T`.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key).await? {
            Some(json) => {
                let value = serde_json::from_value(json).map_err(StoreError::Deserialization)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // Completion-callback forms. Each awaits the direct form and hands its
    // result to `callback` exactly once.

    /// Callback form of [`get`](Self::get)
    pub async fn get_with<F>(&self, key: &str, callback: F)
    where
        F: FnOnce(Result<Option<Value>, StoreError>) + Send,
    {
        callback(self.get(key).await)
    }

    /// Callback form of [`set`](Self::set)
    pub async fn set_with<F>(&self, key: &str, value: Value, options: SetOptions, callback: F)
    where
        F: FnOnce(Result<(), StoreError>) + Send,
    {
        callback(self.set(key, value, options).await)
    }

    /// Callback form of [`del`](Self::del)
    pub async fn del_with<F>(&self, key: &str, callback: F)
    where
        F: FnOnce(Result<(), StoreError>) + Send,
    {
        callback(self.del(key).await)
    }

    /// Callback form of [`reset`](Self::reset)
    pub async fn reset_with<F>(&self, callback: F)
    where
        F: FnOnce(Result<(), StoreError>) + Send,
    {
        callback(self.reset().await)
    }

    /// Callback form of [`keys`](Self::keys)
    pub async fn keys_with<F>(&self, callback: F)
    where
        F: FnOnce(Result<Vec<String>, StoreError>) + Send,
    {
        callback(self.keys().await)
    }
}

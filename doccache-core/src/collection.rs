//! The document collection capability the store is built on.
//!
//! A collection is any id-keyed document storage that can find, upsert and
//! delete records. It may also expire records in the background, but the
//! store never relies on that for correctness.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ModelOptions;
use crate::error::{BackendError, StoreError};
use crate::record::{Record, RecordFields};

/// Id-keyed CRUD over stored records.
///
/// Implementations translate `upsert` into whatever insert-or-replace verb
/// their driver offers.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Collection name, used for logging
    fn name(&self) -> &str;

    /// Returns the record with this id, expired or not.
    async fn find_one(&self, id: &str) -> Result<Option<Record>, BackendError>;

    /// Inserts or fully replaces the record with this id.
    async fn upsert(&self, id: &str, fields: RecordFields) -> Result<(), BackendError>;

    /// Removes the record with this id. Removing a missing id is not an error.
    async fn delete_one(&self, id: &str) -> Result<(), BackendError>;

    /// Removes a record the store has just read as expired.
    ///
    /// A write for the same id can land between that read and this call.
    /// Backends able to do so should only delete if the stored record is
    /// still expired; the default is a plain [`delete_one`](Self::delete_one).
    async fn delete_expired(&self, id: &str) -> Result<(), BackendError> {
        self.delete_one(id).await
    }

    /// Removes every record in the collection.
    async fn delete_many(&self) -> Result<(), BackendError>;

    /// Returns every record in the collection, expired or not.
    async fn find_all(&self) -> Result<Vec<Record>, BackendError>;
}

/// A connection able to look up and generate collections.
pub trait CollectionFactory: Send + Sync {
    /// Resolves a previously registered collection by model name.
    fn model(&self, name: &str) -> Result<Arc<dyn DocumentCollection>, StoreError>;

    /// Generates a collection with background expiry on the expiration field.
    fn create_model(&self, options: &ModelOptions) -> Result<Arc<dyn DocumentCollection>, StoreError>;
}

/// Where the store's collection comes from
#[derive(Clone)]
pub enum CollectionSource {
    /// A ready-made collection handle
    Direct(Arc<dyn DocumentCollection>),
    /// A model name to resolve through a connection
    ByName(String),
    /// Options for a collection the connection should generate
    Generated(ModelOptions),
}

impl std::fmt::Debug for CollectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionSource::Direct(collection) => {
                f.debug_tuple("Direct").field(&collection.name()).finish()
            }
            CollectionSource::ByName(name) => f.debug_tuple("ByName").field(name).finish(),
            CollectionSource::Generated(options) => {
                f.debug_tuple("Generated").field(options).finish()
            }
        }
    }
}

impl CollectionSource {
    /// Resolves this source into a concrete collection handle.
    ///
    /// `ByName` and `Generated` need a connection; without one they fail
    /// with a configuration error.
    pub fn resolve(
        self,
        connection: Option<&dyn CollectionFactory>,
    ) -> Result<Arc<dyn DocumentCollection>, StoreError> {
        match self {
            CollectionSource::Direct(collection) => Ok(collection),
            CollectionSource::ByName(name) => {
                if name.trim().is_empty() {
                    return Err(StoreError::configuration("model name cannot be empty"));
                }
                let connection = connection.ok_or_else(|| {
                    StoreError::configuration(format!(
                        "cannot resolve model '{}' without a connection",
                        name
                    ))
                })?;
                connection.model(&name)
            }
            CollectionSource::Generated(options) => {
                let connection = connection.ok_or_else(|| {
                    StoreError::configuration("cannot generate a model without a connection")
                })?;
                connection.create_model(&options)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryCollection, MemoryConnection};

    #[tokio::test]
    async fn test_direct_source_needs_no_connection() {
        let collection: Arc<dyn DocumentCollection> = Arc::new(MemoryCollection::new("direct"));
        let resolved = CollectionSource::Direct(collection).resolve(None).unwrap();
        assert_eq!(resolved.name(), "direct");
    }

    #[tokio::test]
    async fn test_by_name_resolves_registered_model() {
        let connection = MemoryConnection::new();
        connection.register("Sessions", Arc::new(MemoryCollection::new("sessions")));

        let resolved = CollectionSource::ByName("Sessions".into())
            .resolve(Some(&connection))
            .unwrap();
        assert_eq!(resolved.name(), "sessions");
    }

    #[tokio::test]
    async fn test_by_name_unknown_model_is_configuration_error() {
        let connection = MemoryConnection::new();
        let err = CollectionSource::ByName("Missing".into())
            .resolve(Some(&connection))
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_by_name_without_connection_is_configuration_error() {
        let err = CollectionSource::ByName("Sessions".into())
            .resolve(None)
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_model_name_is_configuration_error() {
        let connection = MemoryConnection::new();
        let err = CollectionSource::ByName("  ".into())
            .resolve(Some(&connection))
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_generated_without_connection_is_configuration_error() {
        let err = CollectionSource::Generated(ModelOptions::default())
            .resolve(None)
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_generated_uses_collection_option() {
        let connection = MemoryConnection::new();
        let options = ModelOptions::default().with_collection("custom_cache");

        let resolved = CollectionSource::Generated(options)
            .resolve(Some(&connection))
            .unwrap();
        assert_eq!(resolved.name(), "custom_cache");
    }
}

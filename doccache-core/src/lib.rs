//! # Doccache Core
//!
//! A TTL-aware key/value cache store over a document collection.
//!
//! ## Features
//!
//! - Arbitrary JSON values stored under string keys
//! - Per-entry expiration, from a per-call TTL or the store default (0 = never expire)
//! - Expiration re-checked on read (lazy cleanup), independent of when the
//!   backend's own background expiry runs
//! - Pluggable backend through the [`DocumentCollection`] trait, with an
//!   in-process [`MemoryCollection`] that reaps expired records in the background
//!
//! ## Example
//!
//! ```rust,no_run
//! use doccache_core::{MemoryConnection, SetOptions, StoreBuilder, StoreConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), doccache_core::StoreError> {
//!     // Generate the default "DocCache" collection with a 60 second default TTL
//!     let store = StoreBuilder::new()
//!         .connection(Arc::new(MemoryConnection::new()))
//!         .config(StoreConfig::default())
//!         .build()?;
//!
//!     // Store a value with a 5 minute TTL
//!     store.set("user:123", json!({"name": "John Doe"}), SetOptions::ttl(300)).await?;
//!
//!     // Retrieve the value
//!     if let Some(value) = store.get("user:123").await? {
//!         println!("User: {}", value);
//!     }
//!
//!     // List live keys, delete one, then clear everything
//!     let keys = store.keys().await?;
//!     store.del("user:123").await?;
//!     store.reset().await?;
//!     Ok(())
//! }
//! ```

mod collection;
mod config;
mod error;
mod memory;
mod record;
mod store;

pub use collection::{CollectionFactory, CollectionSource, DocumentCollection};
pub use config::{ModelOptions, StoreConfig, DEFAULT_MODEL_NAME, DEFAULT_TTL_SECONDS};
pub use error::{BackendError, StoreError};
pub use memory::{MemoryCollection, MemoryConnection};
pub use record::{Record, RecordFields, MAX_TTL_SECONDS};
pub use store::{ModelRef, SetOptions, StoreBuilder, TtlStore};

// Re-export search constants for callers paginating key listings
pub use store::DEFAULT_SEARCH_LIMIT;
pub use store::MAX_SEARCH_LIMIT;

// Backends implementing `DocumentCollection` need the same attribute macro
pub use async_trait::async_trait;

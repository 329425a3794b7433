use anyhow::{ensure, Result};
use doccache_core::{
    MemoryCollection, MemoryConnection, ModelOptions, SetOptions,
    StoreBuilder, StoreConfig, StoreError, TtlStore,
};
use futures::future::join_all;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doccache_scenarios=info,doccache_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StoreConfig::from_env();
    let model_options = ModelOptions::from_env();

    tracing::info!("🧪 Doccache Scenarios");
    tracing::info!("   Default TTL: {}s", config.default_ttl_seconds);
    tracing::info!(
        "   Model: {} (collection {}, reap every {}s)",
        model_options.model_name,
        model_options.collection,
        model_options.reap_interval.as_secs()
    );

    let store = StoreBuilder::new()
        .connection(Arc::new(MemoryConnection::new()))
        .model_options(model_options)
        .config(config)
        .build()?;

    scenario_short_ttl(&store).await?;
    scenario_keys_and_delete(&store).await?;
    scenario_missing_backend()?;
    scenario_lazy_expiry().await?;
    scenario_parallel_set_get(&store).await?;

    tracing::info!("✅ All scenarios passed!");

    Ok(())
}

/// A value written with a 1 second TTL is readable at once and gone after 1.5s
async fn scenario_short_ttl(store: &TtlStore) -> Result<()> {
    tracing::info!("Scenario A: Short TTL");

    let key = format!("x-{}", uuid::Uuid::new_v4());
    store.set(&key, json!({"a": 1}), SetOptions::ttl(1)).await?;

    let value = store.get(&key).await?;
    ensure!(value == Some(json!({"a": 1})), "value should be readable immediately");

    tracing::info!("   Waiting 1.5 seconds for expiration...");
    tokio::time::sleep(Duration::from_millis(1500)).await;

    ensure!(store.get(&key).await?.is_none(), "value should be expired");
    let record = store
        .collection()
        .find_one(&key)
        .await
        .map_err(StoreError::from)?;
    ensure!(record.is_none(), "expired record should be removed from the collection");

    tracing::info!("   ✓ TTL expiration works correctly");
    Ok(())
}

/// A key written with the default TTL is listed until deleted
async fn scenario_keys_and_delete(store: &TtlStore) -> Result<()> {
    tracing::info!("Scenario B: Keys and delete");

    let key = format!("y-{}", uuid::Uuid::new_v4());
    store.set(&key, json!(42), SetOptions::default()).await?;
    ensure!(store.keys().await?.contains(&key), "keys should include {}", key);

    store.del(&key).await?;
    ensure!(!store.keys().await?.contains(&key), "keys should exclude {}", key);

    // Deleting again is still a success
    store.del(&key).await?;

    tracing::info!("   ✓ Keys listing tracks set and delete");
    Ok(())
}

/// Building a store with neither a connection nor a model fails immediately
fn scenario_missing_backend() -> Result<()> {
    tracing::info!("Scenario C: Missing backend");

    match StoreBuilder::new().build() {
        Err(e) if e.is_configuration() => {
            tracing::info!("   ✓ Construction rejected: {}", e);
            Ok(())
        }
        Err(e) => anyhow::bail!("expected a configuration error, got: {}", e),
        Ok(_) => anyhow::bail!("construction without a backend should fail"),
    }
}

/// Expired records that the backend has not reaped yet are never served
async fn scenario_lazy_expiry() -> Result<()> {
    tracing::info!("Scenario: Lazy expiry without a reaper");

    // No background reaper: only the store's read path removes records
    let collection = MemoryCollection::new("no-reaper");
    let store = TtlStore::new(Arc::new(collection.clone()), StoreConfig::default());

    store.set("k1", json!("short"), SetOptions::ttl(1)).await?;
    store.set("k2", json!("long"), SetOptions::default()).await?;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let keys = store.keys().await?;
    ensure!(keys == vec!["k2".to_string()], "keys should only list k2, got {:?}", keys);
    ensure!(collection.len() == 2, "keys should not delete anything");

    ensure!(store.get("k1").await?.is_none(), "k1 should be expired");
    ensure!(collection.len() == 1, "reading k1 should delete it");

    tracing::info!("   ✓ Expired records filtered and lazily removed");
    Ok(())
}

/// Many concurrent writes followed by concurrent reads see their own values
async fn scenario_parallel_set_get(store: &TtlStore) -> Result<()> {
    tracing::info!("Scenario: Parallel SET/GET");

    let num_keys = 500;
    let test_data: HashMap<String, String> = (0..num_keys)
        .map(|i| {
            (
                format!("parallel-{}-{}", i, uuid::Uuid::new_v4()),
                format!("value-{}", i),
            )
        })
        .collect();

    let start = Instant::now();
    let set_results = join_all(
        test_data
            .iter()
            .map(|(key, value)| store.set(key, json!(value), SetOptions::default())),
    )
    .await;
    for result in set_results {
        result?;
    }
    tracing::info!("   SET {} keys in {:?}", num_keys, start.elapsed());

    let start = Instant::now();
    let get_results = join_all(test_data.keys().map(|key| store.get(key))).await;
    tracing::info!("   GET {} keys in {:?}", num_keys, start.elapsed());

    let mut mismatches = 0;
    for ((_, expected), result) in test_data.iter().zip(get_results) {
        if result? != Some(json!(expected)) {
            mismatches += 1;
        }
    }
    ensure!(mismatches == 0, "{} values did not match", mismatches);

    store.reset().await?;
    ensure!(store.keys().await?.is_empty(), "reset should clear every key");

    tracing::info!("   ✓ {} keys verified, then cleared", num_keys);
    Ok(())
}

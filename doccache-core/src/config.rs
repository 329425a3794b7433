use std::time::Duration;

/// Default TTL applied when `set` is called without a TTL override
pub const DEFAULT_TTL_SECONDS: u64 = 60;

/// Default model and collection name for generated collections
pub const DEFAULT_MODEL_NAME: &str = "DocCache";

/// Configuration for a [`TtlStore`](crate::TtlStore)
///
/// # Example
///
/// ```rust
/// use doccache_core::StoreConfig;
///
/// // Entries written without a TTL override live for 5 minutes
/// let config = StoreConfig::default().with_default_ttl(300);
///
/// // Entries written without a TTL override never expire
/// let config = StoreConfig::default().with_default_ttl(0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// TTL in seconds for writes without an override (default: 60, 0 = never expire)
    pub default_ttl_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default TTL in seconds. A value of 0 means entries never expire.
    pub fn with_default_ttl(mut self, ttl_seconds: u64) -> Self {
        self.default_ttl_seconds = ttl_seconds;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `DOCCACHE_DEFAULT_TTL` - Default TTL in seconds (defaults to 60)
    pub fn from_env() -> Self {
        let default_ttl_seconds = std::env::var("DOCCACHE_DEFAULT_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECONDS);

        Self { default_ttl_seconds }
    }
}

/// Options used when a collection has to be generated by a connection
///
/// Any field left at its default keeps the generated model's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOptions {
    /// Name the model is registered under (default: "DocCache")
    pub model_name: String,
    /// Name of the underlying collection (default: "DocCache")
    pub collection: String,
    /// Interval between background expiry passes (default: 60 seconds)
    pub reap_interval: Duration,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            collection: DEFAULT_MODEL_NAME.to_string(),
            reap_interval: Duration::from_secs(60),
        }
    }
}

impl ModelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets how often the backend removes expired records.
    ///
    /// Reads never depend on this: expired records are filtered out
    /// on access regardless of when the reaper last ran.
    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// Create model options from environment variables.
    ///
    /// Reads:
    /// - `DOCCACHE_MODEL_NAME` - Model name (defaults to "DocCache")
    /// - `DOCCACHE_COLLECTION` - Collection name (defaults to "DocCache")
    /// - `DOCCACHE_REAP_INTERVAL` - Reaper interval in seconds (defaults to 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let model_name = std::env::var("DOCCACHE_MODEL_NAME").unwrap_or(defaults.model_name);
        let collection = std::env::var("DOCCACHE_COLLECTION").unwrap_or(defaults.collection);
        let reap_interval = std::env::var("DOCCACHE_REAP_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.reap_interval);

        Self {
            model_name,
            collection,
            reap_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.default_ttl_seconds, 60);
    }

    #[test]
    fn test_zero_default_ttl_is_kept() {
        let config = StoreConfig::new().with_default_ttl(0);
        assert_eq!(config.default_ttl_seconds, 0);
    }

    #[test]
    fn test_store_config_from_env() {
        std::env::remove_var("DOCCACHE_DEFAULT_TTL");
        assert_eq!(StoreConfig::from_env().default_ttl_seconds, DEFAULT_TTL_SECONDS);

        std::env::set_var("DOCCACHE_DEFAULT_TTL", "not-a-number");
        assert_eq!(StoreConfig::from_env().default_ttl_seconds, DEFAULT_TTL_SECONDS);

        std::env::set_var("DOCCACHE_DEFAULT_TTL", "0");
        assert_eq!(StoreConfig::from_env().default_ttl_seconds, 0);

        std::env::set_var("DOCCACHE_DEFAULT_TTL", "300");
        assert_eq!(StoreConfig::from_env().default_ttl_seconds, 300);

        std::env::remove_var("DOCCACHE_DEFAULT_TTL");
    }

    #[test]
    fn test_model_options_from_env() {
        std::env::remove_var("DOCCACHE_MODEL_NAME");
        std::env::remove_var("DOCCACHE_COLLECTION");
        std::env::remove_var("DOCCACHE_REAP_INTERVAL");
        assert_eq!(ModelOptions::from_env(), ModelOptions::default());

        std::env::set_var("DOCCACHE_REAP_INTERVAL", "-5");
        assert_eq!(ModelOptions::from_env().reap_interval, Duration::from_secs(60));

        std::env::set_var("DOCCACHE_MODEL_NAME", "Sessions");
        std::env::set_var("DOCCACHE_COLLECTION", "session_cache");
        std::env::set_var("DOCCACHE_REAP_INTERVAL", "15");
        let options = ModelOptions::from_env();
        assert_eq!(options.model_name, "Sessions");
        assert_eq!(options.collection, "session_cache");
        assert_eq!(options.reap_interval, Duration::from_secs(15));

        std::env::remove_var("DOCCACHE_MODEL_NAME");
        std::env::remove_var("DOCCACHE_COLLECTION");
        std::env::remove_var("DOCCACHE_REAP_INTERVAL");
    }

    #[test]
    fn test_default_model_options() {
        let options = ModelOptions::default();
        assert_eq!(options.model_name, "DocCache");
        assert_eq!(options.collection, "DocCache");
        assert_eq!(options.reap_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_model_options_builder_chaining() {
        let options = ModelOptions::new()
            .with_model_name("Sessions")
            .with_collection("session_cache")
            .with_reap_interval(Duration::from_secs(5));

        assert_eq!(options.model_name, "Sessions");
        assert_eq!(options.collection, "session_cache");
        assert_eq!(options.reap_interval, Duration::from_secs(5));
    }
}

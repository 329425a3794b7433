use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, SystemTime};

/// TTLs above ~100 years are capped so `now + ttl` cannot overflow.
pub const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

/// Represents a stored document: the cached value and its expiration time
///
/// Serializes with the document field names `_id`, `val` and `exp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "val")]
    value: Value,
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<SystemTime>,
}

impl Record {
    /// Creates a new record; `expires_at` of `None` never expires
    pub fn new(id: impl Into<String>, value: Value, expires_at: Option<SystemTime>) -> Self {
        Self {
            id: id.into(),
            value,
            expires_at,
        }
    }

    /// Builds a record from upsert fields
    pub fn from_fields(id: impl Into<String>, fields: RecordFields) -> Self {
        Self::new(id, fields.value, fields.expires_at)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the record, returning the stored value
    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Checks if this record has expired as of `now`
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// Checks if this record has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }
}

/// The mutable part of a record, as written by an upsert
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    pub value: Value,
    pub expires_at: Option<SystemTime>,
}

impl RecordFields {
    /// Computes the fields for a write at `now` with the given TTL.
    ///
    /// A TTL of 0 leaves `expires_at` unset.
    pub fn with_ttl(value: Value, ttl_seconds: u64, now: SystemTime) -> Self {
        let expires_at = if ttl_seconds == 0 {
            None
        } else {
            Some(now + Duration::from_secs(ttl_seconds.min(MAX_TTL_SECONDS)))
        };
        Self { value, expires_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_not_expired() {
        let record = Record::new(
            "key",
            json!("test_value"),
            Some(SystemTime::now() + Duration::from_secs(60)),
        );

        assert_eq!(record.value(), &json!("test_value"));
        assert!(!record.is_expired());
    }

    #[test]
    fn test_record_expired() {
        let record = Record::new(
            "key",
            json!(1),
            Some(SystemTime::now() - Duration::from_secs(1)),
        );

        assert!(record.is_expired());
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let now = SystemTime::now();
        let record = Record::new("key", json!(1), Some(now));

        assert!(record.is_expired_at(now));
        assert!(!record.is_expired_at(now - Duration::from_millis(1)));
    }

    #[test]
    fn test_record_without_expiry_never_expires() {
        let record = Record::new("key", json!({"a": 1}), None);
        let far_future = SystemTime::now() + Duration::from_secs(MAX_TTL_SECONDS);

        assert!(!record.is_expired_at(far_future));
    }

    #[test]
    fn test_zero_ttl_leaves_expiry_unset() {
        let fields = RecordFields::with_ttl(json!(42), 0, SystemTime::now());
        assert_eq!(fields.expires_at, None);
    }

    #[test]
    fn test_ttl_added_to_write_time() {
        let now = SystemTime::now();
        let fields = RecordFields::with_ttl(json!(42), 30, now);
        assert_eq!(fields.expires_at, Some(now + Duration::from_secs(30)));
    }

    #[test]
    fn test_extreme_ttl_is_capped() {
        let now = SystemTime::now();
        let fields = RecordFields::with_ttl(json!(42), u64::MAX, now);
        assert_eq!(fields.expires_at, Some(now + Duration::from_secs(MAX_TTL_SECONDS)));
    }

    #[test]
    fn test_document_field_names() {
        let record = Record::new("user:1", json!({"name": "Alice"}), None);
        let doc = serde_json::to_value(&record).unwrap();

        assert_eq!(doc["_id"], json!("user:1"));
        assert_eq!(doc["val"], json!({"name": "Alice"}));
        assert!(doc.get("exp").is_none());

        let parsed: Record = serde_json::from_value(doc).unwrap();
        assert_eq!(parsed, record);
    }
}

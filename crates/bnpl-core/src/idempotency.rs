//! Idempotency records.
//!
//! A record caches the serialized response of the first successful mutation
//! tagged with a client key, so that a retried request replays the original
//! payload instead of executing again.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{BnplError, Result};

/// How long a cached response stays valid.
pub const DEFAULT_IDEMPOTENCY_TTL_HOURS: i64 = 24;

/// Maximum length of a client-supplied key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// A cached response keyed by a client-supplied idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// The client-supplied key.
    pub key: String,
    /// The serialized response of the original request.
    pub response_data: serde_json::Value,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
    /// When the record stops being served.
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// Create a record that expires `ttl` after `now`.
    #[must_use]
    pub fn new(
        key: String,
        response_data: serde_json::Value,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            key,
            response_data,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether a lookup at `now` may serve this record.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether the periodic purge at `now` removes this record.
    #[must_use]
    pub fn is_purgeable(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Check that a client key is usable.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for empty or oversized keys.
    pub fn validate_key(key: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(BnplError::Validation("idempotency key must not be empty".into()));
        }
        if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(BnplError::Validation(format!(
                "idempotency key exceeds {MAX_IDEMPOTENCY_KEY_LEN} bytes"
            )));
        }
        Ok(())
    }
}

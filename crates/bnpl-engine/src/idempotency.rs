//! Idempotency cache.
//!
//! Lookup, the mutation, and the store of its response share one unit of
//! work. The key row is locked by the lookup, so a concurrent request with
//! the same key waits and then replays the committed response.

use serde::de::DeserializeOwned;
use serde::Serialize;

use bnpl_core::{BnplError, IdempotencyRecord, Result, UserId};
use bnpl_store::UnitOfWork;

use crate::model::UserScoped;
use crate::{Ledger, Outcome};

impl Ledger {
    /// Return the cached response for `key`, if it has not expired.
    ///
    /// An expired entry is deleted and treated as a miss.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unusable key, or `Storage` on store
    /// failure.
    pub fn lookup(&self, key: &str) -> Result<Option<serde_json::Value>> {
        IdempotencyRecord::validate_key(key)?;
        let mut uow = self.store.begin()?;
        let cached = self.cached_response(uow.as_mut(), key)?;
        uow.commit()?;
        Ok(cached)
    }

    /// Cache `response` under `key` for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the key is already cached (the store's
    /// uniqueness constraint rejects the duplicate) or the store fails.
    pub fn store_response(&self, key: &str, response: serde_json::Value) -> Result<()> {
        IdempotencyRecord::validate_key(key)?;
        let mut uow = self.store.begin()?;
        self.cache_response(uow.as_mut(), key, response)?;
        uow.commit()?;
        Ok(())
    }

    /// Delete every cached response that expired before now.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure; nothing is removed in that case.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut uow = self.store.begin()?;
        let removed = uow.purge_idempotency(now)?;
        uow.commit()?;

        tracing::info!(removed, "purged expired idempotency keys");
        Ok(removed)
    }

    /// Run `operation` at most once per idempotency key.
    ///
    /// Without a key the operation simply runs in its own unit of work. A
    /// cached response is only replayed to the user it was produced for.
    pub(crate) fn idempotent<T, F>(
        &self,
        key: Option<&str>,
        user_id: &UserId,
        operation: F,
    ) -> Result<Outcome<T>>
    where
        T: Serialize + DeserializeOwned + UserScoped,
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T>,
    {
        let mut uow = self.store.begin()?;

        if let Some(key) = key {
            IdempotencyRecord::validate_key(key)?;
            if let Some(cached) = self.cached_response(uow.as_mut(), key)? {
                let replayed: T = serde_json::from_value(cached)
                    .ok()
                    .filter(|cached: &T| cached.owner() == user_id)
                    .ok_or_else(|| {
                        BnplError::Validation(format!(
                            "idempotency key {key} was already used for a different request"
                        ))
                    })?;
                tracing::info!(idempotency_key = key, "replaying cached response");
                return Ok(Outcome::Replayed(replayed));
            }
        }

        let value = operation(uow.as_mut())?;

        if let Some(key) = key {
            self.cache_response(uow.as_mut(), key, serde_json::to_value(&value)?)?;
        }
        uow.commit()?;
        Ok(Outcome::Created(value))
    }

    fn cached_response(
        &self,
        uow: &mut dyn UnitOfWork,
        key: &str,
    ) -> Result<Option<serde_json::Value>> {
        let Some(record) = uow.get_idempotency(key)? else {
            return Ok(None);
        };
        if record.is_live(self.clock.now()) {
            return Ok(Some(record.response_data));
        }

        tracing::debug!(idempotency_key = key, "dropping expired idempotency key");
        uow.delete_idempotency(key)?;
        Ok(None)
    }

    fn cache_response(
        &self,
        uow: &mut dyn UnitOfWork,
        key: &str,
        response: serde_json::Value,
    ) -> Result<()> {
        let record = IdempotencyRecord::new(
            key.to_string(),
            response,
            self.clock.now(),
            self.config.idempotency_ttl,
        );
        uow.insert_idempotency(&record)?;
        Ok(())
    }
}

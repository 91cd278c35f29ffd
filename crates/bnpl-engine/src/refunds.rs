//! Refund workflow.

use bnpl_core::{
    Amount, BnplError, Refund, RefundDecision, RefundId, Result, UserId, WebhookStatus,
};
use bnpl_store::{StoreError, UnitOfWork};

use crate::{Ledger, Outcome, WebhookOutcome};

impl Ledger {
    /// Request a refund for a merchant transaction.
    ///
    /// The transaction ID is the idempotency key: if a refund for it already
    /// exists, that refund is returned as [`Outcome::Replayed`] whatever the
    /// other arguments are.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty transaction ID or a non-positive amount.
    /// - `NotFound` if the user is unknown.
    pub fn create_refund(
        &self,
        user_id: &UserId,
        transaction_id: &str,
        amount: Amount,
        reason: Option<String>,
    ) -> Result<Outcome<Refund>> {
        let transaction_id = transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(BnplError::Validation(
                "transaction_id must not be empty".into(),
            ));
        }

        let mut uow = self.store.begin()?;
        if let Some(existing) = uow.find_refund_by_transaction(transaction_id)? {
            tracing::info!(transaction_id, refund_id = %existing.id, "idempotent refund request");
            return Ok(Outcome::Replayed(existing));
        }

        if !amount.is_positive() {
            return Err(BnplError::Validation("amount must be greater than zero".into()));
        }
        if uow.get_user(user_id)?.is_none() {
            return Err(BnplError::user_not_found(user_id));
        }

        let refund = Refund::new(
            user_id.clone(),
            transaction_id.to_string(),
            amount,
            reason,
            self.clock.now(),
        );
        match uow.insert_refund(&refund) {
            Ok(()) => {}
            Err(StoreError::Conflict { .. }) => {
                drop(uow);
                return self.existing_refund(transaction_id);
            }
            Err(e) => return Err(e.into()),
        }
        uow.commit()?;

        tracing::info!(refund_id = %refund.id, user_id = %user_id, transaction_id, "created refund");
        Ok(Outcome::Created(refund))
    }

    /// Fetch a refund.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the refund is unknown.
    pub fn get_refund(&self, refund_id: &RefundId) -> Result<Refund> {
        let uow = self.store.begin()?;
        uow.get_refund(refund_id)?
            .ok_or_else(|| BnplError::refund_not_found(refund_id))
    }

    /// List refunds, optionally for one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure.
    pub fn list_refunds(&self, user_id: Option<&UserId>) -> Result<Vec<Refund>> {
        let uow = self.store.begin()?;
        Ok(uow.list_refunds(user_id)?)
    }

    /// Approve or reject a pending refund.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the refund is unknown.
    /// - `InvalidState` unless the refund is `PENDING`.
    pub fn approve_or_reject(
        &self,
        refund_id: &RefundId,
        decision: RefundDecision,
        reason: Option<&str>,
    ) -> Result<Refund> {
        let refund =
            self.update_refund(refund_id, |refund, now| refund.decide(decision, reason, now))?;
        tracing::info!(refund_id = %refund.id, status = %refund.status, "refund decided");
        Ok(refund)
    }

    /// Cancel a pending refund on the customer's behalf.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the refund is unknown.
    /// - `InvalidState` unless the refund is `PENDING`.
    pub fn cancel_refund(&self, refund_id: &RefundId) -> Result<Refund> {
        let refund = self.update_refund(refund_id, Refund::cancel)?;
        tracing::info!(refund_id = %refund.id, "refund cancelled");
        Ok(refund)
    }

    /// Apply a merchant status callback.
    ///
    /// `reference` is resolved as a refund ID first, then as a transaction
    /// ID. A redelivered status the refund already has is accepted without
    /// effect.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no refund matches `reference`.
    /// - `InvalidState` if the status contradicts a terminal refund.
    pub fn apply_webhook(
        &self,
        reference: &str,
        status: WebhookStatus,
        merchant_reference: Option<&str>,
    ) -> Result<WebhookOutcome> {
        let mut uow = self.store.begin()?;
        let mut refund = Self::resolve_refund(&*uow, reference)?.ok_or_else(|| {
            tracing::warn!(reference, "webhook for unknown refund");
            BnplError::refund_not_found(reference)
        })?;

        let changed = refund.apply_webhook(status, merchant_reference, self.clock.now())?;
        if changed {
            uow.put_refund(&refund)?;
            uow.commit()?;
        }

        tracing::info!(
            refund_id = %refund.id,
            webhook_status = status.as_str(),
            changed,
            "processed refund webhook"
        );
        Ok(WebhookOutcome {
            refund,
            webhook_status: status,
            changed,
        })
    }

    fn update_refund<F>(&self, refund_id: &RefundId, transition: F) -> Result<Refund>
    where
        F: FnOnce(&mut Refund, chrono::DateTime<chrono::Utc>) -> Result<()>,
    {
        let mut uow = self.store.begin()?;
        let mut refund = uow
            .get_refund(refund_id)?
            .ok_or_else(|| BnplError::refund_not_found(refund_id))?;

        if let Err(e) = transition(&mut refund, self.clock.now()) {
            tracing::warn!(refund_id = %refund_id, status = %refund.status, "refund transition rejected");
            return Err(e);
        }
        uow.put_refund(&refund)?;
        uow.commit()?;
        Ok(refund)
    }

    fn existing_refund(&self, transaction_id: &str) -> Result<Outcome<Refund>> {
        let uow = self.store.begin()?;
        uow.find_refund_by_transaction(transaction_id)?
            .map(Outcome::Replayed)
            .ok_or_else(|| BnplError::DuplicateTransaction {
                transaction_id: transaction_id.to_string(),
            })
    }

    fn resolve_refund(uow: &dyn UnitOfWork, reference: &str) -> Result<Option<Refund>> {
        if let Ok(refund_id) = reference.parse::<RefundId>() {
            if let Some(refund) = uow.get_refund(&refund_id)? {
                return Ok(Some(refund));
            }
        }
        Ok(uow.find_refund_by_transaction(reference)?)
    }
}

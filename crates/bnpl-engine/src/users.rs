//! User registry and debt-status derivation.

use chrono::{DateTime, Utc};

use bnpl_core::{BnplError, InstallmentStatus, NewUser, Result, User, UserId, UserStatus};
use bnpl_store::UnitOfWork;

use crate::Ledger;

impl Ledger {
    /// Register a new user with `NORMAL` status.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the user ID is already registered or a
    /// required field is blank.
    pub fn register_user(&self, input: NewUser) -> Result<User> {
        for (field, value) in [
            ("full_name", &input.full_name),
            ("phone_number", &input.phone_number),
            ("passport_number", &input.passport_number),
        ] {
            if value.trim().is_empty() {
                return Err(BnplError::Validation(format!("{field} must not be empty")));
            }
        }

        let mut uow = self.store.begin()?;
        if uow.get_user(&input.user_id)?.is_some() {
            return Err(BnplError::Validation(format!(
                "user {} already exists",
                input.user_id
            )));
        }

        let user = User::new(input, self.clock.now());
        uow.put_user(&user)?;
        uow.commit()?;

        tracing::info!(user_id = %user.user_id, "registered user");
        Ok(user)
    }

    /// Fetch a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user is unknown.
    pub fn get_user(&self, user_id: &UserId) -> Result<User> {
        let uow = self.store.begin()?;
        uow.get_user(user_id)?
            .ok_or_else(|| BnplError::user_not_found(user_id))
    }

    /// List every user, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let uow = self.store.begin()?;
        Ok(uow.list_users()?)
    }

    /// Re-derive a user's status from their overdue installments and persist
    /// it if it changed. Must run in the unit that changed the installments.
    pub(crate) fn reconcile_user(
        uow: &mut dyn UnitOfWork,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<UserStatus> {
        let mut user = uow
            .get_user(user_id)?
            .ok_or_else(|| BnplError::user_not_found(user_id))?;
        let has_overdue = !uow
            .list_installments_by_user(user_id, Some(InstallmentStatus::Overdue))?
            .is_empty();

        if let Some(previous) = user.reconcile_status(has_overdue, now) {
            uow.put_user(&user)?;
            tracing::info!(
                user_id = %user_id,
                from = %previous,
                to = %user.status,
                "user status changed"
            );
        }
        Ok(user.status)
    }
}

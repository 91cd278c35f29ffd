//! Service statistics.

use bnpl_core::{PlanStatus, RefundStatus, Result, UserStatus};

use crate::{Ledger, LedgerStats};

impl Ledger {
    /// Count users, plans and refunds by status.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure.
    pub fn stats(&self) -> Result<LedgerStats> {
        let uow = self.store.begin()?;
        let users = uow.list_users()?;
        let plans = uow.list_plans(None)?;
        let refunds = uow.list_refunds(None)?;

        let debt_users = users
            .iter()
            .filter(|u| u.status == UserStatus::DebtUser)
            .count();
        Ok(LedgerStats {
            total_users: users.len(),
            normal_users: users.len() - debt_users,
            debt_users,
            total_plans: plans.len(),
            active_plans: plans
                .iter()
                .filter(|p| p.status == PlanStatus::Active)
                .count(),
            total_refunds: refunds.len(),
            pending_refunds: refunds
                .iter()
                .filter(|r| r.status == RefundStatus::Pending)
                .count(),
        })
    }
}

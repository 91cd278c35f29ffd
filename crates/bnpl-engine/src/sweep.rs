//! Overdue sweep.

use std::collections::BTreeMap;

use bnpl_core::{InstallmentId, InstallmentStatus, Result, UserId};

use crate::{Ledger, SweepReport};

impl Ledger {
    /// Mark every `UPCOMING` installment due before today as `OVERDUE` and
    /// re-derive the owners' statuses.
    ///
    /// Candidates are found with an unlocked scan, then each user is
    /// processed in its own unit of work: the user row is locked first and
    /// every candidate is re-read before it changes, so a concurrent
    /// repayment or plan deletion is never overwritten. Running the sweep
    /// again without newly due installments updates nothing.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure. Users committed before the failure
    /// keep their updates; the next sweep rescans everything.
    pub fn sweep_overdue(&self) -> Result<SweepReport> {
        let today = self.clock.today();

        let candidates = {
            let uow = self.store.begin()?;
            uow.list_upcoming_due_before(today)?
        };
        if candidates.is_empty() {
            tracing::debug!(%today, "no overdue installments found");
            return Ok(SweepReport::default());
        }

        let mut by_user: BTreeMap<UserId, Vec<InstallmentId>> = BTreeMap::new();
        for installment in candidates {
            by_user
                .entry(installment.user_id)
                .or_default()
                .push(installment.id);
        }

        let mut report = SweepReport::default();
        for (user_id, installment_ids) in by_user {
            let now = self.clock.now();
            let mut uow = self.store.begin()?;
            if uow.get_user(&user_id)?.is_none() {
                tracing::warn!(user_id = %user_id, "skipping installments of unknown user");
                continue;
            }

            let mut updated = 0;
            for id in &installment_ids {
                let Some(mut installment) = uow.get_installment(id)? else {
                    continue;
                };
                if installment.status != InstallmentStatus::Upcoming
                    || !installment.is_past_due(today)
                {
                    continue;
                }
                installment.mark_overdue(today, now)?;
                uow.put_installment(&installment)?;
                updated += 1;
            }

            if updated == 0 {
                continue;
            }
            let status = Self::reconcile_user(uow.as_mut(), &user_id, now)?;
            uow.commit()?;

            tracing::info!(user_id = %user_id, updated, user_status = %status, "marked installments overdue");
            report.updated_count += updated;
            report.affected_users.push(user_id);
        }

        tracing::info!(
            updated = report.updated_count,
            users = report.affected_users.len(),
            "overdue sweep finished"
        );
        Ok(report)
    }
}

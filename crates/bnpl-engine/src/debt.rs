//! Debt checks and repayment.

use std::collections::BTreeSet;

use bnpl_core::{
    Amount, BnplError, InstallmentId, InstallmentStatus, Plan, PlanId, PlanStatus, Result, UserId,
};

use crate::{DebtSummary, Ledger, Outcome, RepaymentReceipt};

impl Ledger {
    /// Summarize a user's overdue installments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user is unknown.
    pub fn check_debt(&self, user_id: &UserId) -> Result<DebtSummary> {
        let uow = self.store.begin()?;
        let user = uow
            .get_user(user_id)?
            .ok_or_else(|| BnplError::user_not_found(user_id))?;
        let overdue =
            uow.list_installments_by_user(user_id, Some(InstallmentStatus::Overdue))?;

        let total_debt = overdue
            .iter()
            .try_fold(Amount::ZERO, |total, i| total.checked_add(i.amount_due))
            .ok_or_else(|| BnplError::Validation("total debt exceeds the maximum amount".into()))?;

        tracing::debug!(
            user_id = %user_id,
            has_overdue = !overdue.is_empty(),
            total_debt = %total_debt,
            "debt check"
        );
        Ok(DebtSummary {
            user_id: user_id.clone(),
            has_overdue: !overdue.is_empty(),
            total_debt,
            overdue_installments: overdue,
            user_status: user.status,
        })
    }

    /// Pay a set of overdue installments.
    ///
    /// All listed installments are validated before any is changed: each must
    /// belong to the user and be `OVERDUE`. Paid installments get
    /// `paid_at = now`, plans whose installments are now all paid become
    /// `COMPLETED`, and the user's status is re-derived in the same unit.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user is unknown.
    /// - `Validation` for an empty or duplicated list, or any installment
    ///   that is not an overdue installment of the user. Nothing is paid in
    ///   that case.
    pub fn repay(
        &self,
        user_id: &UserId,
        installment_ids: &[InstallmentId],
        idempotency_key: Option<&str>,
    ) -> Result<Outcome<RepaymentReceipt>> {
        self.idempotent(idempotency_key, user_id, |uow| {
            if uow.get_user(user_id)?.is_none() {
                return Err(BnplError::user_not_found(user_id));
            }
            if installment_ids.is_empty() {
                return Err(BnplError::Validation(
                    "installment_ids must not be empty".into(),
                ));
            }
            let unique: BTreeSet<&InstallmentId> = installment_ids.iter().collect();
            if unique.len() != installment_ids.len() {
                return Err(BnplError::Validation(
                    "installment_ids must not contain duplicates".into(),
                ));
            }

            let mut installments = Vec::with_capacity(installment_ids.len());
            for id in installment_ids {
                match uow.get_installment(id)? {
                    Some(i) if i.user_id == *user_id && i.status == InstallmentStatus::Overdue => {
                        installments.push(i);
                    }
                    _ => {
                        tracing::warn!(
                            user_id = %user_id,
                            installment_id = %id,
                            "repayment rejected"
                        );
                        return Err(BnplError::Validation(format!(
                            "installment {id} is not an overdue installment of user {user_id}"
                        )));
                    }
                }
            }

            let now = self.clock.now();
            let mut touched_plans = BTreeSet::new();
            for installment in &mut installments {
                installment.mark_paid(now)?;
                uow.put_installment(installment)?;
                touched_plans.insert(installment.plan_id);
            }

            let mut completed_plans: Vec<PlanId> = Vec::new();
            for plan_id in touched_plans {
                let Some(mut plan) = uow.get_plan(&plan_id)? else {
                    continue;
                };
                let schedule = uow.list_installments_by_plan(&plan_id)?;
                if plan.status == PlanStatus::Active && Plan::is_fully_paid(&schedule) {
                    plan.complete(now)?;
                    uow.put_plan(&plan)?;
                    tracing::info!(plan_id = %plan_id, "plan completed");
                    completed_plans.push(plan_id);
                }
            }

            let user_status = Self::reconcile_user(uow, user_id, now)?;

            tracing::info!(
                user_id = %user_id,
                paid = installments.len(),
                user_status = %user_status,
                "processed repayment"
            );
            Ok(RepaymentReceipt {
                message: "Repayment processed successfully".into(),
                user_id: user_id.clone(),
                paid_installments: installments.len(),
                installment_ids: installments.iter().map(|i| i.id).collect(),
                completed_plans,
                user_status,
                paid_at: now,
            })
        })
    }
}

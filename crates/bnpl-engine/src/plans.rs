//! Plan creation and queries.

use bnpl_core::{
    build_schedule, Amount, BnplError, Installment, Plan, PlanId, Result, UserId,
};
use bnpl_store::UnitOfWork;

use crate::{Ledger, Outcome, PlanDetails};

impl Ledger {
    /// Open a plan of `installment_count` equal installments for a user.
    ///
    /// Installment `i` is due `i` intervals after today; the last installment
    /// absorbs the rounding remainder. With an idempotency key, a repeated
    /// call replays the first response instead of creating a second plan.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user is unknown.
    /// - `IneligibleUser` if the user has `DEBT_USER` status.
    /// - `Validation` for an out-of-range count or a non-positive or too
    ///   small amount.
    pub fn create_plan(
        &self,
        user_id: &UserId,
        total_amount: Amount,
        installment_count: u32,
        idempotency_key: Option<&str>,
    ) -> Result<Outcome<PlanDetails>> {
        self.idempotent(idempotency_key, user_id, |uow| {
            let user = uow
                .get_user(user_id)?
                .ok_or_else(|| BnplError::user_not_found(user_id))?;
            if !user.is_eligible_for_plan() {
                tracing::warn!(user_id = %user_id, "debt user attempted to create a plan");
                return Err(BnplError::IneligibleUser {
                    user_id: user_id.to_string(),
                });
            }

            let now = self.clock.now();
            let schedule = build_schedule(
                total_amount,
                installment_count,
                now.date_naive(),
                self.config.installment_interval_days,
            )?;

            let plan = Plan::new(user_id.clone(), total_amount, installment_count, now);
            uow.put_plan(&plan)?;

            let mut installments = Vec::with_capacity(schedule.len());
            for entry in schedule {
                let installment = Installment::scheduled(&plan, entry, now);
                uow.put_installment(&installment)?;
                installments.push(installment);
            }

            tracing::info!(
                plan_id = %plan.id,
                user_id = %user_id,
                total_amount = %total_amount,
                installment_count,
                "created plan"
            );
            Ok(PlanDetails { plan, installments })
        })
    }

    /// Fetch a plan with its installments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the plan is unknown.
    pub fn get_plan(&self, plan_id: &PlanId) -> Result<PlanDetails> {
        let uow = self.store.begin()?;
        let plan = uow
            .get_plan(plan_id)?
            .ok_or_else(|| BnplError::plan_not_found(plan_id))?;
        Self::details(&*uow, plan)
    }

    /// List plans, optionally for one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure.
    pub fn list_plans(&self, user_id: Option<&UserId>) -> Result<Vec<PlanDetails>> {
        let uow = self.store.begin()?;
        uow.list_plans(user_id)?
            .into_iter()
            .map(|plan| Self::details(&*uow, plan))
            .collect()
    }

    /// Delete a plan and its installments, then re-derive the owner's status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the plan is unknown.
    pub fn delete_plan(&self, plan_id: &PlanId) -> Result<()> {
        // Learn the owner first so the user row can be locked before the plan.
        let owner = {
            let uow = self.store.begin()?;
            uow.get_plan(plan_id)?
                .ok_or_else(|| BnplError::plan_not_found(plan_id))?
                .user_id
        };

        let mut uow = self.store.begin()?;
        if uow.get_user(&owner)?.is_none() {
            return Err(BnplError::user_not_found(&owner));
        }
        let plan = uow
            .get_plan(plan_id)?
            .filter(|plan| plan.user_id == owner)
            .ok_or_else(|| BnplError::plan_not_found(plan_id))?;

        uow.delete_plan(&plan.id)?;
        let status = Self::reconcile_user(uow.as_mut(), &owner, self.clock.now())?;
        uow.commit()?;

        tracing::info!(plan_id = %plan_id, user_id = %owner, user_status = %status, "deleted plan");
        Ok(())
    }

    fn details(uow: &dyn UnitOfWork, plan: Plan) -> Result<PlanDetails> {
        let installments = uow.list_installments_by_plan(&plan.id)?;
        Ok(PlanDetails { plan, installments })
    }
}

//! In-memory storage implementation.
//!
//! All tables live behind one mutex. A unit of work holds the guard until it
//! is committed or dropped, and records the previous value of every row it
//! writes so that dropping it uncommitted restores the tables.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};

use bnpl_core::{
    IdempotencyRecord, Installment, InstallmentId, InstallmentStatus, Plan, PlanId, Refund,
    RefundId, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::{Store, UnitOfWork};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    plans: BTreeMap<PlanId, Plan>,
    installments: BTreeMap<InstallmentId, Installment>,
    refunds: BTreeMap<RefundId, Refund>,
    idempotency: BTreeMap<String, IdempotencyRecord>,
}

/// Previous row value, replayed in reverse order on rollback.
enum Undo {
    User(UserId, Option<User>),
    Plan(PlanId, Option<Plan>),
    Installment(InstallmentId, Option<Installment>),
    Refund(RefundId, Option<Refund>),
    Idempotency(String, Option<IdempotencyRecord>),
}

fn restore<K: Ord, V>(table: &mut BTreeMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => {
            table.insert(key, value);
        }
        None => {
            table.remove(&key);
        }
    }
}

impl Tables {
    fn undo(&mut self, entry: Undo) {
        match entry {
            Undo::User(key, previous) => restore(&mut self.users, key, previous),
            Undo::Plan(key, previous) => restore(&mut self.plans, key, previous),
            Undo::Installment(key, previous) => restore(&mut self.installments, key, previous),
            Undo::Refund(key, previous) => restore(&mut self.refunds, key, previous),
            Undo::Idempotency(key, previous) => restore(&mut self.idempotency, key, previous),
        }
    }
}

/// Mutex-backed storage, serializing every unit of work.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>> {
        // A panicking unit rolls back in `Drop` before the guard is released,
        // so a poisoned lock still protects consistent tables.
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Box::new(MemoryUnit {
            tables,
            undo: Vec::new(),
            committed: false,
        }))
    }
}

/// A unit of work over [`MemoryStore`].
struct MemoryUnit<'a> {
    tables: MutexGuard<'a, Tables>,
    undo: Vec<Undo>,
    committed: bool,
}

impl Drop for MemoryUnit<'_> {
    fn drop(&mut self) {
        if self.committed || self.undo.is_empty() {
            return;
        }
        let writes = self.undo.len();
        while let Some(entry) = self.undo.pop() {
            self.tables.undo(entry);
        }
        tracing::debug!(writes, "rolled back uncommitted unit of work");
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, String)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl UnitOfWork for MemoryUnit<'_> {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self.tables.users.get(user_id).cloned())
    }

    fn put_user(&mut self, user: &User) -> Result<()> {
        let previous = self.tables.users.insert(user.user_id.clone(), user.clone());
        self.undo.push(Undo::User(user.user_id.clone(), previous));
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables.users.values().cloned().collect())
    }

    // =========================================================================
    // Plan Operations
    // =========================================================================

    fn get_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>> {
        Ok(self.tables.plans.get(plan_id).cloned())
    }

    fn put_plan(&mut self, plan: &Plan) -> Result<()> {
        let previous = self.tables.plans.insert(plan.id, plan.clone());
        self.undo.push(Undo::Plan(plan.id, previous));
        Ok(())
    }

    fn delete_plan(&mut self, plan_id: &PlanId) -> Result<()> {
        let plan = self
            .tables
            .plans
            .remove(plan_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "plan",
                id: plan_id.to_string(),
            })?;
        self.undo.push(Undo::Plan(*plan_id, Some(plan)));

        let owned: Vec<InstallmentId> = self
            .tables
            .installments
            .values()
            .filter(|i| i.plan_id == *plan_id)
            .map(|i| i.id)
            .collect();
        for id in owned {
            let previous = self.tables.installments.remove(&id);
            self.undo.push(Undo::Installment(id, previous));
        }
        Ok(())
    }

    fn list_plans(&self, user_id: Option<&UserId>) -> Result<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .tables
            .plans
            .values()
            .filter(|p| user_id.map_or(true, |u| p.user_id == *u))
            .cloned()
            .collect();
        newest_first(&mut plans, |p| (p.created_at, p.id.to_string()));
        Ok(plans)
    }

    // =========================================================================
    // Installment Operations
    // =========================================================================

    fn get_installment(&self, installment_id: &InstallmentId) -> Result<Option<Installment>> {
        Ok(self.tables.installments.get(installment_id).cloned())
    }

    fn put_installment(&mut self, installment: &Installment) -> Result<()> {
        let previous = self
            .tables
            .installments
            .insert(installment.id, installment.clone());
        self.undo.push(Undo::Installment(installment.id, previous));
        Ok(())
    }

    fn list_installments_by_plan(&self, plan_id: &PlanId) -> Result<Vec<Installment>> {
        let mut rows: Vec<Installment> = self
            .tables
            .installments
            .values()
            .filter(|i| i.plan_id == *plan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.sequence);
        Ok(rows)
    }

    fn list_installments_by_user(
        &self,
        user_id: &UserId,
        status: Option<InstallmentStatus>,
    ) -> Result<Vec<Installment>> {
        let mut rows: Vec<Installment> = self
            .tables
            .installments
            .values()
            .filter(|i| i.user_id == *user_id && status.map_or(true, |s| i.status == s))
            .cloned()
            .collect();
        rows.sort_by_key(|i| (i.due_date, i.sequence, i.id));
        Ok(rows)
    }

    fn list_upcoming_due_before(&self, before: NaiveDate) -> Result<Vec<Installment>> {
        let mut rows: Vec<Installment> = self
            .tables
            .installments
            .values()
            .filter(|i| i.status == InstallmentStatus::Upcoming && i.due_date < before)
            .cloned()
            .collect();
        rows.sort_by_key(|i| (i.due_date, i.id));
        Ok(rows)
    }

    // =========================================================================
    // Refund Operations
    // =========================================================================

    fn get_refund(&self, refund_id: &RefundId) -> Result<Option<Refund>> {
        Ok(self.tables.refunds.get(refund_id).cloned())
    }

    fn find_refund_by_transaction(&self, transaction_id: &str) -> Result<Option<Refund>> {
        Ok(self
            .tables
            .refunds
            .values()
            .find(|r| r.transaction_id == transaction_id)
            .cloned())
    }

    fn insert_refund(&mut self, refund: &Refund) -> Result<()> {
        if self.find_refund_by_transaction(&refund.transaction_id)?.is_some() {
            return Err(StoreError::Conflict {
                entity: "refund",
                key: refund.transaction_id.clone(),
            });
        }
        let previous = self.tables.refunds.insert(refund.id, refund.clone());
        self.undo.push(Undo::Refund(refund.id, previous));
        Ok(())
    }

    fn put_refund(&mut self, refund: &Refund) -> Result<()> {
        if !self.tables.refunds.contains_key(&refund.id) {
            return Err(StoreError::NotFound {
                entity: "refund",
                id: refund.id.to_string(),
            });
        }
        let previous = self.tables.refunds.insert(refund.id, refund.clone());
        self.undo.push(Undo::Refund(refund.id, previous));
        Ok(())
    }

    fn list_refunds(&self, user_id: Option<&UserId>) -> Result<Vec<Refund>> {
        let mut refunds: Vec<Refund> = self
            .tables
            .refunds
            .values()
            .filter(|r| user_id.map_or(true, |u| r.user_id == *u))
            .cloned()
            .collect();
        newest_first(&mut refunds, |r| (r.created_at, r.id.to_string()));
        Ok(refunds)
    }

    // =========================================================================
    // Idempotency Operations
    // =========================================================================

    fn get_idempotency(&self, key: &str) -> Result<Option<IdempotencyRecord>> {
        Ok(self.tables.idempotency.get(key).cloned())
    }

    fn insert_idempotency(&mut self, record: &IdempotencyRecord) -> Result<()> {
        if self.tables.idempotency.contains_key(&record.key) {
            return Err(StoreError::Conflict {
                entity: "idempotency key",
                key: record.key.clone(),
            });
        }
        self.tables
            .idempotency
            .insert(record.key.clone(), record.clone());
        self.undo.push(Undo::Idempotency(record.key.clone(), None));
        Ok(())
    }

    fn delete_idempotency(&mut self, key: &str) -> Result<()> {
        if let Some(previous) = self.tables.idempotency.remove(key) {
            self.undo.push(Undo::Idempotency(key.to_string(), Some(previous)));
        }
        Ok(())
    }

    fn purge_idempotency(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let expired: Vec<String> = self
            .tables
            .idempotency
            .values()
            .filter(|r| r.is_purgeable(now))
            .map(|r| r.key.clone())
            .collect();
        for key in &expired {
            self.delete_idempotency(key)?;
        }
        Ok(expired.len())
    }

    // =========================================================================
    // Completion
    // =========================================================================

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.committed = true;
        self.undo.clear();
        Ok(())
    }
}

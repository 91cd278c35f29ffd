//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait
//! on top of a pessimistic `TransactionDB`. Point reads inside a unit use
//! `get_for_update`, so the row (present or not) stays locked until the unit
//! commits or is dropped. Index scans do not lock; callers re-read the rows
//! they intend to modify.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, MultiThreaded, Options,
    Transaction, TransactionDB, TransactionDBOptions,
};

use bnpl_core::{
    IdempotencyRecord, Installment, InstallmentId, InstallmentStatus, Plan, PlanId, Refund,
    RefundId, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{Store, UnitOfWork};

type Db = TransactionDB<MultiThreaded>;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<Db>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = Db::open_cf_descriptors(&opts, &TransactionDBOptions::default(), path, cf_descriptors)
            .map_err(db_err)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl Store for RocksStore {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>> {
        let db: &Db = &self.db;
        Ok(Box::new(RocksUnit {
            db,
            txn: db.transaction(),
        }))
    }
}

fn db_err(e: rocksdb::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn corrupt_index(family: &str) -> StoreError {
    StoreError::Database(format!("corrupt index entry in {family}"))
}

/// Serialize a value using CBOR.
fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Deserialize a value from CBOR.
fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
    ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// A unit of work backed by one `RocksDB` transaction.
///
/// Dropping the transaction without committing discards its writes and
/// releases its locks.
struct RocksUnit<'a> {
    db: &'a Db,
    txn: Transaction<'a, Db>,
}

impl<'a> RocksUnit<'a> {
    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'a>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Read and lock a row.
    fn read_for_update<T: serde::de::DeserializeOwned>(
        &self,
        family: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(family)?;
        self.txn
            .get_for_update_cf(&cf, key, true)
            .map_err(db_err)?
            .map(|data| deserialize(&data))
            .transpose()
    }

    /// Read a row without locking it.
    fn read<T: serde::de::DeserializeOwned>(&self, family: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(family)?;
        self.txn
            .get_cf(&cf, key)
            .map_err(db_err)?
            .map(|data| deserialize(&data))
            .transpose()
    }

    fn write<T: serde::Serialize>(&self, family: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(family)?;
        self.txn.put_cf(&cf, key, serialize(value)?).map_err(db_err)
    }

    fn put_raw(&self, family: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf(family)?;
        self.txn.put_cf(&cf, key, value).map_err(db_err)
    }

    fn delete(&self, family: &str, key: &[u8]) -> Result<()> {
        let cf = self.cf(family)?;
        self.txn.delete_cf(&cf, key).map_err(db_err)
    }

    /// Collect every key in `family` starting with `prefix`, in key order.
    fn scan_prefix(&self, family: &str, prefix: &[u8]) -> Result<Vec<Box<[u8]>>> {
        let cf = self.cf(family)?;
        let iter = self
            .txn
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut found = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(db_err)?;
            if !key.starts_with(prefix) {
                break;
            }
            found.push(key);
        }
        Ok(found)
    }

    /// Deserialize every value in `family`.
    fn scan_values<T: serde::de::DeserializeOwned>(&self, family: &str) -> Result<Vec<T>> {
        let cf = self.cf(family)?;
        let mut rows = Vec::new();
        for item in self.txn.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(db_err)?;
            rows.push(deserialize(&value)?);
        }
        Ok(rows)
    }

    /// Resolve index keys ending in a row ID into the rows themselves.
    fn resolve<T: serde::de::DeserializeOwned>(
        &self,
        index: &str,
        family: &str,
        index_keys: Vec<Box<[u8]>>,
    ) -> Result<Vec<T>> {
        let mut rows = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let id = keys::trailing_id(&key).ok_or_else(|| corrupt_index(index))?;
            if let Some(row) = self.read(family, &id)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn remove_installment(&self, installment: &Installment) -> Result<()> {
        self.delete(cf::INSTALLMENTS, &keys::installment_key(&installment.id))?;
        self.delete(
            cf::INSTALLMENTS_BY_PLAN,
            &keys::plan_installment_key(&installment.plan_id, installment.sequence, &installment.id),
        )?;
        self.delete(
            cf::INSTALLMENTS_BY_USER,
            &keys::user_index_key(&installment.user_id, installment.id.as_bytes()),
        )?;
        self.delete(
            cf::UPCOMING_BY_DUE_DATE,
            &keys::due_date_key(installment.due_date, &installment.id),
        )
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, String)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl UnitOfWork for RocksUnit<'_> {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        self.read_for_update(cf::USERS, &keys::user_key(user_id))
    }

    fn put_user(&mut self, user: &User) -> Result<()> {
        self.write(cf::USERS, &keys::user_key(&user.user_id), user)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.scan_values(cf::USERS)
    }

    // =========================================================================
    // Plan Operations
    // =========================================================================

    fn get_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>> {
        self.read_for_update(cf::PLANS, &keys::plan_key(plan_id))
    }

    fn put_plan(&mut self, plan: &Plan) -> Result<()> {
        self.write(cf::PLANS, &keys::plan_key(&plan.id), plan)?;
        self.put_raw(
            cf::PLANS_BY_USER,
            &keys::user_index_key(&plan.user_id, plan.id.as_bytes()),
            &[],
        )
    }

    fn delete_plan(&mut self, plan_id: &PlanId) -> Result<()> {
        let plan: Plan = self.get_plan(plan_id)?.ok_or_else(|| StoreError::NotFound {
            entity: "plan",
            id: plan_id.to_string(),
        })?;

        for installment in self.list_installments_by_plan(plan_id)? {
            self.remove_installment(&installment)?;
        }
        self.delete(cf::PLANS, &keys::plan_key(plan_id))?;
        self.delete(
            cf::PLANS_BY_USER,
            &keys::user_index_key(&plan.user_id, plan.id.as_bytes()),
        )
    }

    fn list_plans(&self, user_id: Option<&UserId>) -> Result<Vec<Plan>> {
        let mut plans: Vec<Plan> = match user_id {
            Some(user_id) => {
                let index_keys = self.scan_prefix(cf::PLANS_BY_USER, &keys::user_prefix(user_id))?;
                self.resolve(cf::PLANS_BY_USER, cf::PLANS, index_keys)?
            }
            None => self.scan_values(cf::PLANS)?,
        };
        newest_first(&mut plans, |p| (p.created_at, p.id.to_string()));
        Ok(plans)
    }

    // =========================================================================
    // Installment Operations
    // =========================================================================

    fn get_installment(&self, installment_id: &InstallmentId) -> Result<Option<Installment>> {
        self.read_for_update(cf::INSTALLMENTS, &keys::installment_key(installment_id))
    }

    fn put_installment(&mut self, installment: &Installment) -> Result<()> {
        let previous = self.get_installment(&installment.id)?;
        if let Some(previous) = previous.filter(|p| p.status == InstallmentStatus::Upcoming) {
            self.delete(
                cf::UPCOMING_BY_DUE_DATE,
                &keys::due_date_key(previous.due_date, &previous.id),
            )?;
        }

        self.write(cf::INSTALLMENTS, &keys::installment_key(&installment.id), installment)?;
        self.put_raw(
            cf::INSTALLMENTS_BY_PLAN,
            &keys::plan_installment_key(&installment.plan_id, installment.sequence, &installment.id),
            &[],
        )?;
        self.put_raw(
            cf::INSTALLMENTS_BY_USER,
            &keys::user_index_key(&installment.user_id, installment.id.as_bytes()),
            &[],
        )?;
        if installment.status == InstallmentStatus::Upcoming {
            self.put_raw(
                cf::UPCOMING_BY_DUE_DATE,
                &keys::due_date_key(installment.due_date, &installment.id),
                &[],
            )?;
        }
        Ok(())
    }

    fn list_installments_by_plan(&self, plan_id: &PlanId) -> Result<Vec<Installment>> {
        let index_keys =
            self.scan_prefix(cf::INSTALLMENTS_BY_PLAN, &keys::plan_installments_prefix(plan_id))?;
        self.resolve(cf::INSTALLMENTS_BY_PLAN, cf::INSTALLMENTS, index_keys)
    }

    fn list_installments_by_user(
        &self,
        user_id: &UserId,
        status: Option<InstallmentStatus>,
    ) -> Result<Vec<Installment>> {
        let index_keys = self.scan_prefix(cf::INSTALLMENTS_BY_USER, &keys::user_prefix(user_id))?;
        let mut rows: Vec<Installment> =
            self.resolve(cf::INSTALLMENTS_BY_USER, cf::INSTALLMENTS, index_keys)?;
        rows.retain(|i| status.map_or(true, |s| i.status == s));
        rows.sort_by_key(|i| (i.due_date, i.sequence, i.id));
        Ok(rows)
    }

    fn list_upcoming_due_before(&self, before: NaiveDate) -> Result<Vec<Installment>> {
        let cf = self.cf(cf::UPCOMING_BY_DUE_DATE)?;
        let cutoff = keys::date_bytes(before);

        let mut index_keys = Vec::new();
        for item in self.txn.iterator_cf(&cf, IteratorMode::Start) {
            let (key, _) = item.map_err(db_err)?;
            if key.get(..4).map_or(true, |date| date >= cutoff.as_slice()) {
                break;
            }
            index_keys.push(key);
        }

        let mut rows: Vec<Installment> =
            self.resolve(cf::UPCOMING_BY_DUE_DATE, cf::INSTALLMENTS, index_keys)?;
        rows.retain(|i| i.status == InstallmentStatus::Upcoming);
        Ok(rows)
    }

    // =========================================================================
    // Refund Operations
    // =========================================================================

    fn get_refund(&self, refund_id: &RefundId) -> Result<Option<Refund>> {
        self.read_for_update(cf::REFUNDS, &keys::refund_key(refund_id))
    }

    fn find_refund_by_transaction(&self, transaction_id: &str) -> Result<Option<Refund>> {
        let cf = self.cf(cf::REFUNDS_BY_TRANSACTION)?;
        let Some(id) = self
            .txn
            .get_for_update_cf(&cf, keys::transaction_key(transaction_id), true)
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let bytes: [u8; keys::ID_LEN] = id
            .as_slice()
            .try_into()
            .map_err(|_| corrupt_index(cf::REFUNDS_BY_TRANSACTION))?;
        self.get_refund(&RefundId::from_bytes(bytes))
    }

    fn insert_refund(&mut self, refund: &Refund) -> Result<()> {
        if self.find_refund_by_transaction(&refund.transaction_id)?.is_some() {
            return Err(StoreError::Conflict {
                entity: "refund",
                key: refund.transaction_id.clone(),
            });
        }

        self.write(cf::REFUNDS, &keys::refund_key(&refund.id), refund)?;
        self.put_raw(
            cf::REFUNDS_BY_TRANSACTION,
            &keys::transaction_key(&refund.transaction_id),
            refund.id.as_bytes(),
        )?;
        self.put_raw(
            cf::REFUNDS_BY_USER,
            &keys::user_index_key(&refund.user_id, refund.id.as_bytes()),
            &[],
        )
    }

    fn put_refund(&mut self, refund: &Refund) -> Result<()> {
        if self.get_refund(&refund.id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "refund",
                id: refund.id.to_string(),
            });
        }
        self.write(cf::REFUNDS, &keys::refund_key(&refund.id), refund)
    }

    fn list_refunds(&self, user_id: Option<&UserId>) -> Result<Vec<Refund>> {
        let mut refunds: Vec<Refund> = match user_id {
            Some(user_id) => {
                let index_keys =
                    self.scan_prefix(cf::REFUNDS_BY_USER, &keys::user_prefix(user_id))?;
                self.resolve(cf::REFUNDS_BY_USER, cf::REFUNDS, index_keys)?
            }
            None => self.scan_values(cf::REFUNDS)?,
        };
        newest_first(&mut refunds, |r| (r.created_at, r.id.to_string()));
        Ok(refunds)
    }

    // =========================================================================
    // Idempotency Operations
    // =========================================================================

    fn get_idempotency(&self, key: &str) -> Result<Option<IdempotencyRecord>> {
        self.read_for_update(cf::IDEMPOTENCY, &keys::idempotency_key(key))
    }

    fn insert_idempotency(&mut self, record: &IdempotencyRecord) -> Result<()> {
        if self.get_idempotency(&record.key)?.is_some() {
            return Err(StoreError::Conflict {
                entity: "idempotency key",
                key: record.key.clone(),
            });
        }
        self.write(cf::IDEMPOTENCY, &keys::idempotency_key(&record.key), record)
    }

    fn delete_idempotency(&mut self, key: &str) -> Result<()> {
        self.delete(cf::IDEMPOTENCY, &keys::idempotency_key(key))
    }

    fn purge_idempotency(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let expired: Vec<String> = self
            .scan_values::<IdempotencyRecord>(cf::IDEMPOTENCY)?
            .into_iter()
            .filter(|r| r.is_purgeable(now))
            .map(|r| r.key)
            .collect();
        for key in &expired {
            self.delete_idempotency(key)?;
        }
        Ok(expired.len())
    }

    // =========================================================================
    // Completion
    // =========================================================================

    fn commit(self: Box<Self>) -> Result<()> {
        self.txn.commit().map_err(db_err)
    }
}

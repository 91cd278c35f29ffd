//! Plan and installment types.
//!
//! A plan is created together with its full installment schedule and the two
//! are never observed apart. Installments move forward only:
//!
//! ```text
//! UPCOMING --(overdue sweep)--> OVERDUE --(repayment)--> PAID
//! ```
//!
//! A plan is `ACTIVE` until every one of its installments is `PAID`, at which
//! point the repayment that paid the last one completes it.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, BnplError, InstallmentId, PlanId, Result, UserId};

/// Installment count used when the client does not specify one.
pub const DEFAULT_INSTALLMENT_COUNT: u32 = 3;

/// Smallest allowed installment count.
pub const MIN_INSTALLMENT_COUNT: u32 = 1;

/// Largest allowed installment count.
pub const MAX_INSTALLMENT_COUNT: u32 = 12;

/// Days between consecutive due dates.
pub const DEFAULT_INSTALLMENT_INTERVAL_DAYS: u32 = 30;

/// Status of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    /// At least one installment is unpaid.
    Active,

    /// Every installment is paid.
    Completed,
}

impl PlanStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    /// Not yet due, or due today.
    Upcoming,

    /// Past its due date and unpaid.
    Overdue,

    /// Repaid. Terminal.
    Paid,
}

impl InstallmentStatus {
    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Upcoming, Self::Overdue) | (Self::Overdue, Self::Paid)
        )
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "UPCOMING",
            Self::Overdue => "OVERDUE",
            Self::Paid => "PAID",
        }
    }
}

impl std::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A BNPL plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan identifier.
    pub id: PlanId,
    /// Owning user.
    pub user_id: UserId,
    /// Financed amount; equals the sum of the installments.
    pub total_amount: Amount,
    /// Number of installments in the schedule.
    pub installment_count: u32,
    /// Plan status.
    pub status: PlanStatus,
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// When the plan was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Create an active plan.
    #[must_use]
    pub fn new(
        user_id: UserId,
        total_amount: Amount,
        installment_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PlanId::generate(),
            user_id,
            total_amount,
            installment_count,
            status: PlanStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the plan completed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the plan is active.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != PlanStatus::Active {
            return Err(BnplError::InvalidState {
                entity: "plan",
                id: self.id.to_string(),
                from: self.status.to_string(),
                to: PlanStatus::Completed.to_string(),
            });
        }
        self.status = PlanStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    /// Whether a plan with these installments should be completed.
    #[must_use]
    pub fn is_fully_paid(installments: &[Installment]) -> bool {
        !installments.is_empty()
            && installments
                .iter()
                .all(|i| i.status == InstallmentStatus::Paid)
    }
}

/// One line of a freshly computed repayment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// 1-based position in the plan.
    pub sequence: u32,
    /// Amount due.
    pub amount_due: Amount,
    /// Due date.
    pub due_date: NaiveDate,
}

/// Compute the installment schedule for a new plan.
///
/// Installment `i` (1-based) is due `interval_days * i` days after `start`.
/// Amounts are split with the last installment absorbing the remainder.
///
/// # Errors
///
/// Returns `Validation` if `count` is outside `1..=12`, the total is not
/// positive, or the total is too small to give every installment a cent.
pub fn build_schedule(
    total: Amount,
    count: u32,
    start: NaiveDate,
    interval_days: u32,
) -> Result<Vec<ScheduleEntry>> {
    if !(MIN_INSTALLMENT_COUNT..=MAX_INSTALLMENT_COUNT).contains(&count) {
        return Err(BnplError::Validation(format!(
            "installment_count must be between {MIN_INSTALLMENT_COUNT} and {MAX_INSTALLMENT_COUNT}, got {count}"
        )));
    }
    if !total.is_positive() {
        return Err(BnplError::Validation(
            "total_amount must be greater than zero".into(),
        ));
    }

    let shares = total
        .split(count)
        .map_err(|e| BnplError::Validation(e.to_string()))?;

    Ok(shares
        .into_iter()
        .zip(1..)
        .map(|(amount_due, sequence)| ScheduleEntry {
            sequence,
            amount_due,
            due_date: start + Duration::days(i64::from(interval_days) * i64::from(sequence)),
        })
        .collect())
}

/// A single scheduled payment within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Installment identifier.
    pub id: InstallmentId,
    /// Owning plan.
    pub plan_id: PlanId,
    /// Owner of the plan, kept here for per-user queries.
    pub user_id: UserId,
    /// 1-based position in the plan.
    pub sequence: u32,
    /// Amount due.
    pub amount_due: Amount,
    /// Due date.
    pub due_date: NaiveDate,
    /// Installment status.
    pub status: InstallmentStatus,
    /// When the installment was paid; set exactly once.
    pub paid_at: Option<DateTime<Utc>>,
    /// When the installment was created.
    pub created_at: DateTime<Utc>,
    /// When the installment was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Installment {
    /// Create an upcoming installment for `plan` from a schedule entry.
    #[must_use]
    pub fn scheduled(plan: &Plan, entry: ScheduleEntry, now: DateTime<Utc>) -> Self {
        Self {
            id: InstallmentId::generate(),
            plan_id: plan.id,
            user_id: plan.user_id.clone(),
            sequence: entry.sequence,
            amount_due: entry.amount_due,
            due_date: entry.due_date,
            status: InstallmentStatus::Upcoming,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the overdue sweep should pick this installment up.
    #[must_use]
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status == InstallmentStatus::Upcoming && self.due_date < today
    }

    /// Move the installment from `UPCOMING` to `OVERDUE`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the installment is upcoming, and
    /// `Validation` if its due date is not strictly before `today`.
    pub fn mark_overdue(&mut self, today: NaiveDate, now: DateTime<Utc>) -> Result<()> {
        self.transition(InstallmentStatus::Overdue)?;
        if self.due_date >= today {
            return Err(BnplError::Validation(format!(
                "installment {} is not due until {}",
                self.id, self.due_date
            )));
        }
        self.status = InstallmentStatus::Overdue;
        self.updated_at = now;
        Ok(())
    }

    /// Move the installment from `OVERDUE` to `PAID`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the installment is overdue.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(InstallmentStatus::Paid)?;
        self.status = InstallmentStatus::Paid;
        self.paid_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn transition(&self, next: InstallmentStatus) -> Result<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(BnplError::InvalidState {
                entity: "installment",
                id: self.id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            })
        }
    }
}

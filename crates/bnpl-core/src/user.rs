//! User types.
//!
//! A user's debt status is derived from their installments: `DebtUser` iff at
//! least one installment across all of the user's plans is overdue. Clients
//! never set it; the ledger recomputes it through [`User::reconcile_status`]
//! inside the same unit of work as the installment write that could change it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Debt status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// No overdue installments.
    Normal,

    /// At least one overdue installment; barred from opening new plans.
    DebtUser,
}

impl UserStatus {
    /// The status implied by whether the user has overdue installments.
    #[must_use]
    pub const fn derived(has_overdue: bool) -> Self {
        if has_overdue {
            Self::DebtUser
        } else {
            Self::Normal
        }
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::DebtUser => "DEBT_USER",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration input for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Stable upstream identifier.
    pub user_id: UserId,
    /// Full legal name.
    pub full_name: String,
    /// Phone number in international format.
    pub phone_number: String,
    /// Passport number.
    pub passport_number: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Primary card number, if on file.
    #[serde(default)]
    pub card_number: Option<String>,
}

/// A BNPL customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable upstream identifier.
    pub user_id: UserId,
    /// Full legal name.
    pub full_name: String,
    /// Phone number in international format.
    pub phone_number: String,
    /// Passport number.
    pub passport_number: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Primary card number, if on file.
    pub card_number: Option<String>,
    /// Derived debt status.
    pub status: UserStatus,
    /// When the user was registered.
    pub created_at: DateTime<Utc>,
    /// When the user was last modified.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Register a new user with `Normal` status.
    #[must_use]
    pub fn new(input: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            user_id: input.user_id,
            full_name: input.full_name,
            phone_number: input.phone_number,
            passport_number: input.passport_number,
            date_of_birth: input.date_of_birth,
            card_number: input.card_number,
            status: UserStatus::Normal,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the user may open a new plan.
    #[must_use]
    pub fn is_eligible_for_plan(&self) -> bool {
        self.status == UserStatus::Normal
    }

    /// Bring `status` in line with the user's overdue installments.
    ///
    /// Returns the previous status if it changed.
    pub fn reconcile_status(&mut self, has_overdue: bool, now: DateTime<Utc>) -> Option<UserStatus> {
        let target = UserStatus::derived(has_overdue);
        if self.status == target {
            return None;
        }
        let previous = self.status;
        self.status = target;
        self.updated_at = now;
        Some(previous)
    }

    /// A view of the user with sensitive fields masked.
    #[must_use]
    pub fn masked(&self) -> MaskedUser {
        MaskedUser::from(self)
    }
}

/// A user as shown to API clients, with sensitive fields masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedUser {
    /// Stable upstream identifier.
    pub user_id: UserId,
    /// Full name (not masked).
    pub full_name: String,
    /// Masked phone number.
    pub phone_number: String,
    /// Masked passport number.
    pub passport_number: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Masked card number.
    pub card_number: String,
    /// Derived debt status.
    pub status: UserStatus,
    /// When the user was registered.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for MaskedUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            full_name: user.full_name.clone(),
            phone_number: mask_phone(&user.phone_number),
            passport_number: mask_passport(&user.passport_number),
            date_of_birth: user.date_of_birth,
            card_number: mask_card(user.card_number.as_deref()),
            status: user.status,
            created_at: user.created_at,
        }
    }
}

fn head(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn tail(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(n)).collect()
}

/// Mask a phone number as `+998****4567`.
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.chars().count() > 7 {
        format!("+{}****{}", head(digits, 3), tail(digits, 4))
    } else {
        "****".to_string()
    }
}

/// Passports are never shown, whatever their value.
#[must_use]
pub fn mask_passport(_passport: &str) -> String {
    "AA*******".to_string()
}

/// Mask a card number as `4111 **** **** 1111`.
#[must_use]
pub fn mask_card(card: Option<&str>) -> String {
    match card {
        Some(card) if card.chars().count() >= 8 => {
            format!("{} **** **** {}", head(card, 4), tail(card, 4))
        }
        _ => "**** **** **** ****".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::new(
            NewUser {
                user_id: "mock-usr-001".parse().unwrap(),
                full_name: "John Doe".into(),
                phone_number: "+998901234567".into(),
                passport_number: "AA1234567".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 20).unwrap(),
                card_number: Some("4111111111111111".into()),
            },
            Utc::now(),
        )
    }

    #[test]
    fn new_user_is_normal() {
        let user = sample();
        assert_eq!(user.status, UserStatus::Normal);
        assert!(user.is_eligible_for_plan());
    }

    #[test]
    fn reconcile_follows_overdue_flag() {
        let mut user = sample();
        let now = Utc::now();

        assert_eq!(user.reconcile_status(false, now), None);
        assert_eq!(user.reconcile_status(true, now), Some(UserStatus::Normal));
        assert_eq!(user.status, UserStatus::DebtUser);
        assert!(!user.is_eligible_for_plan());
        assert_eq!(user.reconcile_status(true, now), None);
        assert_eq!(user.reconcile_status(false, now), Some(UserStatus::DebtUser));
        assert_eq!(user.status, UserStatus::Normal);
    }

    #[test]
    fn masking_hides_sensitive_fields() {
        let masked = sample().masked();
        assert_eq!(masked.full_name, "John Doe");
        assert_eq!(masked.phone_number, "+998****4567");
        assert_eq!(masked.passport_number, "AA*******");
        assert_eq!(masked.card_number, "4111 **** **** 1111");
    }

    #[test]
    fn masking_short_values() {
        assert_eq!(mask_phone("12345"), "****");
        assert_eq!(mask_card(Some("1234")), "**** **** **** ****");
        assert_eq!(mask_card(None), "**** **** **** ****");
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_string(&UserStatus::DebtUser).unwrap(),
            "\"DEBT_USER\""
        );
        assert_eq!(UserStatus::Normal.to_string(), "NORMAL");
    }
}

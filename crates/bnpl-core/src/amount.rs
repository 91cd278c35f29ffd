//! Exact monetary amounts.
//!
//! Amounts are stored as `i64` minor units (cents) so that installment sums and
//! debt totals never lose precision. On the wire they are rendered as
//! two-decimal strings (`"1500.00"`), matching a `DECIMAL(12, 2)` column.

use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest representable amount in cents (`9999999999.99`).
pub const MAX_AMOUNT_CENTS: i64 = 999_999_999_999;

/// A non-negative amount of money with exactly two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from cents.
    ///
    /// # Errors
    ///
    /// Returns an error if `cents` is negative or above [`MAX_AMOUNT_CENTS`].
    pub const fn from_cents(cents: i64) -> Result<Self, AmountError> {
        if cents < 0 {
            return Err(AmountError::Negative);
        }
        if cents > MAX_AMOUNT_CENTS {
            return Err(AmountError::TooLarge);
        }
        Ok(Self(cents))
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Add two amounts, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Split the amount into `parts` installments.
    ///
    /// Every part receives `floor(total / parts)` cents and the last part
    /// absorbs the remainder, so the parts always sum to `self` exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if `parts` is zero or the amount is too small for
    /// every part to be at least one cent.
    pub fn split(self, parts: u32) -> Result<Vec<Self>, AmountError> {
        if parts == 0 {
            return Err(AmountError::InvalidSplit { parts });
        }
        let count = i64::from(parts);
        if self.0 < count {
            return Err(AmountError::InvalidSplit { parts });
        }

        let base = self.0 / count;
        let last = self.0 - base * (count - 1);

        let mut shares = vec![Self(base); (parts - 1) as usize];
        shares.push(Self(last));
        Ok(shares)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if s.contains('.') && fraction.is_empty() {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if fraction.len() > 2 {
            return Err(AmountError::TooPrecise(s.to_string()));
        }

        let whole = whole.trim_start_matches('0');
        if whole.len() > 10 {
            return Err(AmountError::TooLarge);
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| AmountError::Malformed(s.to_string()))?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            _ => fraction.parse::<i64>().unwrap_or(0),
        };

        Self::from_cents(whole * 100 + fraction)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|a| a.0).fold(0_i64, i64::saturating_add))
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepted wire representations of an amount.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Text(String),
    Integer(u64),
    Float(f64),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match AmountRepr::deserialize(deserializer)? {
            AmountRepr::Text(text) => text,
            AmountRepr::Integer(n) => n.to_string(),
            AmountRepr::Float(f) => f.to_string(),
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors produced when building or parsing amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The text is not a decimal number.
    #[error("malformed amount: {0:?}")]
    Malformed(String),

    /// More than two decimal places.
    #[error("amount has more than two decimal places: {0:?}")]
    TooPrecise(String),

    /// Negative amounts are not allowed.
    #[error("amount must not be negative")]
    Negative,

    /// Above `9999999999.99`.
    #[error("amount exceeds 9999999999.99")]
    TooLarge,

    /// The amount cannot be split into the requested number of parts.
    #[error("cannot split amount into {parts} positive installments")]
    InvalidSplit {
        /// Requested number of parts.
        parts: u32,
    },
}

//! Fixed-point currency with two decimal places

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Largest accepted amount: 99,999,999.99
const MAX_CENTS: i64 = 9_999_999_999;

/// Amount of money stored as a whole number of cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct Money(i64);

/// Reasons an amount string is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Enter an amount.")]
    Empty,

    #[error("Enter a number.")]
    Invalid,

    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimals,

    #[error("Ensure this value is greater than 0.")]
    NotPositive,

    #[error("Ensure that there are no more than 10 digits in total.")]
    TooLarge,
}

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(MoneyError::Empty);
        }

        let (negative, unsigned) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };

        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(MoneyError::Invalid);
        }
        if fraction.len() > 2 {
            return Err(MoneyError::TooManyDecimals);
        }

        let whole = whole.trim_start_matches('0');
        if whole.len() > 8 {
            return Err(MoneyError::TooLarge);
        }

        let units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyError::Invalid)?
        };
        let mut cents_part: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| MoneyError::Invalid)?
        };
        if fraction.len() == 1 {
            cents_part *= 10;
        }

        let cents = units * 100 + cents_part;
        if negative || cents == 0 {
            return Err(MoneyError::NotPositive);
        }
        if cents > MAX_CENTS {
            return Err(MoneyError::TooLarge);
        }

        Ok(Money(cents))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

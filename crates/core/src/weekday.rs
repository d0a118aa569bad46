//! ISO-8601 weekday numbering (1 = Monday … 7 = Sunday).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult, ValueObject};

/// A scheduled day of the week.
///
/// Numbering matches Postgres `EXTRACT(ISODOW FROM date)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Weekday(u8);

impl Weekday {
    pub const MONDAY: Weekday = Weekday(1);
    pub const SUNDAY: Weekday = Weekday(7);

    pub fn from_number(n: i64) -> DomainResult<Self> {
        if (1..=7).contains(&n) {
            Ok(Self(n as u8))
        } else {
            Err(DomainError::validation(format!(
                "weekday must be between 1 (Monday) and 7 (Sunday), got {n}"
            )))
        }
    }

    /// Weekday on which `date` falls.
    pub fn of(date: NaiveDate) -> Self {
        Self(date.weekday().number_from_monday() as u8)
    }

    pub fn number(&self) -> i16 {
        i16::from(self.0)
    }
}

impl ValueObject for Weekday {}

impl TryFrom<i64> for Weekday {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_number(value)
    }
}

impl From<Weekday> for i16 {
    fn from(value: Weekday) -> Self {
        value.number()
    }
}

impl core::fmt::Display for Weekday {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

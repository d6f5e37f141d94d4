use crate::error::LedgerError;
use chrono::{Datelike, Days, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, which is what each period sheet of the ledger represents.
///
/// The active period sheet is titled with the upper-case abbreviation (`JAN`); the full name
/// (`January`) is used for display and for archive titles.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Period(Month);

impl Period {
    pub fn new(month: Month) -> Self {
        Self(month)
    }

    /// The period that `date` falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self(month_of(date))
    }

    /// The period after the one `date` falls in. This is computed as the first of `date`'s month
    /// plus 32 days, which always lands in the next month whatever the current month's length.
    pub fn following(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let next = first.checked_add_days(Days::new(32)).unwrap_or(first);
        Self(month_of(next))
    }

    pub fn month(&self) -> Month {
        self.0
    }

    /// Upper-case three letter abbreviation, e.g. `JAN`. This is the active sheet's title.
    pub fn abbreviation(&self) -> String {
        self.0.name()[..3].to_uppercase()
    }

    /// e.g. `January`
    pub fn full_name(&self) -> &'static str {
        self.0.name()
    }
}

impl FromStr for Period {
    type Err = LedgerError;

    /// Accepts an abbreviation or a full month name in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::from_str(s.trim())
            .map(Self)
            .map_err(|_| LedgerError::InvalidMonth(s.to_string()))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

fn month_of(date: NaiveDate) -> Month {
    // `month()` is always in 1..=12
    Month::try_from(date.month() as u8).unwrap_or(Month::January)
}

//! Price type for the amount charged for a piece of work.
//!
//! Prices are typed by users in chat, so they arrive as `10.50`, `$10.50` or `$1,000`. This module
//! parses those into a `Decimal` while remembering the text the user typed, which is what gets
//! written to the sheet so that the sheet's own number parsing applies to it.

use crate::error::LedgerError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A non-negative price.
///
/// # Examples
///
/// ```
/// # use ledger_bot::model::Price;
/// # use std::str::FromStr;
/// let price = Price::from_str("$1,250.50").unwrap();
/// assert_eq!(price.as_entered(), "$1,250.50");
/// assert_eq!(price.to_string(), "$1,250.50");
///
/// assert!(Price::from_str("abc").is_err());
/// assert!(Price::from_str("-5").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Price {
    value: Decimal,
    entered: String,
}

impl Price {
    /// The trimmed text this price was parsed from.
    pub fn as_entered(&self) -> &str {
        &self.entered
    }
}

impl FromStr for Price {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidPrice(s.to_string());
        let trimmed = s.trim();
        let without_dollar = trimmed.strip_prefix('$').unwrap_or(trimmed);

        // Remove commas (thousand separators)
        let without_commas = without_dollar.replace(',', "");
        if without_commas.is_empty() {
            return Err(invalid());
        }

        let value = Decimal::from_str(&without_commas).map_err(|_| invalid())?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(invalid());
        }
        Ok(Price {
            value,
            entered: trimmed.to_string(),
        })
    }
}

impl fmt::Display for Price {
    /// Always displayed as dollars with two decimal places and thousands separators.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}",
            format_num::format_num!(",.2", self.value.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.entered)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Price::from_str(&s).map_err(serde::de::Error::custom)
    }
}

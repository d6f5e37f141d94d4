//! Types that represent the ledger's data model, such as `Record`, `Price` and `Period`.
mod period;
mod price;
mod range;
mod record;

pub use period::Period;
pub use price::Price;
pub use range::{column_letters, A1Range};
pub use record::{short_link, Record, Removed, MISSING, UNPAID};
use serde::{Deserialize, Serialize};

/// The summary statistics a period sheet computes for itself.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Full month name, e.g. `January`. Empty when the summary could not be read.
    pub month: String,
    pub earned: String,
    pub pending: String,
    pub work_done: String,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            month: String::new(),
            earned: "$0.00".to_string(),
            pending: "$0.00".to_string(),
            work_done: "0".to_string(),
        }
    }
}

/// The outcome of ending a month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RollOver {
    /// The summary of the month that was archived.
    pub summary: Summary,
    /// The title of the hidden archive sheet, e.g. `January ($120.00)`.
    pub archive_title: String,
    /// The period that is now active.
    pub next: Period,
}

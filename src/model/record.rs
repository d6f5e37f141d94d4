use serde::{Deserialize, Serialize};

/// Cell values that count as "nothing here" when deciding whether a row holds a record.
const EMPTY_SENTINELS: &[&str] = &["N/A", "", "FALSE", "No"];

/// Shown for a creator, link or price cell that the sheet returned nothing for.
pub const MISSING: &str = "N/A";

/// Shown for a paid cell that the sheet returned nothing for.
pub const UNPAID: &str = "No";

/// One row of the ledger. A record has no identity other than the row it sits in.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub creator: String,
    pub link: String,
    pub price: String,
    pub paid: String,
}

impl Record {
    pub fn new(
        creator: impl Into<String>,
        link: impl Into<String>,
        price: impl Into<String>,
        paid: impl Into<String>,
    ) -> Self {
        Self {
            creator: creator.into(),
            link: link.into(),
            price: price.into(),
            paid: paid.into(),
        }
    }

    /// A record is present unless every tracked cell is empty or an empty sentinel. Rows cleared
    /// by a soft delete, and rows never written, are not present.
    pub fn is_present(&self) -> bool {
        [&self.creator, &self.link, &self.price, &self.paid]
            .iter()
            .any(|value| !EMPTY_SENTINELS.contains(&value.as_str()))
    }

    /// `Yes` when the paid cell holds `yes` or `true` in any case, otherwise `No`.
    pub fn paid_display(&self) -> &'static str {
        if is_truthy(&self.paid) {
            "Yes"
        } else {
            "No"
        }
    }

    /// The trailing path segment of the link, e.g. `hv1xR5r.png`.
    pub fn short_link(&self) -> &str {
        short_link(&self.link)
    }
}

/// The trailing path segment of `link`.
pub fn short_link(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true")
}

/// What a remove-recent call captured from a row just before clearing it.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Removed {
    pub creator: String,
    pub link: String,
    pub price: String,
}

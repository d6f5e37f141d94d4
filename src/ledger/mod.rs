//! Ledger operations: the spreadsheet treated as an append-only log with soft deletes and a
//! monthly roll-over.
//!
//! A record's only identity is its row. Records are appended below the last used row of the
//! `Logs` tab, removed by clearing their cells (rows never move), and each month's tab computes
//! its own summary statistics in fixed cells.

pub mod layout;
mod rollover;

use crate::api::{Sheet, ValueInput};
use crate::error::LedgerError;
use crate::model::{A1Range, Period, Price, Record, Removed, Summary, MISSING, UNPAID};
use crate::Result;
use anyhow::Context;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info};

/// The ledger operations, performed against a `Sheet`.
#[derive(Clone)]
pub struct Ledger {
    sheet: Arc<dyn Sheet>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}

impl Ledger {
    pub fn new(sheet: Arc<dyn Sheet>) -> Self {
        Self { sheet }
    }

    /// Appends a record for `creator` below the last used row of the Logs tab.
    ///
    /// `price` must parse as a non-negative number; otherwise `LedgerError::InvalidPrice` is
    /// returned and nothing is written. The paid column is blanked, so the new record reads as
    /// unpaid even when it lands on a row that was soft-deleted.
    pub async fn append(&self, creator: &str, link: &str, price: &str) -> Result<()> {
        let creator = creator.trim();
        if creator.is_empty() {
            return Err(LedgerError::EmptyField("creator").into());
        }
        let price = Price::from_str(price)?;

        let column = self
            .sheet
            .get(&logs(layout::CREATOR_COLUMN)?)
            .await
            .context("Unable to find the next free row")?;
        // The API trims trailing empty rows, so the column's length is the last used row.
        let row = column.len().max(layout::HEADER_ROWS);

        let range = A1Range::row(
            layout::LOGS,
            row,
            layout::APPEND_FIRST_COL,
            layout::APPEND_LAST_COL,
        );
        let values = vec![vec![
            String::new(),
            String::new(),
            creator.to_string(),
            String::new(),
            link.to_string(),
            String::new(),
            price.as_entered().to_string(),
            String::new(),
            String::new(),
            String::new(),
        ]];
        self.sheet
            .update(&range, values, ValueInput::UserEntered)
            .await
            .with_context(|| format!("Unable to write the record to {range}"))?;
        info!("Added a record for {creator} at {range}");
        Ok(())
    }

    /// Soft-deletes the `count` most recent records by clearing their creator, link and price
    /// cells. Returns what was removed, oldest first.
    ///
    /// `count` is clamped to the number of rows below the header band. A ledger with no records is
    /// left alone and an empty list is returned.
    pub async fn remove_recent(&self, count: i64) -> Result<Vec<Removed>> {
        if count < 1 {
            return Err(LedgerError::InvalidCount(count).into());
        }
        let ranges = layout::TRACKED_COLUMNS
            .iter()
            .map(|cells| logs(cells))
            .collect::<Result<Vec<_>>>()?;
        let columns = self
            .sheet
            .batch_get(&ranges)
            .await
            .context("Unable to read the recent records")?;

        let max_rows = columns.iter().map(Vec::len).max().unwrap_or_default();
        if max_rows <= layout::HEADER_ROWS {
            debug!("No records to remove");
            return Ok(Vec::new());
        }
        let to_remove = usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(max_rows - layout::HEADER_ROWS);

        let mut removed = Vec::with_capacity(to_remove);
        let mut cells = Vec::with_capacity(to_remove * layout::TRACKED_COLUMNS.len());
        for row in (max_rows - to_remove..max_rows).rev() {
            // Snapshot before anything is cleared
            removed.push(Removed {
                creator: cell(&columns, 0, row).unwrap_or_default(),
                link: cell(&columns, 1, row).unwrap_or_default(),
                price: cell(&columns, 2, row).unwrap_or_default(),
            });
            for range in &ranges {
                cells.push(A1Range::row(
                    layout::LOGS,
                    row,
                    range.first_col(),
                    range.first_col(),
                ));
            }
        }

        self.sheet
            .clear(&cells)
            .await
            .context("Unable to clear the recent records")?;
        info!("Removed {} record(s)", removed.len());

        removed.reverse();
        Ok(removed)
    }

    /// Reads the summary cells of the tab for `month` (an abbreviation or name in any case).
    ///
    /// This never fails: if the month is not recognized or its tab cannot be read, the result is
    /// `false` with a zero-valued summary.
    pub async fn summarize(&self, month: &str) -> (bool, Summary) {
        let result = match Period::from_str(month) {
            Ok(period) => self.summary(period).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(summary) => (true, summary),
            Err(e) => {
                error!("Error fetching summary: {e:#}");
                (false, Summary::default())
            }
        }
    }

    /// Reads the summary cells of the tab for `period`. Blank cells read as zero.
    pub async fn summary(&self, period: Period) -> Result<Summary> {
        Ok(self.summary_cells(period).await?.into_summary(period))
    }

    /// Reads the summary cells of the tab for `period` as they are, blank cells being `None`.
    async fn summary_cells(&self, period: Period) -> Result<SummaryCells> {
        let sheet = period.abbreviation();
        let ranges = [
            layout::EARNED_CELL,
            layout::PENDING_CELL,
            layout::WORK_DONE_CELL,
        ]
        .iter()
        .map(|cell| A1Range::on(sheet.as_str(), cell))
        .collect::<Result<Vec<_>>>()?;

        let values = self
            .sheet
            .batch_get(&ranges)
            .await
            .with_context(|| format!("Unable to read the summary of {sheet}"))?;

        Ok(SummaryCells {
            earned: cell(&values, 0, 0),
            pending: cell(&values, 1, 0),
            work_done: cell(&values, 2, 0),
        })
    }

    /// Lists the records on the Logs tab, skipping rows that hold nothing. When `creator` is given
    /// only that creator's records are returned.
    pub async fn records(&self, creator: Option<&str>) -> Result<Vec<Record>> {
        let ranges = layout::RECORD_COLUMNS
            .iter()
            .map(|cells| logs(cells))
            .collect::<Result<Vec<_>>>()?;
        let columns = self
            .sheet
            .batch_get(&ranges)
            .await
            .context("Unable to read the records")?;

        let max_rows = columns.iter().map(Vec::len).max().unwrap_or_default();
        let records = (0..max_rows)
            .map(|row| Record {
                creator: cell(&columns, 0, row).unwrap_or_else(|| MISSING.to_string()),
                link: cell(&columns, 1, row).unwrap_or_else(|| MISSING.to_string()),
                price: cell(&columns, 2, row).unwrap_or_else(|| MISSING.to_string()),
                paid: cell(&columns, 3, row).unwrap_or_else(|| UNPAID.to_string()),
            })
            .filter(Record::is_present)
            .filter(|record| creator.map_or(true, |c| record.creator == c))
            .collect();
        Ok(records)
    }

    /// Reads the list of known creators from the Logs tab, skipping blank cells.
    pub async fn creators(&self) -> Result<Vec<String>> {
        let range = logs(layout::CREATORS)?;
        let values = self
            .sheet
            .get(&range)
            .await
            .with_context(|| format!("Unable to read the creators from {range}"))?;
        Ok(values
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .filter(|name| !name.trim().is_empty())
            .collect())
    }
}

struct SummaryCells {
    earned: Option<String>,
    pending: Option<String>,
    work_done: Option<String>,
}

impl SummaryCells {
    fn into_summary(self, period: Period) -> Summary {
        let defaults = Summary::default();
        Summary {
            month: period.full_name().to_string(),
            earned: self.earned.unwrap_or(defaults.earned),
            pending: self.pending.unwrap_or(defaults.pending),
            work_done: self.work_done.unwrap_or(defaults.work_done),
        }
    }
}

/// A range on the Logs tab.
fn logs(cells: &str) -> Result<A1Range> {
    A1Range::on(layout::LOGS, cells)
}

/// The value at `row` of the single-column grid `columns[col]`, or `None` when the store returned
/// nothing there.
fn cell(columns: &[Vec<Vec<String>>], col: usize, row: usize) -> Option<String> {
    columns
        .get(col)
        .and_then(|grid| grid.get(row))
        .and_then(|values| values.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorType, LedgerError};
    use crate::model::{Record, Removed, Summary};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_append_then_fetch() {
        let env = TestEnv::new();
        env.ledger()
            .append("carol", "https://i.ibb.co/x/third.png", "7.25")
            .await
            .unwrap();

        assert_eq!(env.sheet().cell("Logs", "C9").unwrap(), "carol");
        assert_eq!(env.sheet().cell("Logs", "E9").unwrap(), "https://i.ibb.co/x/third.png");
        assert_eq!(env.sheet().cell("Logs", "G9").unwrap(), "7.25");

        let records = env.ledger().records(None).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[2],
            Record::new("carol", "https://i.ibb.co/x/third.png", "7.25", "No")
        );
    }

    #[tokio::test]
    async fn test_append_never_overwrites() {
        let env = TestEnv::new();
        env.ledger().append("a", "l1", "1").await.unwrap();
        env.ledger().append("b", "l2", "2").await.unwrap();
        assert_eq!(env.sheet().cell("Logs", "C7").unwrap(), "alice");
        assert_eq!(env.sheet().cell("Logs", "C8").unwrap(), "bob");
        assert_eq!(env.sheet().cell("Logs", "C9").unwrap(), "a");
        assert_eq!(env.sheet().cell("Logs", "C10").unwrap(), "b");
    }

    #[tokio::test]
    async fn test_append_over_removed_paid_row_is_unpaid() {
        let env = TestEnv::new();
        assert_eq!(env.sheet().cell("Logs", "J7").unwrap(), "TRUE");
        env.ledger().remove_recent(2).await.unwrap();
        env.ledger().append("carol", "l", "5").await.unwrap();

        let records = env.ledger().records(None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], Record::new("carol", "l", "5", "No"));
        assert_eq!(records[0].paid_display(), "No");
        assert_eq!(env.sheet().cell("Logs", "J7").unwrap(), "");
    }

    #[tokio::test]
    async fn test_append_into_empty_ledger_starts_below_header() {
        let env = TestEnv::new();
        env.ledger().remove_recent(10).await.unwrap();
        env.sheet().set_cell("Logs", "C6", "").unwrap();
        env.sheet().set_cell("Logs", "C1", "").unwrap();

        env.ledger().append("dave", "l", "3").await.unwrap();
        assert_eq!(env.sheet().cell("Logs", "C7").unwrap(), "dave");
    }

    #[tokio::test]
    async fn test_append_invalid_price_writes_nothing() {
        let env = TestEnv::new();
        let e = env.ledger().append("carol", "l", "abc").await.unwrap_err();
        assert_eq!(
            e.downcast_ref::<LedgerError>(),
            Some(&LedgerError::InvalidPrice("abc".to_string()))
        );
        assert_eq!(env.sheet().calls().update, 0);
        assert_eq!(env.sheet().calls().get, 0);
    }

    #[tokio::test]
    async fn test_append_requires_creator() {
        let env = TestEnv::new();
        let e = env.ledger().append("  ", "l", "1").await.unwrap_err();
        assert_eq!(ErrorType::of(&e), ErrorType::InvalidInput);
        assert_eq!(env.sheet().calls().update, 0);
    }

    #[tokio::test]
    async fn test_append_remote_failure() {
        let env = TestEnv::new();
        env.sheet().set_offline(true);
        let e = env.ledger().append("carol", "l", "1").await.unwrap_err();
        assert_eq!(ErrorType::of(&e), ErrorType::Remote);
    }

    #[tokio::test]
    async fn test_remove_recent_one() {
        let env = TestEnv::new();
        let removed = env.ledger().remove_recent(1).await.unwrap();
        assert_eq!(
            removed,
            vec![Removed {
                creator: "bob".to_string(),
                link: "https://i.ibb.co/d4e5f6/second.png".to_string(),
                price: "12.50".to_string(),
            }]
        );
        assert_eq!(env.sheet().cell("Logs", "C8").unwrap(), "");
        assert_eq!(env.sheet().cell("Logs", "E8").unwrap(), "");
        assert_eq!(env.sheet().cell("Logs", "G8").unwrap(), "");
        // Only the tracked columns are cleared
        assert_eq!(env.sheet().cell("Logs", "J8").unwrap(), "FALSE");
        assert_eq!(env.sheet().cell("Logs", "C7").unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_remove_recent_clamps_and_orders_oldest_first() {
        let env = TestEnv::new();
        env.ledger().append("carol", "l3", "3").await.unwrap();
        let removed = env.ledger().remove_recent(10).await.unwrap();
        let creators: Vec<&str> = removed.iter().map(|r| r.creator.as_str()).collect();
        assert_eq!(creators, vec!["alice", "bob", "carol"]);
        // The header band is untouched
        assert_eq!(env.sheet().cell("Logs", "C6").unwrap(), "Creator");
        assert_eq!(env.sheet().cell("Logs", "C1").unwrap(), "Work Log");
    }

    #[tokio::test]
    async fn test_remove_recent_empty_ledger_is_noop() {
        let env = TestEnv::new();
        assert_eq!(env.ledger().remove_recent(5).await.unwrap().len(), 2);
        let clears = env.sheet().calls().clear;
        let removed = env.ledger().remove_recent(1).await.unwrap();
        assert!(removed.is_empty());
        assert_eq!(env.sheet().calls().clear, clears);
    }

    #[tokio::test]
    async fn test_remove_recent_missing_cell_is_empty_string() {
        let env = TestEnv::new();
        env.sheet().set_cell("Logs", "E8", "").unwrap();
        let removed = env.ledger().remove_recent(1).await.unwrap();
        assert_eq!(removed[0].creator, "bob");
        assert_eq!(removed[0].link, "");
    }

    #[tokio::test]
    async fn test_remove_recent_rejects_non_positive() {
        let env = TestEnv::new();
        let e = env.ledger().remove_recent(0).await.unwrap_err();
        assert_eq!(
            e.downcast_ref::<LedgerError>(),
            Some(&LedgerError::InvalidCount(0))
        );
        assert_eq!(env.sheet().calls().batch_get, 0);
    }

    #[tokio::test]
    async fn test_soft_deleted_rows_are_not_listed() {
        let env = TestEnv::new();
        env.sheet().set_cell("Logs", "C7", "").unwrap();
        env.sheet().set_cell("Logs", "E7", "").unwrap();
        env.sheet().set_cell("Logs", "G7", "").unwrap();
        env.sheet().set_cell("Logs", "J7", "FALSE").unwrap();
        let records = env.ledger().records(None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].creator, "bob");
    }

    #[tokio::test]
    async fn test_records_filter() {
        let env = TestEnv::new();
        let records = env.ledger().records(Some("alice")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].paid_display(), "Yes");
        assert!(env.ledger().records(Some("zed")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_creators() {
        let env = TestEnv::new();
        let creators = env.ledger().creators().await.unwrap();
        assert_eq!(creators, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_summarize() {
        let env = TestEnv::new();
        let (success, summary) = env.ledger().summarize("jan").await;
        assert!(success);
        assert_eq!(
            summary,
            Summary {
                month: "January".to_string(),
                earned: "$22.50".to_string(),
                pending: "$12.50".to_string(),
                work_done: "2".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_summarize_blank_cell_reads_zero() {
        let env = TestEnv::new();
        env.sheet().set_cell("JAN", "Q18", "").unwrap();
        let (success, summary) = env.ledger().summarize("JAN").await;
        assert!(success);
        assert_eq!(summary.pending, "$0.00");
    }

    #[tokio::test]
    async fn test_summarize_missing_sheet() {
        let env = TestEnv::new();
        let (success, summary) = env.ledger().summarize("FEB").await;
        assert!(!success);
        assert_eq!(summary.month, "");
        assert_eq!(summary.earned, "$0.00");
        assert_eq!(summary.pending, "$0.00");
        assert_eq!(summary.work_done, "0");
    }

    #[tokio::test]
    async fn test_summarize_unknown_month() {
        let env = TestEnv::new();
        let (success, summary) = env.ledger().summarize("Smarch").await;
        assert!(!success);
        assert_eq!(summary, Summary::default());
        assert_eq!(env.sheet().calls().batch_get, 0);
    }
}

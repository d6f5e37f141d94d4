//! Handlers that add, remove and list records.

use crate::args::AddArgs;
use crate::commands::{App, Out};
use crate::model::{Record, Removed};
use crate::Result;
use anyhow::Context;

/// Adds a record for `args.creator()` to the Logs tab.
///
/// # Errors
///
/// - `LedgerError::InvalidPrice` if the price is not a non-negative number. Nothing is written.
/// - `LedgerError::EmptyField` if the creator is blank.
/// - Any failure of the spreadsheet.
pub async fn add(app: &App, args: &AddArgs) -> Result<Out<Record>> {
    app.ledger()
        .append(args.creator(), args.link(), args.price())
        .await
        .context("Failed to add record")?;
    let record = Record::new(args.creator().trim(), args.link(), args.price().trim(), "No");
    Ok(Out::new(
        format!(
            "Added a record for {} at {}",
            record.creator,
            display_price(&record.price)
        ),
        record,
    ))
}

/// Removes the `count` most recent records. The removed records are returned oldest first; an
/// empty list means there was nothing to remove.
pub async fn remove_recent(app: &App, count: i64) -> Result<Out<Vec<Removed>>> {
    let removed = app
        .ledger()
        .remove_recent(count)
        .await
        .context("Failed to remove records")?;
    let message = match removed.len() {
        0 => "No records to remove.".to_string(),
        1 => "Removed 1 Record".to_string(),
        n => format!("Removed {n} Records"),
    };
    Ok(Out::new(message, removed))
}

/// Lists the records, optionally only those of `filter`. A non-empty listing becomes the one that
/// short links are resolved against.
pub async fn logs(app: &App, filter: Option<&str>) -> Result<Out<Vec<Record>>> {
    let filter = filter.map(str::trim).filter(|f| !f.is_empty());
    let records = app
        .ledger()
        .records(filter)
        .await
        .context("Failed to fetch logs")?;

    if records.is_empty() {
        let message = match filter {
            Some(creator) => format!("No records for {creator}."),
            None => "No records.".to_string(),
        };
        return Ok(Out::new(message, records));
    }

    app.recent().replace(&records).await;
    Ok(Out::new(render_table(&records), records))
}

/// Prices are entered without a currency symbol; show them with one.
pub(crate) fn display_price(price: &str) -> String {
    if price.starts_with('$') {
        price.to_string()
    } else {
        format!("${price}")
    }
}

/// No table cell is wider than this; longer values are cut and end in `~`.
const MAX_CELL_WIDTH: usize = 24;

/// Renders `records` as a fixed-width table of creator, short link, price and paid, one line per
/// record after a header and a rule. Columns are separated by ` | ` and padded to their widest
/// value, up to `MAX_CELL_WIDTH`.
pub fn render_table(records: &[Record]) -> String {
    let clipped: Vec<[String; 4]> = records
        .iter()
        .map(|r| {
            [r.creator.as_str(), r.short_link(), r.price.as_str(), r.paid_display()].map(clip)
        })
        .collect();
    let rows: Vec<[&str; 4]> = clipped
        .iter()
        .map(|row| row.each_ref().map(String::as_str))
        .collect();

    let header = ["Creator", "Link", "Price", "Paid"];
    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut table = String::new();
    push_line(&mut table, &header, &widths);
    let rule = widths.map(|w| "-".repeat(w));
    push_line(&mut table, &rule.each_ref().map(String::as_str), &widths);
    for row in &rows {
        push_line(&mut table, row, &widths);
    }
    table
}

fn clip(value: &str) -> String {
    if value.chars().count() <= MAX_CELL_WIDTH {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(MAX_CELL_WIDTH - 1).collect();
    clipped.push('~');
    clipped
}

fn push_line(table: &mut String, values: &[&str; 4], widths: &[usize; 4]) {
    let cells: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(value, &width)| format!("{value:<width$}"))
        .collect();
    table.push_str(cells.join(" | ").trim_end());
    table.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorType, LedgerError};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_add() {
        let env = TestEnv::new();
        let args = AddArgs::new("carol", "https://i.ibb.co/x/third.png", "7.25");
        let out = add(env.app(), &args).await.unwrap();
        assert_eq!(out.message(), "Added a record for carol at $7.25");
        assert_eq!(out.structure().unwrap().paid, "No");
        assert_eq!(env.sheet().cell("Logs", "C9").unwrap(), "carol");
    }

    #[tokio::test]
    async fn test_add_invalid_price() {
        let env = TestEnv::new();
        let args = AddArgs::new("carol", "https://i.ibb.co/x/third.png", "abc");
        let e = add(env.app(), &args).await.unwrap_err();
        assert_eq!(ErrorType::of(&e), ErrorType::InvalidInput);
        assert_eq!(env.sheet().calls().update, 0);
    }

    #[tokio::test]
    async fn test_remove_recent() {
        let env = TestEnv::new();
        let out = remove_recent(env.app(), 5).await.unwrap();
        assert_eq!(out.message(), "Removed 2 Records");
        let out = remove_recent(env.app(), 1).await.unwrap();
        assert_eq!(out.message(), "No records to remove.");
        assert!(out.structure().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_recent_non_positive() {
        let env = TestEnv::new();
        let e = remove_recent(env.app(), -1).await.unwrap_err();
        assert_eq!(
            e.downcast_ref::<LedgerError>(),
            Some(&LedgerError::InvalidCount(-1))
        );
    }

    #[tokio::test]
    async fn test_logs_fills_recent() {
        let env = TestEnv::new();
        assert!(env.recent().is_empty().await);
        let out = logs(env.app(), None).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 2);
        assert!(out.message().contains("first.png"));
        assert_eq!(
            env.recent().resolve("first.png").await.unwrap(),
            "https://i.ibb.co/a1b2c3/first.png"
        );
    }

    #[tokio::test]
    async fn test_logs_empty_filter_keeps_recent() {
        let env = TestEnv::new();
        logs(env.app(), Some("alice")).await.unwrap();
        let out = logs(env.app(), Some("zed")).await.unwrap();
        assert_eq!(out.message(), "No records for zed.");
        assert_eq!(env.recent().short_links("").await, vec!["first.png"]);
    }

    #[tokio::test]
    async fn test_logs_remote_failure() {
        let env = TestEnv::new();
        env.sheet().set_offline(true);
        let e = logs(env.app(), None).await.unwrap_err();
        assert_eq!(ErrorType::of(&e), ErrorType::Remote);
        assert!(e.to_string().contains("Failed to fetch logs"));
    }

    #[test]
    fn test_render_table() {
        let records = vec![
            Record::new("alice", "https://i.ibb.co/a1b2c3/first.png", "10.00", "TRUE"),
            Record::new("bo", "https://i.ibb.co/d4e5f6/x.png", "7", "No"),
        ];
        let expected = "\
Creator | Link      | Price | Paid
------- | --------- | ----- | ----
alice   | first.png | 10.00 | Yes
bo      | x.png     | 7     | No
";
        assert_eq!(render_table(&records), expected);
    }

    #[test]
    fn test_render_table_clips_long_values() {
        let creator = "x".repeat(1100);
        let records = vec![Record::new(&creator, "https://i.ibb.co/a/first.png", "1", "No")];
        let table = render_table(&records);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[2], format!("{}~ | first.png | 1     | No", "x".repeat(23)));
        assert!(lines.iter().all(|line| line.chars().count() < 100));
    }

    #[test]
    fn test_display_price() {
        assert_eq!(display_price("10.50"), "$10.50");
        assert_eq!(display_price("$3"), "$3");
    }
}

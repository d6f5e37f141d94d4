use crate::api::{Tab, ValueInput};
use crate::error::LedgerError;
use crate::ledger::{layout, Ledger};
use crate::model::{A1Range, Period, RollOver};
use crate::Result;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use tracing::{info, warn};

impl Ledger {
    /// Ends the month that `today` falls in.
    ///
    /// The current month's tab is duplicated into a hidden archive titled with the month's full
    /// name and its earned total, e.g. `January ($120.00)`, or `January ()` when the earned cell
    /// is blank. The original tab is then renamed for
    /// the next month and its record rows, along with those of the Logs tab, are cleared. Header
    /// and formula rows above row 7 are kept.
    ///
    /// Everything that can be checked up front is checked before the first change. There is no
    /// rollback: if a later step fails, the steps already taken stay in place and the step that
    /// failed is logged.
    pub async fn roll_over(&self, today: NaiveDate) -> Result<RollOver> {
        let current = Period::containing(today);
        let next = Period::following(today);
        let current_title = current.abbreviation();
        let next_title = next.abbreviation();

        let tabs = self
            .sheet
            .tabs()
            .await
            .context("Unable to list the sheets")?;
        let source = tabs
            .iter()
            .find(|tab| tab.title == current_title)
            .cloned()
            .ok_or_else(|| LedgerError::SheetNotFound(current_title.clone()))?;

        let cells = self
            .summary_cells(current)
            .await
            .with_context(|| format!("Unable to read the summary of {current_title}"))?;
        // The title carries the earned cell as it reads, even when blank.
        let archive_title = format!(
            "{} ({})",
            current.full_name(),
            cells.earned.as_deref().unwrap_or_default()
        );
        let summary = cells.into_summary(current);

        for title in [&archive_title, &next_title] {
            if tabs.iter().any(|tab| &tab.title == title) {
                bail!("A sheet named '{title}' already exists");
            }
        }

        let mut step = Step::Duplicate;
        let result = self
            .archive_and_reset(&source, &archive_title, &next_title, &mut step)
            .await;
        if let Err(e) = &result {
            warn!(
                "Ending {current_title} failed while trying to {step}, the spreadsheet may need \
                to be repaired by hand: {e:#}"
            );
        }
        result?;

        info!("Archived {current_title} as '{archive_title}', {next_title} is now active");
        Ok(RollOver {
            summary,
            archive_title,
            next,
        })
    }

    async fn archive_and_reset(
        &self,
        source: &Tab,
        archive_title: &str,
        next_title: &str,
        step: &mut Step,
    ) -> Result<()> {
        let archive = self
            .sheet
            .duplicate_tab(source.id, layout::ARCHIVE_INDEX, archive_title)
            .await
            .with_context(|| format!("Unable to duplicate {} as '{archive_title}'", source.title))?;

        *step = Step::CopyValues;
        let used = A1Range::on(source.title.as_str(), layout::USED_RANGE)?;
        let values = self
            .sheet
            .get(&used)
            .await
            .with_context(|| format!("Unable to read {used}"))?;
        let target = A1Range::on(archive_title, layout::USED_RANGE)?;
        self.sheet
            .update(&target, values, ValueInput::Raw)
            .await
            .with_context(|| format!("Unable to copy values into {target}"))?;

        *step = Step::Hide;
        self.sheet
            .set_hidden(archive.id, true)
            .await
            .with_context(|| format!("Unable to hide '{archive_title}'"))?;

        *step = Step::Rename;
        self.sheet
            .rename_tab(source.id, next_title)
            .await
            .with_context(|| format!("Unable to rename {} to {next_title}", source.title))?;

        *step = Step::Clear;
        let records = [
            A1Range::on(next_title, layout::RECORD_AREA)?,
            A1Range::on(layout::LOGS, layout::RECORD_AREA)?,
        ];
        self.sheet
            .clear(&records)
            .await
            .context("Unable to clear the record rows")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Step {
    Duplicate,
    CopyValues,
    Hide,
    Rename,
    Clear,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Step::Duplicate => "duplicate the month",
            Step::CopyValues => "copy values into the archive",
            Step::Hide => "hide the archive",
            Step::Rename => "rename the month",
            Step::Clear => "clear the record rows",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::{Op, Sheet, TestTab};
    use crate::error::{ErrorType, LedgerError};
    use crate::test::TestEnv;
    use chrono::{Month, NaiveDate};

    fn january() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[tokio::test]
    async fn test_roll_over_january() {
        let env = TestEnv::new();
        env.sheet().set_cell("JAN", "Q15", "$120.00").unwrap();

        let rolled = env.ledger().roll_over(january()).await.unwrap();
        assert_eq!(rolled.archive_title, "January ($120.00)");
        assert_eq!(rolled.next.month(), Month::February);
        assert_eq!(rolled.summary.month, "January");
        assert_eq!(rolled.summary.earned, "$120.00");
        assert_eq!(env.sheet().titles(), vec!["FEB", "January ($120.00)", "Logs"]);

        let archive = env.sheet().tab("January ($120.00)").unwrap();
        assert!(archive.hidden);
        assert_eq!(archive.cell(6, 2), "alice");
        assert_eq!(archive.cell(7, 4), "https://i.ibb.co/d4e5f6/second.png");
        assert_eq!(archive.cell(14, 16), "$120.00");

        let feb = env.sheet().tab("FEB").unwrap();
        assert!(!feb.hidden);
        assert_eq!(feb.cell(5, 2), "Creator");
        assert_eq!(feb.cell(6, 2), "");
        assert_eq!(feb.cell(7, 6), "");
        assert_eq!(feb.cell(14, 16), "$120.00");

        assert_eq!(env.sheet().cell("Logs", "C7").unwrap(), "");
        assert_eq!(env.sheet().cell("Logs", "P7").unwrap(), "alice");

        let tabs = env.sheet().tabs().await.unwrap();
        assert_eq!(tabs.iter().filter(|t| t.hidden).count(), 1);
        assert_eq!(env.sheet().calls().rename_tab, 1);
    }

    #[tokio::test]
    async fn test_roll_over_december() {
        let env = TestEnv::with_period(Month::December);
        let today = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let rolled = env.ledger().roll_over(today).await.unwrap();
        assert_eq!(rolled.archive_title, "December ($22.50)");
        assert_eq!(env.sheet().titles(), vec!["JAN", "December ($22.50)", "Logs"]);
    }

    #[tokio::test]
    async fn test_roll_over_missing_month_changes_nothing() {
        let env = TestEnv::new();
        let march = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let e = env.ledger().roll_over(march).await.unwrap_err();
        assert_eq!(
            e.downcast_ref::<LedgerError>(),
            Some(&LedgerError::SheetNotFound("MAR".to_string()))
        );
        assert_eq!(ErrorType::of(&e), ErrorType::NotFound);
        assert_eq!(env.sheet().calls().duplicate_tab, 0);
        assert_eq!(env.sheet().titles(), vec!["JAN", "Logs"]);
    }

    #[tokio::test]
    async fn test_roll_over_refuses_existing_next_month() {
        let env = TestEnv::new();
        env.sheet().add_tab(TestTab::new(7, "FEB", Vec::new()));
        let e = env.ledger().roll_over(january()).await.unwrap_err();
        assert!(e.to_string().contains("FEB"));
        assert_eq!(env.sheet().calls().duplicate_tab, 0);
        assert_eq!(env.sheet().cell("Logs", "C7").unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_roll_over_blank_earned_cell() {
        let env = TestEnv::new();
        env.sheet().set_cell("JAN", "Q15", "").unwrap();
        let rolled = env.ledger().roll_over(january()).await.unwrap();
        assert_eq!(rolled.archive_title, "January ()");
        assert_eq!(rolled.summary.earned, "$0.00");
        assert_eq!(env.sheet().titles(), vec!["FEB", "January ()", "Logs"]);
    }

    #[tokio::test]
    async fn test_roll_over_stops_at_failed_rename() {
        let env = TestEnv::new();
        env.sheet().fail_on(Op::RenameTab);
        let e = env.ledger().roll_over(january()).await.unwrap_err();
        assert_eq!(ErrorType::of(&e), ErrorType::Remote);
        assert!(format!("{e:#}").contains("Unable to rename JAN to FEB"));

        // The steps before the rename stay in place.
        let archive = env.sheet().tab("January ($22.50)").unwrap();
        assert!(archive.hidden);
        assert_eq!(archive.cell(6, 2), "alice");
        assert_eq!(env.sheet().titles(), vec!["JAN", "January ($22.50)", "Logs"]);

        // Nothing after it ran.
        assert_eq!(env.sheet().calls().rename_tab, 1);
        assert_eq!(env.sheet().calls().clear, 0);
        assert_eq!(env.sheet().cell("JAN", "C7").unwrap(), "alice");
        assert_eq!(env.sheet().cell("Logs", "C7").unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_roll_over_offline() {
        let env = TestEnv::new();
        env.sheet().set_offline(true);
        let e = env.ledger().roll_over(january()).await.unwrap_err();
        assert_eq!(ErrorType::of(&e), ErrorType::Remote);
    }
}

//! Month summary and end-of-month handlers.

use crate::commands::{App, Out};
use crate::model::{Period, RollOver, Summary};
use crate::Result;
use anyhow::{bail, Context};
use chrono::NaiveDate;

/// Reads the summary of `month`, or of the month `today` falls in when `month` is `None`.
///
/// # Errors
///
/// Fails when the month's tab does not exist or cannot be read. The reason is logged.
pub async fn summary(app: &App, month: Option<&str>, today: NaiveDate) -> Result<Out<Summary>> {
    let month = match month {
        Some(month) => month.to_string(),
        None => Period::containing(today).abbreviation(),
    };
    let (success, summary) = app.ledger().summarize(&month).await;
    if !success {
        bail!("Failed to fetch summary for {month}.");
    }
    let message = format!(
        "{} Overview: earned {}, pending {}, work done {}",
        summary.month, summary.earned, summary.pending, summary.work_done
    );
    Ok(Out::new(message, summary))
}

/// Ends the month `today` falls in and starts the next one.
pub async fn end_month(app: &App, today: NaiveDate) -> Result<Out<RollOver>> {
    let rolled = app
        .ledger()
        .roll_over(today)
        .await
        .context("Failed to end month")?;
    let message = format!(
        "{} Wrapped Up! {} now active! Earned {}, pending {}, work completed {}",
        rolled.summary.month,
        rolled.next.full_name(),
        rolled.summary.earned,
        rolled.summary.pending,
        rolled.summary.work_done
    );
    Ok(Out::new(message, rolled))
}

//! The remote boundaries of the bot: the spreadsheet that holds the ledger and the image host.
//!
//! Both are traits so that the ledger operations can run against in-memory implementations. In
//! `Mode::Testing` the binary uses those in-memory implementations too, which allows running the
//! whole program without touching Google or ImgBB.

mod image_host;
mod oauth;
mod sheet;
mod test_sheet;

use crate::model::A1Range;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub use image_host::{upload_image, ImageHost, ImgBb, NoImageHost, TestImageHost};
pub use oauth::TokenProvider;
pub use sheet::GoogleSheet;
pub use test_sheet::{Calls, Op, TestSheet, TestTab};

/// Scope required for reading and writing spreadsheet values and sheet properties.
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Environment variable that, when non-empty, selects `Mode::Testing`.
pub const TEST_MODE_ENV: &str = "LEDGER_BOT_IN_TEST_MODE";

/// Whether we are talking to the real remote services or to in-memory stand-ins.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Google,
    Testing,
}

serde_plain::derive_display_from_serialize!(Mode);

impl Mode {
    /// `Mode::Testing` if `LEDGER_BOT_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}

/// How the store should interpret values that are written to it.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum ValueInput {
    /// Values are parsed as if typed into the UI, so `10.50` becomes a number.
    #[default]
    UserEntered,
    /// Values are stored exactly as given.
    Raw,
}

/// The properties of one tab (sheet) within the spreadsheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: i64,
    pub title: String,
    pub index: i64,
    pub hidden: bool,
}

/// The Ledger Store Adapter: range-addressed access to a remote spreadsheet.
///
/// Values come back as the store renders them. Trailing empty rows, and trailing empty cells of
/// each row, are omitted; interior empty rows are present as empty vectors. No method retries.
#[async_trait::async_trait]
pub trait Sheet: Send + Sync {
    /// Reads several ranges in one call. The outer vector is in the order of `ranges`.
    async fn batch_get(&self, ranges: &[A1Range]) -> Result<Vec<Vec<Vec<String>>>>;

    /// Reads a single range.
    async fn get(&self, range: &A1Range) -> Result<Vec<Vec<String>>>;

    /// Writes `values` row by row starting at the top-left of `range`.
    async fn update(
        &self,
        range: &A1Range,
        values: Vec<Vec<String>>,
        input: ValueInput,
    ) -> Result<()>;

    /// Empties every cell in each of `ranges` without shifting any rows.
    async fn clear(&self, ranges: &[A1Range]) -> Result<()>;

    /// Lists the tabs of the spreadsheet.
    async fn tabs(&self) -> Result<Vec<Tab>>;

    /// Copies the tab `source_id` to a new tab titled `title` at position `index`.
    async fn duplicate_tab(&self, source_id: i64, index: i64, title: &str) -> Result<Tab>;

    async fn rename_tab(&self, id: i64, title: &str) -> Result<()>;

    async fn set_hidden(&self, id: i64, hidden: bool) -> Result<()>;
}

/// Creates the `Sheet` for `mode`.
pub async fn sheet(config: &Config, mode: Mode) -> Result<Arc<dyn Sheet>> {
    debug!("Creating a sheet client in {mode} mode");
    Ok(match mode {
        Mode::Google => {
            let token_provider = TokenProvider::load(config.credentials()).await?;
            Arc::new(GoogleSheet::new(config.spreadsheet_id(), token_provider))
        }
        Mode::Testing => Arc::new(TestSheet::default()),
    })
}

/// Creates the `ImageHost` for `mode`.
pub fn image_host(config: &Config, mode: Mode) -> Result<Arc<dyn ImageHost>> {
    Ok(match mode {
        Mode::Google => Arc::new(ImgBb::new(config.imgbb_api_key()?)?),
        Mode::Testing => Arc::new(TestImageHost::default()),
    })
}

//! Command handlers for the ledger bot.
//!
//! Each handler performs one operation against an `App` and returns an `Out` carrying a message for
//! the user and the structured result. The command line prints the `Out`; the Discord layer turns
//! the structured result into an embed.

mod bot;
mod creators;
mod month;
mod records;
mod upload;

use crate::api::{self, ImageHost, Mode};
use crate::cache::{CreatorCache, RecentLogs};
use crate::ledger::Ledger;
use crate::retry::RetryPolicy;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use bot::bot;
pub use creators::creators;
pub use month::{end_month, summary};
pub(crate) use records::display_price;
pub use records::{add, logs, remove_recent, render_table};
pub use upload::upload;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to both the command line and Discord interfaces.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Everything the command handlers operate on: the ledger, the caches in front of it, and the image
/// host with its retry policy. One `App` lives for the whole process.
pub struct App {
    ledger: Ledger,
    creators: CreatorCache,
    recent: RecentLogs,
    images: Arc<dyn ImageHost>,
    retry: RetryPolicy,
}

impl App {
    pub fn new(ledger: Ledger, images: Arc<dyn ImageHost>, retry: RetryPolicy) -> Self {
        Self {
            ledger,
            creators: CreatorCache::default(),
            recent: RecentLogs::default(),
            images,
            retry,
        }
    }

    /// Connects to the spreadsheet and image host for `mode`.
    ///
    /// A missing ImgBB key is not fatal here: the ledger commands do not need it, and an upload
    /// without it fails when attempted.
    pub async fn create(config: &Config, mode: Mode) -> Result<Self> {
        let sheet = api::sheet(config, mode).await?;
        let images = match api::image_host(config, mode) {
            Ok(images) => images,
            Err(e) => {
                warn!("Image uploads are unavailable: {e:#}");
                Arc::new(api::NoImageHost)
            }
        };
        Ok(Self::new(Ledger::new(sheet), images, RetryPolicy::default()))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn creators(&self) -> &CreatorCache {
        &self.creators
    }

    pub fn recent(&self) -> &RecentLogs {
        &self.recent
    }

    pub fn images(&self) -> &dyn ImageHost {
        self.images.as_ref()
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("ledger", &self.ledger)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

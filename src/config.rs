//! Runtime configuration.
//!
//! Everything is read from the environment (a `.env` file is loaded first, when present) through
//! the `clap` `env` attributes in `args::Common`, and may be overridden on the command line. The
//! resulting `Config` is immutable. Secrets are wrapped so that they are never printed by `Debug`
//! or the logs; only their presence is reported.

use crate::api::Mode;
use crate::args::Common;
use crate::Result;
use anyhow::{bail, Context};
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};
use url::Url;

/// The service account key file used when no inline credentials are given.
pub const DEFAULT_CREDENTIALS_FILE: &str = "service-account.json";

/// A value that must not be shown. `Debug` and `Display` print a placeholder.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl FromStr for Secret {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// Where the service account key comes from.
#[derive(Clone, Eq, PartialEq)]
pub enum Credentials {
    /// The key's JSON itself.
    Inline(String),
    /// A path to the key file.
    File(PathBuf),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Inline(_) => f.write_str("Inline(<redacted>)"),
            Credentials::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// The `Config` object holds what the bot needs to reach Discord, the spreadsheet and the image
/// host.
#[derive(Debug, Clone)]
pub struct Config {
    spreadsheet_id: String,
    credentials: Credentials,
    guild_id: Option<u64>,
    bot_token: Option<Secret>,
    imgbb_api_key: Option<Secret>,
}

impl Config {
    /// Builds a `Config` from explicit values.
    ///
    /// `sheet` may be a spreadsheet id or the URL of the spreadsheet, e.g.
    /// `https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX/edit`.
    pub fn new(
        sheet: &str,
        credentials: Credentials,
        guild_id: Option<u64>,
        bot_token: Option<Secret>,
        imgbb_api_key: Option<Secret>,
    ) -> Result<Self> {
        let spreadsheet_id = extract_spreadsheet_id(sheet)
            .context("Failed to extract the spreadsheet ID from GOOGLE_SHEETS_ID")?
            .to_string();
        Ok(Self {
            spreadsheet_id,
            credentials,
            guild_id,
            bot_token,
            imgbb_api_key,
        })
    }

    /// Resolves the configuration from the command line and environment.
    ///
    /// Inline credentials win over the credentials file. The spreadsheet is only required in
    /// `Mode::Google`.
    pub fn from_common(common: &Common, mode: Mode) -> Result<Self> {
        let sheet = common.sheet().unwrap_or_default();
        if sheet.is_empty() && mode == Mode::Google {
            bail!("GOOGLE_SHEETS_ID is not set");
        }

        let credentials = match common.credentials() {
            Some(json) if !json.expose().trim().is_empty() => {
                Credentials::Inline(json.expose().to_string())
            }
            _ => Credentials::File(common.credentials_file().to_path_buf()),
        };

        let config = Self::new(
            sheet,
            credentials,
            common.guild_id(),
            common.bot_token().cloned(),
            common.imgbb_api_key().cloned(),
        )?;
        config.report();
        Ok(config)
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The Discord server that commands are registered to directly. Without it commands are only
    /// registered globally, which can take up to an hour to appear.
    pub fn guild_id(&self) -> Option<u64> {
        self.guild_id
    }

    pub fn bot_token(&self) -> Result<&str> {
        self.bot_token
            .as_ref()
            .map(Secret::expose)
            .filter(|token| !token.is_empty())
            .context("DISCORD_BOT_TOKEN is not set")
    }

    pub fn imgbb_api_key(&self) -> Result<&str> {
        self.imgbb_api_key
            .as_ref()
            .map(Secret::expose)
            .filter(|key| !key.is_empty())
            .context("IMGBB_API_KEY is not set")
    }

    /// Logs what was configured without revealing any secret.
    fn report(&self) {
        debug!("Spreadsheet ID: {}", self.spreadsheet_id);
        match &self.credentials {
            Credentials::Inline(_) => debug!("Using inline service account credentials"),
            Credentials::File(path) => {
                debug!("Using service account credentials file {}", path.display())
            }
        }
        debug!("Discord bot token set: {}", self.bot_token().is_ok());
        debug!("ImgBB API key set: {}", self.imgbb_api_key().is_ok());
        if self.guild_id.is_none() {
            warn!(
                "GUILD_ID is not set. Guild-specific sync will be skipped and global sync may take \
                up to an hour."
            );
        }
    }
}

/// Returns the spreadsheet id from a Google Sheets URL. Anything that is not a URL is taken to be
/// the id itself.
fn extract_spreadsheet_id(sheet: &str) -> Result<&str> {
    let sheet = sheet.trim();
    if Url::parse(sheet).is_err() {
        return Ok(sheet);
    }

    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let parts: Vec<&str> = sheet.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split(['?', '#'])
                .next()
                .unwrap_or(id_part);
            if id.is_empty() {
                break;
            }
            return Ok(id);
        }
    }
    bail!(
        "Invalid Google Sheets URL format. Expected: \
        https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}

//! These structs provide the CLI interface for the ledger bot.

use crate::config::{Secret, DEFAULT_CREDENTIALS_FILE};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// ledger-bot: A Discord bot that keeps a monthly work ledger in a Google sheet.
///
/// Records of completed work (creator, link and price) are appended to the `Logs` tab of the
/// spreadsheet. Each month has its own tab, named like `JAN`, which computes the month's totals.
/// At the end of the month the tab is archived and the next month begins.
///
/// Run `ledger-bot bot` to serve the Discord slash commands. The other subcommands perform the same
/// operations once from the command line.
///
/// Every option can also be given as an environment variable, and a `.env` file in the working
/// directory is loaded first. Set LEDGER_BOT_IN_TEST_MODE to use an in-memory spreadsheet and image
/// host instead of Google and ImgBB.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Connect to Discord and serve the slash commands until stopped.
    ///
    /// Commands are registered to GUILD_ID, when given, and globally. PNG images posted in any
    /// channel the bot can read are uploaded to ImgBB and the link is posted in reply.
    Bot,
    /// Add a record to the Logs tab.
    Add(AddArgs),
    /// Remove the most recent records by clearing their cells.
    RemoveRecent(RemoveRecentArgs),
    /// Show the summary of a month. Defaults to the current month.
    Summary(SummaryArgs),
    /// List the records on the Logs tab.
    Logs(LogsArgs),
    /// List the known creator names.
    Creators,
    /// Archive the current month's tab and start the next month.
    EndMonth,
    /// Upload an image to ImgBB by URL and print the hosted link.
    Upload(UploadArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The ID of the ledger spreadsheet, or its URL. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long, env = "GOOGLE_SHEETS_ID")]
    sheet: Option<String>,

    /// The service account key as JSON. Takes precedence over --credentials-file.
    #[arg(long, env = "GOOGLE_SHEETS_CREDENTIALS", hide_env_values = true)]
    credentials: Option<Secret>,

    /// The path to the service account key file.
    #[arg(
        long,
        env = "GOOGLE_SHEETS_CREDENTIALS_FILE",
        default_value = DEFAULT_CREDENTIALS_FILE
    )]
    credentials_file: PathBuf,

    /// The Discord server to register slash commands to immediately.
    #[arg(long, env = "GUILD_ID")]
    guild_id: Option<u64>,

    /// The Discord bot token. Required by the `bot` subcommand.
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<Secret>,

    /// The ImgBB API key used for image uploads.
    #[arg(long, env = "IMGBB_API_KEY", hide_env_values = true)]
    imgbb_api_key: Option<Secret>,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn credentials(&self) -> Option<&Secret> {
        self.credentials.as_ref()
    }

    pub fn credentials_file(&self) -> &Path {
        &self.credentials_file
    }

    pub fn guild_id(&self) -> Option<u64> {
        self.guild_id
    }

    pub fn bot_token(&self) -> Option<&Secret> {
        self.bot_token.as_ref()
    }

    pub fn imgbb_api_key(&self) -> Option<&Secret> {
        self.imgbb_api_key.as_ref()
    }
}

/// (Not shown): Args for the `ledger-bot add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The creator the work was done for.
    creator: String,

    /// Link to the finished work.
    link: String,

    /// The price, e.g. 10.50 or $1,200
    price: String,
}

impl AddArgs {
    pub fn new(
        creator: impl Into<String>,
        link: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            creator: creator.into(),
            link: link.into(),
            price: price.into(),
        }
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn price(&self) -> &str {
        &self.price
    }
}

/// (Not shown): Args for the `ledger-bot remove-recent` command.
#[derive(Debug, Parser, Clone)]
pub struct RemoveRecentArgs {
    /// How many of the most recent records to remove.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    count: i64,
}

impl RemoveRecentArgs {
    pub fn count(&self) -> i64 {
        self.count
    }
}

/// (Not shown): Args for the `ledger-bot summary` command.
#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    /// The month, e.g. JAN or january. Defaults to the current month.
    #[arg(long)]
    month: Option<String>,
}

impl SummaryArgs {
    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }
}

/// (Not shown): Args for the `ledger-bot logs` command.
#[derive(Debug, Parser, Clone)]
pub struct LogsArgs {
    /// Only list the records of this creator.
    #[arg(long)]
    filter: Option<String>,
}

impl LogsArgs {
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }
}

/// (Not shown): Args for the `ledger-bot upload` command.
#[derive(Debug, Parser, Clone)]
pub struct UploadArgs {
    /// The URL of the image to upload.
    url: String,
}

impl UploadArgs {
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let args = Args::parse_from([
            "ledger-bot",
            "--log-level",
            "debug",
            "add",
            "alice",
            "https://i.ibb.co/x/y.png",
            "$10.50",
        ]);
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        match args.command() {
            Command::Add(add) => {
                assert_eq!(add.creator(), "alice");
                assert_eq!(add.price(), "$10.50");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_remove_recent_defaults_to_one() {
        let args = Args::parse_from(["ledger-bot", "remove-recent"]);
        match args.command() {
            Command::RemoveRecent(remove) => assert_eq!(remove.count(), 1),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_secret_args_are_redacted() {
        let args = Args::parse_from(["ledger-bot", "--bot-token", "s3cr3t", "bot"]);
        assert!(!format!("{args:?}").contains("s3cr3t"));
        assert_eq!(args.common().bot_token().unwrap().expose(), "s3cr3t");
    }
}

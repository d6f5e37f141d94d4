use anyhow::bail;
use chrono::Local;
use clap::Parser;
use ledger_bot::args::{Args, Command};
use ledger_bot::commands::{self, App};
use ledger_bot::{Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Values in a .env file are read as if they were set in the environment.
    let dotenv = dotenv::dotenv();
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");

    // This allows for running the program without hitting Google or ImgBB. When
    // LEDGER_BOT_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Testing,
    // otherwise it will be Mode::Google.
    let mode = Mode::from_env();
    let config = Config::from_common(args.common(), mode)?;

    match args.command() {
        Command::Bot => commands::bot(config, mode).await?.print(),
        command => {
            let app = App::create(&config, mode).await?;
            run(&app, command).await?
        }
    }
    Ok(())
}

/// Runs one of the one-shot commands against `app`.
async fn run(app: &App, command: &Command) -> Result<()> {
    let today = Local::now().date_naive();
    let _: () = match command {
        Command::Bot => bail!("The bot cannot be run as a one-shot command"),
        Command::Add(add_args) => commands::add(app, add_args).await?.print(),
        Command::RemoveRecent(remove_args) => commands::remove_recent(app, remove_args.count())
            .await?
            .print(),
        Command::Summary(summary_args) => commands::summary(app, summary_args.month(), today)
            .await?
            .print(),
        Command::Logs(logs_args) => commands::logs(app, logs_args.filter()).await?.print(),
        Command::Creators => commands::creators(app).await?.print(),
        Command::EndMonth => commands::end_month(app, today).await?.print(),
        Command::Upload(upload_args) => commands::upload(app, upload_args.url()).await?.print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

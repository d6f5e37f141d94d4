use crate::api::Mode;
use crate::commands::{App, Out};
use crate::{Config, Result};
use tracing::info;

/// Runs the Discord bot until its connection ends.
///
/// # Errors
///
/// Fails when the bot token is missing, when the spreadsheet cannot be reached, or when the Discord
/// client stops with an error.
pub async fn bot(config: Config, mode: Mode) -> Result<Out<()>> {
    // Fail on a missing token before any remote connection is made.
    config.bot_token()?;
    let app = App::create(&config, mode).await?;
    info!("Starting the bot in {mode} mode");
    crate::bot::run(&config, app).await?;
    Ok(Out::new_message("The bot has disconnected"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[tokio::test]
    async fn test_bot_requires_token() {
        let credentials = Credentials::File("service-account.json".into());
        let config = Config::new("abc123", credentials, None, None, None).unwrap();
        let e = bot(config, Mode::Testing).await.unwrap_err();
        assert!(e.to_string().contains("DISCORD_BOT_TOKEN"));
    }
}

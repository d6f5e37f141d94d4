//! The Discord presentation layer.
//!
//! Slash commands are dispatched to the handlers in `commands` and their results turned into
//! embeds. No failure escapes a handler: every error is logged and answered with a short message
//! chosen by its `ErrorType`. PNG attachments posted in any channel are re-hosted on ImgBB.

mod definitions;
mod embeds;
mod nuke;

use crate::api::upload_image;
use crate::args::AddArgs;
use crate::cache::MAX_CHOICES;
use crate::commands::{self, App};
use crate::error::{ErrorType, LedgerError};
use crate::{Config, Result};
use anyhow::Context as _;
use chrono::Local;
use definitions::{int_option, str_option};
use serenity::all::{
    Client, Command, CommandInteraction, Context, CreateAutocompleteResponse, CreateEmbed,
    CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EventHandler, GatewayIntents, GuildId,
    Interaction, Message, Ready,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Connects to Discord and serves until the connection ends.
pub async fn run(config: &Config, app: App) -> Result<()> {
    let token = config.bot_token()?;
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let handler = Handler {
        app: Arc::new(app),
        guild_id: config.guild_id().map(GuildId::new),
    };

    let mut client = Client::builder(token, intents)
        .event_handler(handler)
        .await
        .context("Failed to create Discord client")?;
    info!("Discord client created, connecting");
    client.start().await.context("Discord client error")
}

struct Handler {
    app: Arc<App>,
    guild_id: Option<GuildId>,
}

/// What a slash command replies with after deferring.
enum Reply {
    Text(String),
    Embed(CreateEmbed),
}

impl From<&str> for Reply {
    fn from(value: &str) -> Self {
        Reply::Text(value.to_string())
    }
}

impl From<String> for Reply {
    fn from(value: String) -> Self {
        Reply::Text(value)
    }
}

impl From<CreateEmbed> for Reply {
    fn from(value: CreateEmbed) -> Self {
        Reply::Embed(value)
    }
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {}", ready.user.name);
        if let Err(e) = self.sync(&ctx).await {
            error!("Sync failed: {e:#}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.command(&ctx, &command).await,
            Interaction::Autocomplete(autocomplete) => {
                self.autocomplete(&ctx, &autocomplete).await
            }
            _ => {}
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        for attachment in &msg.attachments {
            let reply = if attachment.filename.to_lowercase().ends_with(".png") {
                match upload_image(self.app.images(), self.app.retry(), &attachment.url).await {
                    Some(link) => {
                        let message = CreateMessage::new().embed(embeds::uploaded(&link));
                        msg.channel_id.send_message(&ctx.http, message).await.map(|_| ())
                    }
                    None => msg
                        .channel_id
                        .say(&ctx.http, "Failed to upload to ImgBB. Please try again.")
                        .await
                        .map(|_| ()),
                }
            } else {
                msg.channel_id
                    .say(&ctx.http, "Please send a PNG image.")
                    .await
                    .map(|_| ())
            };
            if let Err(e) = reply {
                error!("Failed to reply to an attachment: {e}");
            }
        }
    }
}

impl Handler {
    /// Registers the slash commands to the configured guild, when there is one, and globally.
    /// Returns the number registered to the guild and globally.
    async fn sync(&self, ctx: &Context) -> Result<(Option<usize>, usize)> {
        let guild = match self.guild_id {
            Some(guild_id) => {
                let synced = guild_id
                    .set_commands(&ctx.http, definitions::commands())
                    .await
                    .with_context(|| format!("Unable to register commands to guild {guild_id}"))?;
                info!(
                    "Synced {} commands to guild {guild_id}: {:?}",
                    synced.len(),
                    names(&synced)
                );
                Some(synced.len())
            }
            None => {
                warn!("GUILD_ID not set, skipping guild-specific sync.");
                None
            }
        };

        let synced = Command::set_global_commands(&ctx.http, definitions::commands())
            .await
            .context("Unable to register global commands")?;
        info!("Synced {} commands globally: {:?}", synced.len(), names(&synced));
        Ok((guild, synced.len()))
    }

    async fn command(&self, ctx: &Context, command: &CommandInteraction) {
        let name = command.data.name.as_str();
        debug!("Received /{name} from {}", command.user.name);

        let result = match name {
            definitions::HELP => immediate(ctx, command, embeds::help()).await,
            definitions::NUKE => nuke::nuke(ctx, command).await,
            definitions::SYNC => self.sync_command(ctx, command).await,
            _ => self.deferred(ctx, command).await,
        };
        if let Err(e) = result {
            error!("Error handling /{name}: {e:#}");
        }
    }

    /// Acknowledges the command, runs it, then sends the reply as a follow-up.
    async fn deferred(&self, ctx: &Context, command: &CommandInteraction) -> Result<()> {
        command
            .defer(&ctx.http)
            .await
            .context("Unable to defer the interaction")?;
        let reply = self.reply(command).await;
        followup(ctx, command, reply).await
    }

    async fn reply(&self, command: &CommandInteraction) -> Reply {
        let app = self.app.as_ref();
        let options = &command.data.options;
        let today = Local::now().date_naive();

        match command.data.name.as_str() {
            definitions::ADD => {
                let args = AddArgs::new(
                    str_option(options, definitions::CREATOR_NAME).unwrap_or_default(),
                    str_option(options, definitions::LINK).unwrap_or_default(),
                    str_option(options, definitions::PRICE).unwrap_or_default(),
                );
                match commands::add(app, &args).await {
                    Ok(out) => out
                        .structure()
                        .map(embeds::record_added)
                        .map_or_else(|| out.message().into(), Reply::from),
                    Err(e) => failure(&e, "Failed to add record.", add_failure),
                }
            }

            definitions::REMOVE_RECENT => {
                let count = int_option(options, definitions::COUNT).unwrap_or(1);
                match commands::remove_recent(app, count).await {
                    Ok(out) => match out.structure() {
                        Some(removed) if !removed.is_empty() => {
                            embeds::records_removed(removed).into()
                        }
                        _ => out.message().into(),
                    },
                    Err(e) => failure(&e, "Failed to remove records.", remove_failure),
                }
            }

            definitions::SUMMARY => match commands::summary(app, None, today).await {
                Ok(out) => out
                    .structure()
                    .map(embeds::summary)
                    .map_or_else(|| out.message().into(), Reply::from),
                Err(e) => {
                    error!("{e:#}");
                    e.to_string().into()
                }
            },

            definitions::LOGS => {
                let filter = str_option(options, definitions::FILTER);
                match commands::logs(app, filter).await {
                    Ok(out) => embeds::logs(out.structure().map_or(&[][..], Vec::as_slice), filter)
                        .into(),
                    Err(e) => failure(&e, "Failed to fetch logs.", |_| None),
                }
            }

            name @ (definitions::GET_LINK | definitions::GET_IMAGE) => {
                let short = str_option(options, definitions::LINK).unwrap_or_default();
                match app.recent().resolve(short).await {
                    Ok(link) if name == definitions::GET_LINK => embeds::full_url(&link).into(),
                    Ok(link) => embeds::image(&link).into(),
                    Err(LedgerError::NoRecentLogs) => {
                        "No recent /logs output found. Please run /logs first.".into()
                    }
                    Err(_) => {
                        format!("Link '{short}' not found in the most recent /logs output.").into()
                    }
                }
            }

            definitions::END_MONTH => match commands::end_month(app, today).await {
                Ok(out) => out
                    .structure()
                    .map(embeds::month_ended)
                    .map_or_else(|| out.message().into(), Reply::from),
                Err(e) => failure(&e, "Failed to end month.", |e| {
                    Some(format!("Failed to end month: {e}."))
                }),
            },

            other => {
                warn!("Unknown command /{other}");
                format!("Unknown command /{other}").into()
            }
        }
    }

    async fn sync_command(&self, ctx: &Context, command: &CommandInteraction) -> Result<()> {
        let is_admin = command
            .member
            .as_ref()
            .and_then(|member| member.permissions)
            .is_some_and(|permissions| permissions.administrator());
        if !is_admin {
            let message = CreateInteractionResponseMessage::new()
                .content("You need to be an administrator to use this command.")
                .ephemeral(true);
            return command
                .create_response(&ctx.http, CreateInteractionResponse::Message(message))
                .await
                .context("Unable to respond to the interaction");
        }

        command
            .defer(&ctx.http)
            .await
            .context("Unable to defer the interaction")?;
        let reply = match self.sync(ctx).await {
            Ok((guild, global)) => {
                let mut lines = Vec::new();
                if let Some(guild) = guild {
                    lines.push(format!("Synced {guild} commands to this guild."));
                }
                lines.push(format!(
                    "Synced {global} commands globally (may take up to an hour to propagate)."
                ));
                lines.join("\n")
            }
            Err(e) => {
                error!("Manual sync failed: {e:#}");
                format!("Failed to sync commands: {e}")
            }
        };
        followup(ctx, command, reply.into()).await
    }

    async fn autocomplete(&self, ctx: &Context, autocomplete: &CommandInteraction) {
        let Some(focused) = autocomplete.data.autocomplete() else {
            return;
        };
        let current = focused.value;
        let app = self.app.as_ref();

        let mut response = CreateAutocompleteResponse::new();
        match focused.name {
            definitions::CREATOR_NAME | definitions::FILTER => {
                for name in app.creators().matching(app.ledger(), current).await {
                    response = response.add_string_choice(name.clone(), name);
                }
            }
            definitions::LINK => {
                for short in app.recent().short_links(current).await {
                    response = response.add_string_choice(short.clone(), short);
                }
            }
            definitions::COUNT => {
                let available = match app.ledger().records(None).await {
                    Ok(records) => records.len(),
                    Err(e) => {
                        error!("Error fetching logs for autocomplete: {e:#}");
                        0
                    }
                };
                for count in count_choices(available, current) {
                    response = response.add_int_choice(count.to_string(), count);
                }
            }
            other => debug!("No autocomplete for option {other}"),
        }

        if let Err(e) = autocomplete
            .create_response(&ctx.http, CreateInteractionResponse::Autocomplete(response))
            .await
        {
            error!("Failed to send autocomplete choices: {e}");
        }
    }
}

/// Chooses the reply for a failed command. When the failure was caused by bad input,
/// `invalid_input` may supply a specific message; anything else gets `generic`.
fn failure(
    e: &anyhow::Error,
    generic: &str,
    invalid_input: impl Fn(&LedgerError) -> Option<String>,
) -> Reply {
    error!("{e:#}");
    let typed = e.chain().find_map(|c| c.downcast_ref::<LedgerError>());
    let specific = match (ErrorType::of(e), typed) {
        (ErrorType::InvalidInput | ErrorType::NotFound, Some(typed)) => invalid_input(typed),
        _ => None,
    };
    specific.unwrap_or_else(|| generic.to_string()).into()
}

fn add_failure(e: &LedgerError) -> Option<String> {
    Some(match e {
        LedgerError::InvalidPrice(_) => "Invalid price format.".to_string(),
        other => format!("{other}."),
    })
}

fn remove_failure(e: &LedgerError) -> Option<String> {
    Some(match e {
        LedgerError::InvalidCount(_) => "Specify a positive number.".to_string(),
        other => format!("{other}."),
    })
}

/// The choices offered for a remove-recent count: `1..=min(available, 25)` containing `current`.
/// When there is nothing to choose from, `1` is offered alone.
fn count_choices(available: usize, current: &str) -> Vec<i64> {
    if available == 0 {
        return vec![1];
    }
    (1..=available.min(MAX_CHOICES) as i64)
        .filter(|count| current.is_empty() || count.to_string().contains(current))
        .collect()
}

fn names(commands: &[Command]) -> Vec<&str> {
    commands.iter().map(|c| c.name.as_str()).collect()
}

async fn immediate(ctx: &Context, command: &CommandInteraction, embed: CreateEmbed) -> Result<()> {
    let message = CreateInteractionResponseMessage::new().embed(embed);
    command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
        .context("Unable to respond to the interaction")
}

async fn followup(ctx: &Context, command: &CommandInteraction, reply: Reply) -> Result<()> {
    let builder = match reply {
        Reply::Text(text) => CreateInteractionResponseFollowup::new().content(text),
        Reply::Embed(embed) => CreateInteractionResponseFollowup::new().embed(embed),
    };
    command
        .create_followup(&ctx.http, builder)
        .await
        .context("Unable to send the follow-up")?;
    Ok(())
}

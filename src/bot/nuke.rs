//! The `/nuke` command: deletes every message in a channel once the invoking user confirms.

use crate::error::LedgerError;
use crate::Result;
use anyhow::Context as _;
use chrono::Utc;
use serenity::all::{
    ChannelId, CommandInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse, GetMessages, Message, MessageId,
};
use serenity::collector::MessageCollector;
use std::time::Duration;
use tracing::{debug, error, info};

/// How long the invoking user has to type `yes`.
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(10);

/// Discord only bulk deletes messages younger than this.
const BULK_DELETE_MAX_AGE_DAYS: i64 = 14;

const PAGE: u8 = 100;

pub(crate) async fn nuke(ctx: &Context, command: &CommandInteraction) -> Result<()> {
    let can_manage = command
        .app_permissions
        .is_some_and(|permissions| permissions.manage_messages());
    if !can_manage {
        respond(ctx, command, "I need 'Manage Messages' permission!").await?;
        return Ok(());
    }
    respond(ctx, command, "Type `yes` to confirm (10s timeout).").await?;

    let edit = match confirm(ctx, command).await {
        Ok(()) => {
            let _typing = command.channel_id.start_typing(&ctx.http);
            match purge(ctx, command.channel_id).await {
                Ok(deleted) => {
                    info!("Nuked {deleted} messages in channel {}", command.channel_id);
                    format!("Nuked {deleted} messages!")
                }
                Err(e) => {
                    error!("Error purging channel {}: {e:#}", command.channel_id);
                    "Failed to erase messages.".to_string()
                }
            }
        }
        Err(e) => {
            debug!("Nuke not confirmed: {e}");
            "Nuke cancelled.".to_string()
        }
    };

    // The original response may have been purged with everything else.
    if let Err(e) = command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(&edit))
        .await
    {
        debug!("Unable to edit the nuke response, sending a new message: {e}");
        command
            .channel_id
            .say(&ctx.http, edit)
            .await
            .context("Unable to report the nuke outcome")?;
    }
    Ok(())
}

/// Waits for the invoking user to type `yes` in the same channel.
async fn confirm(ctx: &Context, command: &CommandInteraction) -> std::result::Result<(), LedgerError> {
    MessageCollector::new(&ctx.shard)
        .channel_id(command.channel_id)
        .author_id(command.user.id)
        .filter(|m: &Message| m.content.trim().eq_ignore_ascii_case("yes"))
        .timeout(CONFIRM_TIMEOUT)
        .next()
        .await
        .map(|_| ())
        .ok_or(LedgerError::Timeout)
}

/// Deletes every message in `channel`, newest first, and returns how many were deleted. Recent
/// messages are deleted in bulk; older ones one at a time.
async fn purge(ctx: &Context, channel: ChannelId) -> Result<usize> {
    let mut deleted = 0;
    let mut before: Option<MessageId> = None;
    loop {
        let mut request = GetMessages::new().limit(PAGE);
        if let Some(before) = before {
            request = request.before(before);
        }
        let messages = channel
            .messages(&ctx.http, request)
            .await
            .context("Unable to fetch messages")?;
        let Some(last) = messages.last() else {
            break;
        };
        before = Some(last.id);

        let ids = messages.iter().map(|m| m.id);
        let (recent, old) = split_by_age(ids, Utc::now().timestamp());
        if recent.len() >= 2 {
            channel
                .delete_messages(&ctx.http, &recent)
                .await
                .context("Unable to bulk delete messages")?;
            deleted += recent.len();
        } else {
            for id in &recent {
                channel.delete_message(&ctx.http, *id).await?;
                deleted += 1;
            }
        }
        for id in old {
            channel
                .delete_message(&ctx.http, id)
                .await
                .with_context(|| format!("Unable to delete message {id}"))?;
            deleted += 1;
        }
    }
    Ok(deleted)
}

/// Splits `ids` into those that can be bulk deleted at `now` (unix seconds) and those that are too
/// old. A minute of margin is kept below the age limit.
fn split_by_age(
    ids: impl Iterator<Item = MessageId>,
    now: i64,
) -> (Vec<MessageId>, Vec<MessageId>) {
    let cutoff = now - BULK_DELETE_MAX_AGE_DAYS * 24 * 60 * 60 + 60;
    ids.partition(|id| id.created_at().unix_timestamp() > cutoff)
}

async fn respond(ctx: &Context, command: &CommandInteraction, content: &str) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new().content(content),
            ),
        )
        .await
        .context("Unable to respond to the interaction")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

    fn id_at(unix_seconds: i64) -> MessageId {
        MessageId::new((unix_seconds as u64 * 1000 - DISCORD_EPOCH_MS) << 22)
    }

    #[test]
    fn test_split_by_age() {
        let now = 1_760_000_000;
        let day = 24 * 60 * 60;
        let fresh = id_at(now - day);
        let edge = id_at(now - 14 * day + 30);
        let stale = id_at(now - 20 * day);

        let (recent, old) = split_by_age([fresh, edge, stale].into_iter(), now);
        assert_eq!(recent, vec![fresh]);
        assert_eq!(old, vec![edge, stale]);
    }
}

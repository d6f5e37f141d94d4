//! Slash command definitions and option access.

use serenity::all::{CommandDataOption, CommandOptionType, CreateCommand, CreateCommandOption};

pub(crate) const SYNC: &str = "sync";
pub(crate) const ADD: &str = "add";
pub(crate) const REMOVE_RECENT: &str = "removerecent";
pub(crate) const SUMMARY: &str = "summary";
pub(crate) const LOGS: &str = "logs";
pub(crate) const GET_LINK: &str = "getlink";
pub(crate) const GET_IMAGE: &str = "getimage";
pub(crate) const END_MONTH: &str = "endmonth";
pub(crate) const NUKE: &str = "nuke";
pub(crate) const HELP: &str = "help";

pub(crate) const CREATOR_NAME: &str = "creator_name";
pub(crate) const LINK: &str = "link";
pub(crate) const PRICE: &str = "price";
pub(crate) const COUNT: &str = "count";
pub(crate) const FILTER: &str = "filter";

/// Every slash command the bot serves.
pub(crate) fn commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(SYNC).description("Manually sync commands (admin only)."),
        CreateCommand::new(ADD)
            .description("Add a record to Google Sheets.")
            .add_option(
                string(CREATOR_NAME, "Creator name")
                    .required(true)
                    .set_autocomplete(true),
            )
            .add_option(string(LINK, "Content URL").required(true))
            .add_option(string(PRICE, "Price (e.g., 10.50)").required(true)),
        CreateCommand::new(REMOVE_RECENT)
            .description("Remove recent records.")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    COUNT,
                    "Number of records to remove (default 1)",
                )
                .set_autocomplete(true),
            ),
        CreateCommand::new(SUMMARY).description("Show current month summary."),
        CreateCommand::new(LOGS)
            .description("Display logs with filter option.")
            .add_option(
                string(FILTER, "Filter by creator name (optional)").set_autocomplete(true),
            ),
        CreateCommand::new(GET_LINK)
            .description("Retrieve the full URL from the most recent /logs output.")
            .add_option(
                string(LINK, "The short link to retrieve (e.g., hv1xR5r.png)")
                    .required(true)
                    .set_autocomplete(true),
            ),
        CreateCommand::new(GET_IMAGE)
            .description("Display the image from the most recent /logs output.")
            .add_option(
                string(LINK, "The short link to display (e.g., hv1xR5r.png)")
                    .required(true)
                    .set_autocomplete(true),
            ),
        CreateCommand::new(END_MONTH).description("End current month and start next."),
        CreateCommand::new(NUKE).description("Erase all messages (requires confirmation)."),
        CreateCommand::new(HELP).description("Display available commands."),
    ]
}

fn string(name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, name, description)
}

/// The string value of the option `name`, if it was given.
pub(crate) fn str_option<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_str())
}

/// The integer value of the option `name`, if it was given.
pub(crate) fn int_option(options: &[CommandDataOption], name: &str) -> Option<i64> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_i64())
}

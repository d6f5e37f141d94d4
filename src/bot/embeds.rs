//! Builders for the embeds the bot replies with. These are pure so that their content can be
//! tested without a Discord connection.

use crate::commands::{display_price, render_table};
use crate::model::{Record, Removed, RollOver, Summary};
use serenity::all::{Colour, CreateEmbed};

/// Discord rejects embed field values longer than this.
const FIELD_LIMIT: usize = 1024;

pub(crate) fn record_added(record: &Record) -> CreateEmbed {
    CreateEmbed::new()
        .title("Record Added")
        .colour(Colour::PURPLE)
        .field("Creator", &record.creator, true)
        .field("Link", click_here(&record.link), true)
        .field("Price", display_price(&record.price), true)
}

pub(crate) fn records_removed(removed: &[Removed]) -> CreateEmbed {
    let plural = if removed.len() > 1 { "s" } else { "" };
    let mut embed = CreateEmbed::new()
        .title(format!("Removed {} Record{plural}", removed.len()))
        .colour(Colour::RED);
    for (i, r) in removed.iter().enumerate() {
        embed = embed.field(
            format!("Record {}", i + 1),
            format!(
                "**Creator:** {}\n**Link:** {}\n**Price:** {}",
                r.creator,
                click_here(&r.link),
                display_price(&r.price)
            ),
            false,
        );
    }
    embed
}

pub(crate) fn summary(summary: &Summary) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("{} Overview", summary.month))
        .colour(Colour::DARK_GREEN)
        .field("💰 Total Earned", format!("**{}**", summary.earned), true)
        .field("⏳ Total Pending", format!("**{}**", summary.pending), true)
        .field("✅ Total Work Done", format!("**{}**", summary.work_done), true)
}

pub(crate) fn logs(records: &[Record], filter: Option<&str>) -> CreateEmbed {
    if records.is_empty() {
        let none = match filter {
            Some(creator) => format!("No records for {creator}."),
            None => "No records.".to_string(),
        };
        return CreateEmbed::new()
            .title("Logs Overview")
            .description("All non-empty records")
            .colour(Colour::BLUE)
            .field("No Records", none, false);
    }
    CreateEmbed::new()
        .title("Logs Overview")
        .description("All non-empty records. Use /getlink or /getimage.")
        .colour(Colour::BLUE)
        .field("Entries", fit_table(&render_table(records)), false)
}

pub(crate) fn full_url(link: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("Full URL")
        .colour(Colour::BLUE)
        .field("Link", click_here(link), false)
}

pub(crate) fn image(link: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("Image Display")
        .colour(Colour::BLUE)
        .image(link)
}

pub(crate) fn month_ended(rolled: &RollOver) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("🎉 {} Wrapped Up!", rolled.summary.month))
        .description(format!("{} now active!", rolled.next.full_name()))
        .colour(Colour::GOLD)
        .field("💰 Total Earned", format!("**{}**", rolled.summary.earned), true)
        .field("⏳ Total Pending", format!("**{}**", rolled.summary.pending), true)
        .field("✅ Work Completed", format!("**{}**", rolled.summary.work_done), true)
}

pub(crate) fn uploaded(link: &str) -> CreateEmbed {
    CreateEmbed::new()
        .colour(Colour::DARK_GREY)
        .field("ImgBB Link", format!("`{link}`"), false)
}

pub(crate) fn help() -> CreateEmbed {
    let commands = [
        ("Image Upload", "Send PNG for ImgBB link."),
        ("/sync", "Manually sync commands (admin only)."),
        ("/add", "Add record to Sheets."),
        ("/removerecent", "Remove recent records."),
        ("/summary", "Current month summary."),
        ("/logs", "Display logs with short links in table."),
        ("/getlink", "Retrieve full URL from /logs output."),
        ("/getimage", "Display the image from /logs output."),
        ("/endmonth", "End month, start next."),
        ("/nuke", "Erase messages (confirmation required)."),
        ("/help", "Display available commands."),
    ];
    commands.into_iter().fold(
        CreateEmbed::new()
            .title("Bot Commands")
            .colour(Colour::BLUE),
        |embed, (name, value)| embed.field(name, value, false),
    )
}

fn click_here(link: &str) -> String {
    format!("[Click Here]({link})")
}

/// Wraps `table` in a code block, dropping whole rows from the end until it fits in an embed field.
/// A final line says how many rows were left out. The header and rule are always kept; if even
/// they do not fit, a short notice is returned instead.
pub(crate) fn fit_table(table: &str) -> String {
    let wrap = |body: &str| format!("```\n{body}```");
    let whole = wrap(table);
    if whole.chars().count() <= FIELD_LIMIT {
        return whole;
    }

    let lines: Vec<&str> = table.lines().collect();
    let header = lines.len().min(2);
    for kept in (header..lines.len()).rev() {
        let omitted = lines.len() - kept;
        let mut body = lines[..kept].join("\n");
        body.push_str(&format!("\n... and {omitted} more\n"));
        let fitted = wrap(&body);
        if fitted.chars().count() <= FIELD_LIMIT {
            return fitted;
        }
    }
    TOO_WIDE.to_string()
}

const TOO_WIDE: &str = "The table is too wide to display.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Period;
    use chrono::Month;
    use serde_json::Value;

    fn json(embed: CreateEmbed) -> Value {
        serde_json::to_value(embed).unwrap()
    }

    #[test]
    fn test_record_added() {
        let record = Record::new("alice", "https://x/a.png", "10.50", "No");
        let value = json(record_added(&record));
        assert_eq!(value["title"], "Record Added");
        assert_eq!(value["fields"][1]["value"], "[Click Here](https://x/a.png)");
        assert_eq!(value["fields"][2]["value"], "$10.50");
    }

    #[test]
    fn test_records_removed_title() {
        let one = vec![Removed::default()];
        assert_eq!(json(records_removed(&one))["title"], "Removed 1 Record");
        let two = vec![Removed::default(), Removed::default()];
        let value = json(records_removed(&two));
        assert_eq!(value["title"], "Removed 2 Records");
        assert_eq!(value["fields"][1]["name"], "Record 2");
    }

    #[test]
    fn test_month_ended() {
        let rolled = RollOver {
            summary: Summary {
                month: "January".to_string(),
                earned: "$120.00".to_string(),
                pending: "$0.00".to_string(),
                work_done: "9".to_string(),
            },
            archive_title: "January ($120.00)".to_string(),
            next: Period::new(Month::February),
        };
        let value = json(month_ended(&rolled));
        assert_eq!(value["title"], "🎉 January Wrapped Up!");
        assert_eq!(value["description"], "February now active!");
        assert_eq!(value["fields"][0]["value"], "**$120.00**");
    }

    #[test]
    fn test_empty_logs() {
        let value = json(logs(&[], Some("zed")));
        assert_eq!(value["fields"][0]["name"], "No Records");
        assert_eq!(value["fields"][0]["value"], "No records for zed.");
    }

    #[test]
    fn test_help_lists_every_command() {
        let value = json(help());
        let fields = value["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 11);
        assert_eq!(fields[0]["name"], "Image Upload");
        assert_eq!(fields[10]["name"], "/help");
    }

    #[test]
    fn test_fit_table_never_exceeds_limit() {
        let wide = format!("{}\n{}\nrow\n", "h".repeat(1100), "-".repeat(1100));
        assert_eq!(fit_table(&wide), TOO_WIDE);

        let records = vec![Record::new("y".repeat(1100), "https://x/a.png", "1", "No")];
        let fitted = fit_table(&render_table(&records));
        assert!(fitted.chars().count() <= FIELD_LIMIT);
        assert!(fitted.contains("a.png"));
    }

    #[test]
    fn test_fit_table_small() {
        assert_eq!(fit_table("a | b\n"), "```\na | b\n```");
    }

    #[test]
    fn test_fit_table_truncates_rows() {
        let mut table = String::from("Creator | Link\n------- | ----\n");
        for i in 0..100 {
            table.push_str(&format!("creator{i:03} | link{i:03}.png\n"));
        }
        let fitted = fit_table(&table);
        assert!(fitted.chars().count() <= FIELD_LIMIT);
        assert!(fitted.starts_with("```\nCreator | Link\n"));
        assert!(fitted.contains("creator000 | link000.png"));
        assert!(!fitted.contains("creator099"));
        assert!(fitted.ends_with(" more\n```"));
    }
}

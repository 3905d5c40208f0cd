//! Message rendering
//!
//! Pure functions turning infractions into log messages. Nothing here does
//! I/O; the services decide where the result is posted.

use warden_core::entities::{DbUser, Infraction, ModActionCounts, PublishType};
use warden_core::traits::{LogMessage, LogSeverity};
use warden_core::value_objects::Snowflake;

/// Longest text a single log message may carry
pub const PAGE_LIMIT: usize = 2048;

pub const NO_REASON: &str = "(no reason specified)";

const TIMESTAMP_FORMAT: &str = "%b %d, %Y at %H:%M UTC";

pub fn user_mention(id: Snowflake) -> String {
    format!("<@{id}>")
}

pub fn channel_mention(id: Snowflake) -> String {
    format!("<#{id}>")
}

pub fn reason_or_default(reason: &str) -> &str {
    if reason.trim().is_empty() {
        NO_REASON
    } else {
        reason
    }
}

fn infraction_label(infraction: &Infraction) -> String {
    infraction
        .id
        .map_or_else(|| "unsaved".to_string(), |id| id.to_string())
}

/// Public announcement of a ban or unban
pub fn publication(infraction: &Infraction, publish_type: PublishType) -> LogMessage {
    let user = &infraction.user;
    match publish_type {
        PublishType::Ban => LogMessage::new(
            format!(
                "**Banned** {} (ID {})\n**Reason:** {}",
                user.name,
                user.id,
                reason_or_default(&infraction.reason)
            ),
            LogSeverity::Bad,
        )
        .with_title("Ban")
        .with_footer(format!("Infraction {}", infraction_label(infraction))),
        PublishType::Unban => {
            let pardon_reason = infraction
                .pardon
                .as_ref()
                .and_then(|p| p.reason.as_deref())
                .unwrap_or("");
            LogMessage::new(
                format!(
                    "**Unbanned** {} (ID {})\n**Original reason:** {}\n**Unban reason:** {}",
                    user.name,
                    user.id,
                    reason_or_default(&infraction.reason),
                    reason_or_default(pardon_reason)
                ),
                LogSeverity::Good,
            )
            .with_title("Unban")
            .with_footer(format!("Infraction {}", infraction_label(infraction)))
        }
    }
}

/// Mod-log entry for a ban, whoever issued it
pub fn ban_log(infraction: &Infraction) -> LogMessage {
    let moderator = &infraction.moderator;
    let id = infraction_label(infraction);
    let footer = if infraction.reason.trim().is_empty() {
        format!("Reason can be updated with `reason {id} <your reason here>`")
    } else {
        format!("This can be published to the public log with `publish {id} ban`")
    };

    LogMessage::new(
        format!(
            "**Banned** {} (ID {})\n**Reason:** {}",
            infraction.user.name,
            infraction.user.id,
            reason_or_default(&infraction.reason)
        ),
        LogSeverity::Bad,
    )
    .with_title(format!("{} (ID {})", moderator.name, moderator.id))
    .with_footer(footer)
}

/// One history entry per infraction; pardoned ones are struck through
pub fn history_entries(infractions: &[Infraction]) -> Vec<String> {
    infractions
        .iter()
        .map(|infraction| {
            let entry = format!(
                "**{} : {}** : {}\nReason: {}\nModerator: {}\n",
                infraction_label(infraction),
                infraction.kind,
                infraction.issued_at.format(TIMESTAMP_FORMAT),
                reason_or_default(&infraction.reason),
                infraction.moderator.name,
            );
            match &infraction.pardon {
                Some(pardon) => format!(
                    "~~{entry}~~Pardoned by: {} on {}\n",
                    pardon.moderator.name,
                    pardon.pardon_on.format(TIMESTAMP_FORMAT)
                ),
                None => entry,
            }
        })
        .collect()
}

/// Pack entries into pages shorter than `PAGE_LIMIT` characters
///
/// Entries are never split. An entry that is too long on its own gets a page
/// of its own, truncated to fit.
pub fn paginate(entries: Vec<String>) -> Vec<String> {
    let mut pages = Vec::new();
    let mut page = String::new();

    for entry in entries {
        if page.chars().count() + entry.chars().count() < PAGE_LIMIT {
            page.push_str(&entry);
            continue;
        }
        if !page.is_empty() {
            pages.push(std::mem::take(&mut page));
        }
        if entry.chars().count() < PAGE_LIMIT {
            page = entry;
        } else {
            pages.push(entry.chars().take(PAGE_LIMIT - 1).collect());
        }
    }
    if !page.is_empty() {
        pages.push(page);
    }
    pages
}

/// History view for a user: one message per page
pub fn history(title: &str, infractions: &[Infraction]) -> Vec<LogMessage> {
    paginate(history_entries(infractions))
        .into_iter()
        .map(|page| LogMessage::new(page, LogSeverity::Automatic).with_title(title))
        .collect()
}

pub fn mod_actions(moderator: &DbUser, counts: &ModActionCounts) -> LogMessage {
    LogMessage::new(
        format!(
            "Bans: {}\nMutes: {}\nWarns: {}",
            counts.bans, counts.mutes, counts.warns
        ),
        LogSeverity::Automatic,
    )
    .with_title(format!("Moderation log for {}", moderator.name))
}

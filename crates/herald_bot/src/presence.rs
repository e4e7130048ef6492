//! Placeholder substitution for presence and profile text.

use crate::PresenceSnapshot;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Substituted for `{servername}` when the bot is in no guild.
pub const FALLBACK_SERVER_NAME: &str = "Discord";

/// Substituted for `{prefix}`; every command is a slash command.
pub const COMMAND_PREFIX: &str = "/";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{(members|guilds|users|botname|servername|prefix|timestamp)\}")
        .expect("static pattern is valid")
});

/// Replace every known placeholder in `template` with values from `snapshot`.
///
/// Placeholders match case-insensitively; anything in braces that is not a
/// known placeholder is left as written.
///
/// # Examples
///
/// ```
/// use herald_bot::{PresenceSnapshot, expand};
///
/// let snapshot = PresenceSnapshot::new(120, 3, 120, "Herald", None);
/// assert_eq!(expand("{GUILDS} servers on {servername}", &snapshot), "3 servers on Discord");
/// assert_eq!(expand("{unknown}", &snapshot), "{unknown}");
/// ```
pub fn expand(template: &str, snapshot: &PresenceSnapshot) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            match caps[1].to_ascii_lowercase().as_str() {
                "members" => snapshot.members().to_string(),
                "guilds" => snapshot.guilds().to_string(),
                "users" => snapshot.users().to_string(),
                "botname" => snapshot.bot_name().clone(),
                "servername" => snapshot
                    .server_name()
                    .clone()
                    .unwrap_or_else(|| FALLBACK_SERVER_NAME.to_string()),
                "prefix" => COMMAND_PREFIX.to_string(),
                "timestamp" => snapshot.timestamp().format(TIMESTAMP_FORMAT).to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

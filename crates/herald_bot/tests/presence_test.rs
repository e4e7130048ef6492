//! Placeholder expansion for presence and profile text.

use chrono::{TimeZone, Utc};
use herald_bot::{FALLBACK_SERVER_NAME, PresenceSnapshot, expand};

fn snapshot(server_name: Option<&str>) -> PresenceSnapshot {
    let timestamp = Utc
        .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
        .single()
        .expect("valid timestamp");
    PresenceSnapshot::at(1250, 12, 980, "Herald", server_name.map(str::to_string), timestamp)
}

#[test]
fn test_expand_replaces_every_placeholder() {
    let text = expand(
        "{members}|{guilds}|{users}|{botname}|{servername}|{prefix}|{timestamp}",
        &snapshot(Some("Lobby")),
    );
    assert_eq!(text, "1250|12|980|Herald|Lobby|/|2024-03-09 07:05:01 UTC");
}

#[test]
fn test_expand_is_case_insensitive() {
    let text = expand("{Members} in {GUILDS} ({BotName})", &snapshot(Some("Lobby")));
    assert_eq!(text, "1250 in 12 (Herald)");
}

#[test]
fn test_expand_replaces_repeated_placeholders() {
    let text = expand("{guilds}/{guilds}", &snapshot(None));
    assert_eq!(text, "12/12");
}

#[test]
fn test_expand_falls_back_without_server() {
    let text = expand("Serving {servername}", &snapshot(None));
    assert_eq!(text, format!("Serving {FALLBACK_SERVER_NAME}"));
}

#[test]
fn test_expand_leaves_unknown_text_alone() {
    let template = "{channel} {members {guilds";
    assert_eq!(expand(template, &snapshot(None)), template);
    assert_eq!(expand("", &snapshot(None)), "");
}

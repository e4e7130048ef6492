//! Profile update resolution and invite links.

use herald_bot::{PresenceSnapshot, ProfileUpdate, invite_link};

fn snapshot() -> PresenceSnapshot {
    PresenceSnapshot::new(10, 2, 9, "Herald", Some("Lobby".to_string()))
}

#[test]
fn test_resolve_trims_and_expands() {
    let update = ProfileUpdate {
        username: Some("  Herald  ".to_string()),
        avatar: Some(" https://cdn.example.com/avatar.png ".to_string()),
        banner: None,
        bio: Some("Helping {guilds} servers".to_string()),
    };

    let edit = update.resolve(&snapshot());

    assert_eq!(edit.username.as_deref(), Some("Herald"));
    assert_eq!(
        edit.avatar.as_ref().map(|url| url.as_str()),
        Some("https://cdn.example.com/avatar.png")
    );
    assert_eq!(edit.bio.as_deref(), Some("Helping 2 servers"));
}

#[test]
fn test_resolve_skips_invalid_avatar() {
    for avatar in ["avatar.png", "ftp://example.com/a.png", "file:///tmp/a.png"] {
        let update = ProfileUpdate {
            avatar: Some(avatar.to_string()),
            ..Default::default()
        };
        let edit = update.resolve(&snapshot());
        assert_eq!(edit.avatar, None, "{avatar} should be rejected");
        assert!(edit.is_empty());
    }
}

#[test]
fn test_resolve_ignores_blank_fields_and_banner() {
    let update = ProfileUpdate {
        username: Some(String::new()),
        avatar: Some("   ".to_string()),
        banner: Some("https://cdn.example.com/banner.png".to_string()),
        bio: Some("\t".to_string()),
    };

    assert!(update.resolve(&snapshot()).is_empty());
}

#[test]
fn test_profile_update_deserializes_partial_json() {
    let update: ProfileUpdate =
        serde_json::from_str(r#"{"username":"Herald"}"#).expect("valid profile json");
    assert_eq!(update.username.as_deref(), Some("Herald"));
    assert_eq!(update.avatar, None);
}

#[test]
fn test_invite_link_format() {
    let url = invite_link("1234567890", "8").expect("invite link");
    assert_eq!(
        url.as_str(),
        "https://discord.com/api/oauth2/authorize?client_id=1234567890&permissions=8&scope=bot+applications.commands"
    );
}

#[test]
fn test_invite_link_rejects_bad_input() {
    assert!(invite_link("", "8").is_err());
    assert!(invite_link("  ", "8").is_err());
    assert!(invite_link("123", "admin").is_err());
    assert!(invite_link("123", "-1").is_err());
}

//! Administrative profile updates.

use crate::{PresenceSnapshot, ProfileEdit, expand};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

/// Profile fields as submitted by an administrator; blank fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    /// New username
    pub username: Option<String>,
    /// Avatar image URL
    pub avatar: Option<String>,
    /// Banner image URL; bot accounts cannot set one
    pub banner: Option<String>,
    /// About-me text, may contain presence placeholders
    pub bio: Option<String>,
}

impl ProfileUpdate {
    /// Turn the submitted fields into the edit actually sent to the platform.
    pub fn resolve(&self, snapshot: &PresenceSnapshot) -> ProfileEdit {
        let username = non_blank(&self.username).map(str::to_string);
        let bio = non_blank(&self.bio).map(|bio| expand(bio, snapshot));
        let avatar = non_blank(&self.avatar).and_then(|raw| match parse_image_url(raw) {
            Ok(url) => Some(url),
            Err(reason) => {
                error!(avatar = raw, %reason, "Invalid avatar URL");
                None
            }
        });
        if non_blank(&self.banner).is_some() {
            info!("Banner URL saved but cannot be applied to a bot account");
        }
        ProfileEdit {
            username,
            avatar,
            bio,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_image_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

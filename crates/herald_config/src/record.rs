//! The persisted/administrative configuration document.

use crate::{CommandScope, RuntimeConfig};
use serde::{Deserialize, Serialize};

/// One configuration document as stored and as submitted by the dashboard.
///
/// Every field is optional; empty strings count as unset when the record is
/// bound onto the live settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigRecord {
    /// Bot token
    #[serde(alias = "botToken", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Application (client) id
    #[serde(alias = "clientId", skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    /// OAuth client secret, only consumed by the dashboard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Guild id for guild-scoped registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    /// Command registration scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_scope: Option<CommandScope>,
    /// Invite permission bitmask
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_permissions: Option<String>,
    /// Presence text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_text: Option<String>,
    /// Presence activity code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_type: Option<u8>,
    /// OAuth callback URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Whether the bot should connect on boot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
}

impl ConfigRecord {
    /// Seed document built from the boot snapshot, used when the store is empty.
    pub fn from_runtime(config: &RuntimeConfig) -> Self {
        Self {
            token: config.token().clone(),
            application_id: config.application_id().clone(),
            client_secret: None,
            guild_id: config.guild_id().clone(),
            command_scope: Some(*config.command_scope()),
            invite_permissions: Some(config.invite_permissions().clone()),
            presence_text: Some(config.presence_text().clone()),
            presence_type: Some(config.presence_type().code()),
            callback_url: config.callback_url().clone(),
            auto_start: None,
        }
    }

    /// Overlay every field set on `other` onto `self`.
    pub fn merge(&mut self, other: &ConfigRecord) {
        fn overlay<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
            if source.is_some() {
                target.clone_from(source);
            }
        }
        overlay(&mut self.token, &other.token);
        overlay(&mut self.application_id, &other.application_id);
        overlay(&mut self.client_secret, &other.client_secret);
        overlay(&mut self.guild_id, &other.guild_id);
        overlay(&mut self.command_scope, &other.command_scope);
        overlay(&mut self.invite_permissions, &other.invite_permissions);
        overlay(&mut self.presence_text, &other.presence_text);
        overlay(&mut self.presence_type, &other.presence_type);
        overlay(&mut self.callback_url, &other.callback_url);
        overlay(&mut self.auto_start, &other.auto_start);
    }
}

impl std::fmt::Debug for ConfigRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRecord")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("application_id", &self.application_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("guild_id", &self.guild_id)
            .field("command_scope", &self.command_scope)
            .field("invite_permissions", &self.invite_permissions)
            .field("presence_text", &self.presence_text)
            .field("presence_type", &self.presence_type)
            .field("callback_url", &self.callback_url)
            .field("auto_start", &self.auto_start)
            .finish()
    }
}

//! OAuth2 invite links.

use herald_error::ConfigError;
use url::Url;

const AUTHORIZE_URL: &str = "https://discord.com/api/oauth2/authorize";
const INVITE_SCOPES: &str = "bot applications.commands";

/// Build the link that adds the application to a guild with `permissions`.
///
/// # Errors
///
/// Fails when the application id is empty or the permission mask is not a
/// decimal bitmask.
pub fn invite_link(application_id: &str, permissions: &str) -> Result<Url, ConfigError> {
    let application_id = application_id.trim();
    if application_id.is_empty() {
        return Err(ConfigError::new("Missing application id, cannot build invite link"));
    }
    let permissions = permissions.trim();
    if permissions.parse::<u64>().is_err() {
        return Err(ConfigError::new(format!(
            "Invalid permission mask '{permissions}'"
        )));
    }
    Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", application_id),
            ("permissions", permissions),
            ("scope", INVITE_SCOPES),
        ],
    )
    .map_err(|e| ConfigError::new(format!("Failed to build invite link: {e}")))
}

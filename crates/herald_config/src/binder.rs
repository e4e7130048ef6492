//! Merge configuration records onto the live runtime settings.

use crate::{ActivityKind, ConfigRecord, RuntimeConfig};
use tracing::{debug, warn};

/// Owner of the live [`RuntimeConfig`].
///
/// Field precedence on [`ConfigBinder::apply`]: a non-empty value on the
/// record, then the previous effective value, then the boot fallback.
#[derive(Debug, Clone)]
pub struct ConfigBinder {
    fallback: RuntimeConfig,
    effective: RuntimeConfig,
}

impl ConfigBinder {
    /// Capture the boot snapshot; it starts out as the effective config too.
    pub fn new(fallback: RuntimeConfig) -> Self {
        Self {
            effective: fallback.clone(),
            fallback,
        }
    }

    /// Current effective settings.
    pub fn effective(&self) -> &RuntimeConfig {
        &self.effective
    }

    /// Settings captured at process start.
    pub fn fallback(&self) -> &RuntimeConfig {
        &self.fallback
    }

    /// Merge `record` into the effective settings and return them.
    #[tracing::instrument(skip_all)]
    pub fn apply(&mut self, record: &ConfigRecord) -> &RuntimeConfig {
        let fallback = &self.fallback;
        let live = &mut self.effective;

        live.token = pick_optional(&record.token, &live.token, &fallback.token);
        live.application_id =
            pick_optional(&record.application_id, &live.application_id, &fallback.application_id);
        live.guild_id = pick_optional(&record.guild_id, &live.guild_id, &fallback.guild_id);
        live.callback_url =
            pick_optional(&record.callback_url, &live.callback_url, &fallback.callback_url);
        live.invite_permissions = pick(
            &record.invite_permissions,
            &live.invite_permissions,
            &fallback.invite_permissions,
        );
        live.presence_text = pick(
            &record.presence_text,
            &live.presence_text,
            &fallback.presence_text,
        );

        if let Some(scope) = record.command_scope {
            live.command_scope = scope;
        }

        if let Some(code) = record.presence_type {
            match ActivityKind::from_code(code) {
                Some(kind) => live.presence_type = kind,
                None => warn!(code, "Ignoring unknown presence type"),
            }
        }

        debug!(
            scope = %live.command_scope,
            has_token = live.token.is_some(),
            "Configuration applied"
        );
        &self.effective
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn pick(candidate: &Option<String>, previous: &str, fallback: &str) -> String {
    non_empty(candidate)
        .or_else(|| Some(previous.trim()).filter(|v| !v.is_empty()))
        .unwrap_or(fallback)
        .to_string()
}

fn pick_optional(
    candidate: &Option<String>,
    previous: &Option<String>,
    fallback: &Option<String>,
) -> Option<String> {
    non_empty(candidate)
        .or_else(|| non_empty(previous))
        .or_else(|| non_empty(fallback))
        .map(str::to_string)
}

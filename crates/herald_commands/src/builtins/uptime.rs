use crate::{CommandContext, CommandHandler, Reply};
use async_trait::async_trait;
use herald_error::HandlerResult;
use std::time::Duration;

/// Render as `1d 2h 3m 4s`, omitting leading zero units.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

/// Time since the process started.
#[derive(Debug, Clone, Copy, Default)]
pub struct UptimeHandler;

#[async_trait]
impl CommandHandler for UptimeHandler {
    async fn execute(&self, ctx: CommandContext) -> HandlerResult<()> {
        let uptime = format_duration(ctx.started_at().elapsed());
        ctx.interaction()
            .reply(Reply::ephemeral(format!("⏱️ Uptime: **{uptime}**")))
            .await
    }
}

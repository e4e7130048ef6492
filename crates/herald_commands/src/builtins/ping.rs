use crate::{CommandContext, CommandHandler, Reply};
use async_trait::async_trait;
use herald_error::HandlerResult;
use std::time::Instant;

/// Replies, then edits the reply with the measured round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct PingHandler;

#[async_trait]
impl CommandHandler for PingHandler {
    async fn execute(&self, ctx: CommandContext) -> HandlerResult<()> {
        let sent = Instant::now();
        ctx.interaction().reply(Reply::ephemeral("Pinging...")).await?;
        let latency = sent.elapsed().as_millis();
        ctx.interaction()
            .edit_reply(format!("Pong! Round trip: {latency}ms"))
            .await
    }
}

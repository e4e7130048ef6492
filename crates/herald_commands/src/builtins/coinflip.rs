use crate::{CommandContext, CommandHandler, Reply};
use async_trait::async_trait;
use herald_error::HandlerResult;

/// Heads or tails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinflipHandler;

#[async_trait]
impl CommandHandler for CoinflipHandler {
    async fn execute(&self, ctx: CommandContext) -> HandlerResult<()> {
        let side = if rand::random::<bool>() { "Heads" } else { "Tails" };
        ctx.interaction()
            .reply(Reply::ephemeral(format!("🪙 The coin landed on **{side}**.")))
            .await
    }
}

use crate::{CommandContext, CommandHandler, Reply};
use async_trait::async_trait;
use herald_error::{HandlerError, HandlerResult};
use rand::Rng;

/// Die size when the `sides` option is omitted.
pub const DEFAULT_SIDES: i64 = 6;
const SIDES: std::ops::RangeInclusive<i64> = 2..=1000;

/// Rolls a die with `sides` faces.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollHandler;

#[async_trait]
impl CommandHandler for RollHandler {
    async fn execute(&self, ctx: CommandContext) -> HandlerResult<()> {
        let sides = ctx
            .interaction()
            .integer_option("sides")
            .unwrap_or(DEFAULT_SIDES);
        if !SIDES.contains(&sides) {
            return Err(HandlerError::invalid_option(
                "sides",
                format!("{sides} is outside {}..={}", SIDES.start(), SIDES.end()),
            ));
        }
        let result = rand::thread_rng().gen_range(1..=sides);
        ctx.interaction()
            .reply(Reply::ephemeral(format!(
                "🎲 Rolled a {sides}-sided die: **{result}**"
            )))
            .await
    }
}

use crate::{CommandContext, CommandHandler, Reply};
use async_trait::async_trait;
use herald_error::HandlerResult;

/// Lists every loaded command with its description.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn execute(&self, ctx: CommandContext) -> HandlerResult<()> {
        let mut content = String::from("**Available Commands**\n");
        for definition in ctx.commands().iter() {
            content.push_str(&format!(
                "`/{}` - {}\n",
                definition.name(),
                definition.description()
            ));
        }
        content.push_str("Use slash commands directly in your server.");
        ctx.interaction().reply(Reply::ephemeral(content)).await
    }
}

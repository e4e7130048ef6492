use crate::{CommandContext, CommandHandler, Reply};
use async_trait::async_trait;
use herald_error::{HandlerError, HandlerResult};
use rand::seq::SliceRandom;

const MIN_CHOICES: usize = 2;
const MAX_CHOICES: usize = 25;

/// Split a `,` or `|` separated list, dropping blank entries.
pub fn parse_choices(raw: &str) -> Vec<&str> {
    raw.split([',', '|'])
        .map(str::trim)
        .filter(|choice| !choice.is_empty())
        .collect()
}

/// Picks one of the supplied options at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChooseHandler;

#[async_trait]
impl CommandHandler for ChooseHandler {
    async fn execute(&self, ctx: CommandContext) -> HandlerResult<()> {
        let interaction = ctx.interaction();
        let raw = interaction
            .string_option("options")
            .ok_or_else(|| HandlerError::invalid_option("options", "missing"))?;
        let choices = parse_choices(raw);

        let content = if choices.len() < MIN_CHOICES {
            "Please provide at least two distinct options separated by commas or pipes."
                .to_string()
        } else if choices.len() > MAX_CHOICES {
            "Too many options! Please provide 25 or fewer choices.".to_string()
        } else {
            let choice = choices
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or_default();
            match interaction.string_option("question") {
                Some(question) => format!("**{question}**\n🎲 I choose: **{choice}**"),
                None => format!("🎲 I choose: **{choice}**"),
            }
        };

        interaction.reply(Reply::ephemeral(content)).await
    }
}

use crate::commands::{CommandContext, CommandResult};
use crate::components::answers::PrimaryOutcome;
use rust_i18n::t;
use tracing::debug;

/// Answer a free-form question
pub async fn answer_question(ctx: &CommandContext, query: &str) -> CommandResult {
    let answer = match ctx.answers.ask_primary(query).await {
        PrimaryOutcome::Answered(answer) => answer,
        PrimaryOutcome::Failed(reason) => {
            // Announced before the lookup starts
            ctx.say(&t!("checking_lookup")).await?;
            ctx.answers.look_up(query, reason).await
        }
    };
    debug!("Answer came from {:?}", answer.source);

    ctx.say(&answer.text).await
}

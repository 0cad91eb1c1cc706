use crate::commands::{CommandContext, CommandResult};
use rust_i18n::t;
use tracing::info;

/// Say goodbye and ask the surface to stop
pub async fn exit(ctx: &CommandContext) -> CommandResult {
    ctx.say(&t!("farewell")).await?;
    info!("Exit requested by voice command");
    ctx.shutdown.cancel();
    Ok(())
}

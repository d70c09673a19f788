//! hsearch reset - Delete and recreate the index

use clap::Args;

use super::{CommandContext, emit_lifecycle};
use crate::error::Result;
use crate::service::ProvisionedIndex;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Confirm that every document in the index will be deleted
    #[arg(long)]
    pub yes: bool,
}

pub async fn run(ctx: &CommandContext, args: &ResetArgs) -> Result<()> {
    let action = ctx.service.reset_index(ctx.index(), args.yes).await?;
    emit_lifecycle(
        ctx,
        &ProvisionedIndex {
            index: ctx.index().to_string(),
            action,
        },
    )
}

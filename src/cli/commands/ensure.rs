//! hsearch ensure - Create the index if it is missing

use clap::Args;

use super::{CommandContext, emit_lifecycle};
use crate::error::Result;
use crate::service::ProvisionedIndex;

#[derive(Args, Debug)]
pub struct EnsureArgs {}

pub async fn run(ctx: &CommandContext, _args: &EnsureArgs) -> Result<()> {
    let action = ctx.service.ensure_index(ctx.index()).await?;
    emit_lifecycle(
        ctx,
        &ProvisionedIndex {
            index: ctx.index().to_string(),
            action,
        },
    )
}

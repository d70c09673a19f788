//! hsearch migrate - Version-guarded schema migration
//!
//! Recreating the index drops its documents, so a version change is only
//! applied with `--allow-reset` or `lifecycle.reset_on_version_change`.

use clap::Args;

use super::{CommandContext, emit_lifecycle};
use crate::error::Result;
use crate::service::ProvisionedIndex;

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Recreate the index if its schema version or mapping differs
    #[arg(long)]
    pub allow_reset: bool,
}

pub async fn run(ctx: &CommandContext, args: &MigrateArgs) -> Result<()> {
    let allow_reset = args.allow_reset || ctx.service.config().lifecycle.reset_on_version_change;
    let schema = ctx.service.schema(ctx.index())?;
    let action = ctx.service.lifecycle().migrate(schema, allow_reset).await?;
    emit_lifecycle(
        ctx,
        &ProvisionedIndex {
            index: schema.name.clone(),
            action,
        },
    )
}

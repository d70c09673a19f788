//! hsearch count - Number of documents in the index

use clap::Args;

use super::CommandContext;
use crate::cli::output::{emit_json, machine_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct CountArgs {}

pub async fn run(ctx: &CommandContext, _args: &CountArgs) -> Result<()> {
    ctx.provision().await?;
    let count = ctx.service.count(ctx.index()).await?;
    if ctx.machine() {
        return emit_json(&machine_ok(serde_json::json!({
            "index": ctx.index(),
            "count": count,
        })));
    }
    println!("{count}");
    Ok(())
}

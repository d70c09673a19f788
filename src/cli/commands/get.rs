//! hsearch get - Fetch one document by id

use clap::Args;
use colored::Colorize;

use super::CommandContext;
use crate::cli::output::{emit_human, emit_json, machine_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Document id
    pub id: String,
}

pub async fn run(ctx: &CommandContext, args: &GetArgs) -> Result<()> {
    ctx.provision().await?;
    let document = ctx.service.get_document(ctx.index(), &args.id).await?;

    if ctx.machine() {
        return emit_json(&machine_ok(&document));
    }

    let Some(document) = document else {
        let message = format!("no document {} in {}", args.id, ctx.index());
        if ctx.format.use_colors() {
            println!("{} {}", "!".yellow(), message);
        } else {
            println!("! {message}");
        }
        return Ok(());
    };

    let vector = document
        .content_vector
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut layout = ctx.layout();
    layout
        .kv("Id", &document.id)
        .kv("Content", &document.content)
        .kv("Vector", &format!("[{vector}]"));
    emit_human(layout);
    Ok(())
}

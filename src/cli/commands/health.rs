//! hsearch health - Probe the index store

use clap::Args;
use colored::Colorize;

use super::CommandContext;
use crate::cli::output::{emit_human, emit_json, machine_ok};
use crate::error::{HsError, Result};

#[derive(Args, Debug)]
pub struct HealthArgs {}

pub async fn run(ctx: &CommandContext, _args: &HealthArgs) -> Result<()> {
    let health = ctx.service.health_check().await;
    if !health.is_alive() {
        return Err(HsError::StoreUnavailable(
            health.error.unwrap_or_else(|| "no response".to_string()),
        ));
    }

    if ctx.machine() {
        return emit_json(&machine_ok(&health));
    }

    let mut layout = ctx.layout();
    let status = if ctx.format.use_colors() {
        "alive".green().bold().to_string()
    } else {
        "alive".to_string()
    };
    layout.kv("Status", &status);
    if let Some(store) = &health.store {
        layout.kv("Store", &store.name).kv("Version", &store.version);
        if let Some(cluster) = &store.cluster_name {
            layout.kv("Cluster", cluster);
        }
    }
    emit_human(layout);
    Ok(())
}

//! hsearch search - Hybrid search
//!
//! Runs the lexical and vector sub-queries concurrently and prints the
//! RRF-fused ranking. A degraded result is still printed, with a warning
//! naming the failed source.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use super::CommandContext;
use crate::cli::output::{emit_json, machine_ok};
use crate::cli::progress::spinner;
use crate::error::{HsError, Result};
use crate::search::{FusedResult, SearchQuery};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Full-text query
    #[arg(long)]
    pub query: Option<String>,

    /// Query vector as comma-separated numbers or a JSON array
    #[arg(long, allow_hyphen_values = true)]
    pub vector: Option<String>,

    /// Number of fused results (default: search.default_top_n)
    #[arg(long, short = 'n')]
    pub top: Option<usize>,

    /// Ingest documents from this file before searching
    #[arg(long, value_name = "FILE")]
    pub load: Option<PathBuf>,

    /// Show per-source ranks and scores
    #[arg(long)]
    pub explain: bool,
}

pub async fn run(ctx: &CommandContext, args: &SearchArgs) -> Result<()> {
    let query = SearchQuery::new(
        args.query.clone().unwrap_or_default(),
        args.vector.as_deref().map(parse_vector).transpose()?.unwrap_or_default(),
    );

    ctx.provision().await?;
    if let Some(path) = &args.load {
        let report = super::ingest::ingest_file(ctx, path).await?;
        tracing::info!(accepted = report.accepted, rejected = report.errors.len(), "loaded documents");
    }

    let progress = spinner(ctx.progress, "Searching");
    let outcome = ctx.service.search(ctx.index(), &query, args.top).await;
    progress.finish_and_clear();
    let result = outcome?;

    if ctx.machine() {
        let mut response = machine_ok(&result);
        if let Some(degraded) = &result.degraded {
            response = response.with_warning(format!(
                "{}: {} sub-query failed: {}",
                degraded.code(),
                degraded.failed,
                degraded.reason
            ));
        }
        return emit_json(&response);
    }

    print_human(ctx, &result, args.explain);
    Ok(())
}

fn print_human(ctx: &CommandContext, result: &FusedResult, explain: bool) {
    let colors = ctx.format.use_colors();
    if let Some(degraded) = &result.degraded {
        let warning = format!(
            "degraded: {} sub-query failed ({}); results use one source",
            degraded.failed, degraded.reason
        );
        if colors {
            eprintln!("{} {}", "!".yellow(), warning.as_str().yellow());
        } else {
            eprintln!("! {warning}");
        }
    }

    if result.hits.is_empty() {
        println!("No results");
        return;
    }

    for (position, hit) in result.hits.iter().enumerate() {
        let id = if colors {
            hit.document_id.as_str().bold().to_string()
        } else {
            hit.document_id.clone()
        };
        println!("{:>3}. {id}  {:.6}", position + 1, hit.fused_score);
        if explain {
            for part in &hit.contributions {
                println!(
                    "       {:<8} rank {:<3} score {:.4}",
                    part.source.as_str(),
                    part.rank,
                    part.score
                );
            }
        }
    }
}

/// Parse `0.1,0.2,0.3` or `[0.1, 0.2, 0.3]`.
fn parse_vector(raw: &str) -> Result<Vec<f32>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|err| HsError::InvalidQuery(format!("invalid vector {raw}: {err}")));
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f32>()
                .map_err(|err| HsError::InvalidQuery(format!("invalid vector component {part}: {err}")))
        })
        .collect()
}

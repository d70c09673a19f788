//! hsearch ingest - Validate and bulk-write documents
//!
//! Accepts a JSON array of documents or NDJSON (one document per line).
//! Field names follow the index schema; `id` is optional.

use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use serde_json::Value;
use tokio::io::AsyncReadExt;

use super::CommandContext;
use crate::cli::output::{emit_human, emit_json, machine_ok};
use crate::cli::progress::spinner;
use crate::error::Result;
use crate::ingest::{IngestError, IngestErrorKind, IngestReport};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON or NDJSON file with documents ("-" reads stdin)
    pub file: PathBuf,

    /// Exit with an error if any document was rejected
    #[arg(long)]
    pub strict: bool,
}

pub async fn run(ctx: &CommandContext, args: &IngestArgs) -> Result<()> {
    ctx.provision().await?;
    let report = ingest_file(ctx, &args.file).await?;
    emit_report(ctx, &report)?;
    if args.strict {
        report.into_result()?;
    }
    Ok(())
}

/// Read `path` and ingest it into the context's index.
pub(crate) async fn ingest_file(ctx: &CommandContext, path: &Path) -> Result<IngestReport> {
    let raw = read_input(path).await?;
    let (documents, unparsable) = parse_payload(&raw);

    let progress = spinner(ctx.progress, &format!("Ingesting {} documents", documents.len()));
    let outcome = ctx.service.ingest_values(ctx.index(), documents).await;
    progress.finish_and_clear();

    let mut report = outcome?;
    report.errors.extend(unparsable);
    Ok(report)
}

async fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        tokio::io::stdin().read_to_string(&mut raw).await?;
        Ok(raw)
    } else {
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

/// Split a payload into documents. Lines that are not JSON are reported
/// individually instead of failing the whole file.
fn parse_payload(raw: &str) -> (Vec<Value>, Vec<IngestError>) {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        return match serde_json::from_str::<Vec<Value>>(trimmed) {
            Ok(documents) => (documents, Vec::new()),
            Err(err) => (
                Vec::new(),
                vec![IngestError {
                    id: "payload".to_string(),
                    kind: IngestErrorKind::Malformed,
                    message: format!("invalid JSON array: {err}"),
                }],
            ),
        };
    }

    let mut documents = Vec::new();
    let mut errors = Vec::new();
    for (number, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(value) => documents.push(value),
            Err(err) => errors.push(IngestError {
                id: format!("line {}", number + 1),
                kind: IngestErrorKind::Malformed,
                message: format!("invalid JSON: {err}"),
            }),
        }
    }
    (documents, errors)
}

fn emit_report(ctx: &CommandContext, report: &IngestReport) -> Result<()> {
    if ctx.machine() {
        let mut response = machine_ok(report);
        if report.is_partial() {
            response = response.with_warning(format!(
                "{} of {} documents rejected",
                report.errors.len(),
                report.total()
            ));
        }
        return emit_json(&response);
    }

    let colors = ctx.format.use_colors();
    let accepted = report.accepted.to_string();
    let rejected = report.errors.len().to_string();
    let mut layout = ctx.layout();
    layout
        .kv("Index", ctx.index())
        .kv("Accepted", &if colors { accepted.as_str().green().to_string() } else { accepted })
        .kv(
            "Rejected",
            &if colors && report.is_partial() {
                rejected.as_str().yellow().to_string()
            } else {
                rejected
            },
        );
    if report.is_partial() {
        layout.blank();
        for error in &report.errors {
            layout.bullet(&format!("{} [{}] {}", error.id, error.kind.code(), error.message));
        }
    }
    emit_human(layout);
    Ok(())
}

//! hsearch - Hybrid lexical + vector search over an index store

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hybrid_search::cli::output::{emit_json, machine_error};
use hybrid_search::cli::{Cli, commands};
use hybrid_search::{HsError, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.output_format().is_machine_readable() {
                // Machine mode: structured error on stdout
                if emit_json(&machine_error(&e)).is_err() {
                    eprintln!("Error: {e}");
                }
            } else {
                eprintln!("Error: {e}");
                let suggestion = e.to_structured().suggestion;
                if !suggestion.is_empty() {
                    eprintln!("Hint: {suggestion}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        tokio::select! {
            result = commands::run(cli) => result,
            _ = tokio::signal::ctrl_c() => Err(HsError::Io(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "interrupted",
            ))),
        }
    })
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,hybrid_search=info",
        1 => "info,hybrid_search=debug",
        2 => "debug,hybrid_search=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.output_format().is_machine_readable() {
        // JSON logging for machine mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

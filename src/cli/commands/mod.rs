//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::cli::output::{HumanLayout, OutputFormat, emit_json, machine_ok};
use crate::cli::progress::ProgressMode;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;
use crate::service::{HybridSearch, ProvisionedIndex};

pub mod completions;
pub mod count;
pub mod ensure;
pub mod get;
pub mod health;
pub mod ingest;
pub mod migrate;
pub mod reset;
pub mod search;

/// Everything a command needs: the connected service and output settings.
pub struct CommandContext {
    pub service: HybridSearch,
    pub format: OutputFormat,
    pub progress: ProgressMode,
}

impl CommandContext {
    /// Load config, apply CLI overrides and acquire the store handle.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let mut config = Config::load(cli.config.as_deref(), &cwd)?;
        if let Some(backend) = &cli.store {
            config.store.backend.clone_from(backend);
        }
        if let Some(url) = &cli.url {
            config.store.url.clone_from(url);
        }
        if let Some(index) = &cli.index {
            config.index.name.clone_from(index);
        }

        let format = cli.output_format();
        Ok(Self {
            service: HybridSearch::connect(config)?,
            format,
            progress: ProgressMode::detect(format.is_machine_readable(), cli.quiet),
        })
    }

    #[must_use]
    pub const fn machine(&self) -> bool {
        self.format.is_machine_readable()
    }

    #[must_use]
    pub fn layout(&self) -> HumanLayout {
        HumanLayout::new(self.format.use_colors())
    }

    #[must_use]
    pub fn index(&self) -> &str {
        self.service.default_index()
    }

    /// Startup provisioning for commands that read or write documents.
    pub async fn provision(&self) -> Result<Vec<ProvisionedIndex>> {
        self.service.provision().await
    }

    pub async fn shutdown(self) {
        self.service.shutdown().await;
    }
}

/// Dispatch a command to its handler
pub async fn run(cli: &Cli) -> Result<()> {
    if let Commands::Completions(args) = &cli.command {
        return completions::run(args);
    }

    let ctx = CommandContext::from_cli(cli)?;
    let result = match &cli.command {
        Commands::Health(args) => health::run(&ctx, args).await,
        Commands::Ensure(args) => ensure::run(&ctx, args).await,
        Commands::Migrate(args) => migrate::run(&ctx, args).await,
        Commands::Reset(args) => reset::run(&ctx, args).await,
        Commands::Ingest(args) => ingest::run(&ctx, args).await,
        Commands::Search(args) => search::run(&ctx, args).await,
        Commands::Get(args) => get::run(&ctx, args).await,
        Commands::Count(args) => count::run(&ctx, args).await,
        Commands::Completions(_) => Ok(()),
    };
    ctx.shutdown().await;
    result
}

/// Print the outcome of a lifecycle command.
pub(crate) fn emit_lifecycle(ctx: &CommandContext, provisioned: &ProvisionedIndex) -> Result<()> {
    use colored::Colorize;

    if ctx.machine() {
        return emit_json(&machine_ok(provisioned));
    }
    let action = provisioned.action.as_str();
    let action = if ctx.format.use_colors() {
        action.green().bold().to_string()
    } else {
        action.to_string()
    };
    let mut layout = ctx.layout();
    layout.kv("Index", &provisioned.index).kv("Action", &action);
    if let crate::lifecycle::LifecycleAction::Recreated {
        previous_version: Some(version),
    } = provisioned.action
    {
        layout.kv("Previous", &format!("version {version}"));
    }
    crate::cli::output::emit_human(layout);
    Ok(())
}

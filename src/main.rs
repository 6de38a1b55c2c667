use anyhow::Result;
use clap::Parser;

use flux_contests::cli::commands::config::ConfigShowCommand;
use flux_contests::cli::commands::create::CreateCommand;
use flux_contests::cli::commands::locks::{
    LockCreateCommand, LockDeleteCommand, LockSearchCommand, LockShowCommand, LockUpdateCommand,
};
use flux_contests::cli::commands::problems::ProblemSearchCommand;
use flux_contests::cli::commands::{show_how_to_get_started, Command};
use flux_contests::cli::{Cli, Commands, ConfigCommand, LocksCommand, ProblemsCommand};
use flux_contests::config::FluxConfig;
use flux_contests::telemetry::init_telemetry;

fn load_config(cli: &Cli) -> Result<FluxConfig> {
    FluxConfig::load_env_file()?;
    match &cli.config {
        Some(path) => FluxConfig::load_from_file(path),
        None => Ok(flux_contests::config()?.clone()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_telemetry(&config.observability)?;

    let Some(command) = cli.command else {
        return show_how_to_get_started();
    };

    let runtime = tokio::runtime::Runtime::new()?;
    match command {
        Commands::Create { plan, dry_run } => runtime.block_on(async {
            CreateCommand::new(config, plan)
                .with_dry_run(dry_run)
                .execute()
                .await
        }),
        Commands::Locks { command } => match command {
            LocksCommand::Search { name, view, page } => runtime.block_on(async {
                LockSearchCommand::new(config, name, view, page).execute().await
            }),
            LocksCommand::Create {
                name,
                description,
                lock_type,
                timeout,
            } => runtime.block_on(async {
                LockCreateCommand::new(config, name, description, lock_type, timeout)
                    .execute()
                    .await
            }),
            LocksCommand::Update {
                lock_id,
                name,
                description,
            } => runtime.block_on(async {
                LockUpdateCommand::new(config, lock_id, name, description)
                    .execute()
                    .await
            }),
            LocksCommand::Show { lock_id } => runtime.block_on(async {
                LockShowCommand::new(config, lock_id).execute().await
            }),
            LocksCommand::Delete { lock_id } => runtime.block_on(async {
                LockDeleteCommand::new(config, lock_id).execute().await
            }),
        },
        Commands::Problems { command } => match command {
            ProblemsCommand::Search { title } => runtime.block_on(async {
                ProblemSearchCommand::new(config, title).execute().await
            }),
        },
        Commands::Config { command } => match command {
            ConfigCommand::Show => runtime.block_on(async {
                ConfigShowCommand::new(config).execute().await
            }),
        },
    }
}

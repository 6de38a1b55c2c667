use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::types::LockType;
use crate::lock_view::LockView;

pub mod commands;

#[derive(Parser)]
#[command(name = "flux")]
#[command(about = "Create contests and manage locks on a Flux judge")]
#[command(long_about = "Flux creates contests from plan files, moving every selected problem under the \
                       contest's lock before the contest exists. Start with 'flux create plan.toml --dry-run' \
                       to preview the calls a submission would make.")]
pub struct Cli {
    /// Configuration file (defaults to flux.toml / .flux-rc in the working directory)
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a contest from a plan file
    Create {
        /// TOML plan describing the contest
        plan: PathBuf,
        /// Replay the submission against an in-memory copy of the referenced entities
        #[arg(long, help = "Show the backend calls without changing anything on the server")]
        dry_run: bool,
    },
    /// Browse, create, edit and delete locks
    Locks {
        #[command(subcommand)]
        command: LocksCommand,
    },
    /// Search problems
    Problems {
        #[command(subcommand)]
        command: ProblemsCommand,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum LocksCommand {
    /// Search locks by name
    Search {
        #[arg(long, help = "Only locks whose name contains this text")]
        name: Option<String>,
        #[arg(long, value_enum, default_value_t = LockView::All, help = "Which locks to show")]
        view: LockView,
        #[arg(long, default_value = "1", help = "Result page, starting at 1")]
        page: u32,
    },
    /// Create a manual or timer lock
    Create {
        #[arg(long, help = "Lock name")]
        name: String,
        #[arg(long, default_value = "", help = "What the lock guards")]
        description: String,
        #[arg(long = "type", value_enum, default_value_t = LockType::Manual, help = "Lock type")]
        lock_type: LockType,
        #[arg(long, help = "Unlock time for timer locks, RFC 3339 (e.g. 2026-11-01T18:00:00Z)")]
        timeout: Option<DateTime<Utc>>,
    },
    /// Rename or re-describe a manual lock
    Update {
        lock_id: String,
        #[arg(long, help = "New name")]
        name: Option<String>,
        #[arg(long, help = "New description")]
        description: Option<String>,
    },
    /// Show one lock
    Show {
        lock_id: String,
    },
    /// Delete a manual lock, unlocking everything it guards
    Delete {
        lock_id: String,
    },
}

#[derive(Subcommand)]
pub enum ProblemsCommand {
    /// Search problems by title
    Search {
        #[arg(long, help = "Only problems whose title contains this text")]
        title: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
}

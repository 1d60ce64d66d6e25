// CLI module for handling command-line interface

use crate::constants::{DEFAULT_MC_VERSION, DEFAULT_SERVER};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "craftpm")]
#[command(about = "Plugin and mod manager for Minecraft servers")]
#[command(version)]
pub struct Cli {
    /// Print debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PlanFlags {
    /// Allow major version jumps by taking the newest listed release
    #[arg(long)]
    pub latest: bool,
    /// Skip updates that don't declare support for the server's game version
    #[arg(long)]
    pub safe: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a manifest for a server
    Init {
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
        #[arg(long, default_value = DEFAULT_MC_VERSION)]
        version: String,
    },
    /// Search all repositories, or one with --repo
    Search {
        query: String,
        #[arg(long)]
        repo: Option<String>,
    },
    /// Show details for a resource, e.g. `modrinth:luckperms`
    Info { spec: String },
    /// List the version history of a resource
    Versions { spec: String },
    /// Install a resource, e.g. `spigot:19254@5.1.0`
    Add { spec: String },
    /// Remove an installed dependency by name
    Remove { name: String },
    /// Report dependencies with updates available
    Outdated {
        #[command(flatten)]
        flags: PlanFlags,
    },
    /// Install available updates
    Update {
        #[command(flatten)]
        flags: PlanFlags,
        /// Show what would change without downloading
        #[arg(long)]
        dry_run: bool,
    },
    /// List configured repositories
    Repos,
}

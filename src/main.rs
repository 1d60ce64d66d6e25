mod cli;
mod commands;
mod config;
mod constants;
mod error;
mod install;
mod manifest;
mod planner;
mod sources;
mod ui;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use log::LevelFilter;

fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    // RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init { server, version } => commands::init::init(server, version),
        Commands::Remove { name } => commands::remove::remove(name),
        Commands::Search { query, repo } => {
            commands::search::search(&Context::load()?, query, repo).await
        }
        Commands::Info { spec } => commands::info::info(&Context::load()?, spec).await,
        Commands::Versions { spec } => {
            commands::versions::versions(&Context::load()?, spec).await
        }
        Commands::Add { spec } => commands::add::add(&Context::load()?, spec).await,
        Commands::Outdated { flags } => {
            commands::outdated::outdated(&Context::load()?, flags).await
        }
        Commands::Update { flags, dry_run } => {
            commands::update::update(&Context::load()?, flags, dry_run).await
        }
        Commands::Repos => commands::repos::repos(&Context::load()?),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command).await {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

//! BizVenture Control - operator CLI for the BizVenture store.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Quiet by default; RUST_LOG=info surfaces store activity
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init(cli.db),
        Commands::Seed => commands::seed(cli.db),
        Commands::CreateUser {
            username,
            email,
            password,
            parent,
            age,
        } => commands::create_user(cli.db, username, email, password, parent, age),
        Commands::LinkChild { parent, child } => commands::link_child(cli.db, parent, child),
        Commands::Stats { username } => commands::stats(cli.db, username),
    }
}

//! Command-line argument parsing for bvkctl.
//!
//! Keeps the clap definitions separate from execution logic.

use clap::{Parser, Subcommand};

/// BizVenture operator CLI
#[derive(Parser)]
#[command(name = "bvkctl")]
#[command(about = "BizVenture Kids - operator console", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the default config and create the database
    Init,

    /// Install the demo learning path and scenario templates
    Seed,

    /// Create a user account directly in the store
    CreateUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Register a parent account instead of a child
        #[arg(long)]
        parent: bool,

        #[arg(long)]
        age: Option<i64>,
    },

    /// Link a child account under a parent
    LinkChild {
        /// Parent username
        #[arg(long)]
        parent: String,

        /// Child username
        #[arg(long)]
        child: String,
    },

    /// Show a user's progression card
    Stats {
        username: String,
    },
}

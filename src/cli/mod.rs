//! Command-line interface for Hall-3 Sports.

mod commands;

use clap::{Parser, Subcommand};

/// Hall-3 Sports - equipment lending backend
#[derive(Parser)]
#[command(name = "hall3")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Show the inventory with availability
    #[command(alias = "ls")]
    Inventory,

    /// List issue records
    Issues {
        /// Only show items currently held
        #[arg(long)]
        active: bool,
    },

    /// Show pending return and transfer requests
    Pending,
}

pub use commands::*;

//! Tidewear CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tw-cli migrate
//!
//! # Replace the catalog with the shipped products
//! tw-cli seed
//!
//! # Grant or remove admin rights
//! tw-cli admin promote -e owner@example.com
//! tw-cli admin demote -e owner@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Load products from a YAML file
//! - `admin promote|demote` - Set a user's admin flag

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;
use commands::seed::SeedOptions;

#[derive(Parser)]
#[command(name = "tw-cli")]
#[command(author, version, about = "Tidewear CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the product catalog
    Seed {
        /// YAML product list (defaults to the shipped catalog)
        #[arg(short, long)]
        file: Option<String>,

        /// Append instead of clearing existing products first
        #[arg(long)]
        keep_existing: bool,

        /// Randomize the new/sale/best-seller badges
        #[arg(long)]
        randomize_flags: bool,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant admin rights to an existing user
    Promote {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// Remove admin rights from a user
    Demote {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            file,
            keep_existing,
            randomize_flags,
        } => {
            commands::seed::products(SeedOptions {
                file,
                keep_existing,
                randomize_flags,
            })
            .await?;
        }
        Commands::Admin { action } => match action {
            AdminAction::Promote { email } => commands::admin::set_admin(&email, true).await?,
            AdminAction::Demote { email } => commands::admin::set_admin(&email, false).await?,
        },
    }
    Ok(())
}

//! Souq CLI - Database migrations and marketplace management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! souq-cli migrate
//!
//! # Create an admin account
//! souq-cli admin create -e admin@example.com -n "Site Admin" -p 'long-password'
//!
//! # Load categories, stores and products from YAML
//! souq-cli seed catalog crates/cli/seed/catalog.yaml
//!
//! # List, then delete, stores whose name contains "test"
//! souq-cli cleanup stores --pattern test
//! souq-cli cleanup stores --pattern test --yes
//! ```
//!
//! All commands read `DATABASE_URL` from the environment or `.env`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use souq_core::UserRole;

mod commands;

#[derive(Parser)]
#[command(name = "souq-cli")]
#[command(author, version, about = "Souq marketplace CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage privileged accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Remove test data
    Cleanup {
        #[command(subcommand)]
        target: CleanupTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new account, an admin unless another role is given
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Role (`admin`, `store_owner`, `customer`)
        #[arg(short, long, default_value = "admin")]
        role: UserRole,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert categories, stores and products from a YAML file
    Catalog {
        /// Path to the catalog YAML file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CleanupTarget {
    /// Delete stores (and their products) whose name contains a pattern
    Stores {
        /// Case-insensitive substring of the store name
        #[arg(short, long)]
        pattern: String,

        /// Delete without this flag only lists the matches
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
                role,
            } => {
                commands::admin::create_user(&email, &name, &password, role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
        Commands::Cleanup { target } => match target {
            CleanupTarget::Stores { pattern, yes } => {
                commands::cleanup::stores(&pattern, yes).await?;
            }
        },
    }
    Ok(())
}

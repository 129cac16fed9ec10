//! Driftwood Roasters CLI - catalog sync and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Mirror every vendor product into the CMS
//! driftwood sync all
//!
//! # Delete every product document from the CMS
//! driftwood cms delete-all
//!
//! # Archive every product at the vendor
//! driftwood vendor archive-all
//!
//! # One-time catalog migration
//! driftwood migrate square-to-stripe
//! ```
//!
//! # Commands
//!
//! - `sync` - Vendor to CMS catalog sync
//! - `cms` - CMS dataset maintenance
//! - `vendor` - Vendor catalog maintenance
//! - `migrate` - One-time migrations between vendors

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "driftwood")]
#[command(author, version, about = "Driftwood Roasters CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Vendor to CMS catalog sync
    Sync {
        #[command(subcommand)]
        target: SyncTarget,
    },
    /// CMS dataset maintenance
    Cms {
        #[command(subcommand)]
        action: CmsAction,
    },
    /// Vendor catalog maintenance
    Vendor {
        #[command(subcommand)]
        action: VendorAction,
    },
    /// One-time migrations between vendors
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
}

#[derive(Subcommand)]
enum SyncTarget {
    /// Sync every vendor product into the CMS
    All,
}

#[derive(Subcommand)]
enum CmsAction {
    /// Delete every product document from the CMS dataset
    DeleteAll,
}

#[derive(Subcommand)]
enum VendorAction {
    /// Archive every product at the vendor
    ArchiveAll,
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Copy the Square catalog into Stripe (products and prices)
    SquareToStripe,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sync { target } => match target {
            SyncTarget::All => commands::sync::all().await?,
        },
        Commands::Cms { action } => match action {
            CmsAction::DeleteAll => commands::cms::delete_all().await?,
        },
        Commands::Vendor { action } => match action {
            VendorAction::ArchiveAll => commands::vendor::archive_all().await?,
        },
        Commands::Migrate { target } => match target {
            MigrateTarget::SquareToStripe => commands::migrate::square_to_stripe().await?,
        },
    }
    Ok(())
}

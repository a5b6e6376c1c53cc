//! Stockist CLI - command-line interface for the catalog sync engine.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stockist")]
#[command(version)]
#[command(about = "A vendor catalog synchronization engine")]
#[command(
    long_about = "Stockist ingests snapshots of external vendors' product catalogs and \
reconciles them into a local database, keeping an audit trail of every \
reconciliation attempt. Syncs are dry runs unless --apply is passed."
)]
#[command(after_long_help = r#"EXAMPLES
    Register a vendor with the snapshot strategy:
        $ stockist vendor add acme "Acme Corp" --integration snapshot

    Preview what a sync would change (dry run is the default):
        $ stockist sync acme --source /data/acme.json

    Apply for real:
        $ stockist sync acme --source /data/acme.json --apply

    Inspect run history and last known good state:
        $ stockist runs --vendor acme --status failed
        $ stockist state acme

CONFIGURATION
    Stockist reads configuration from:
      1. ~/.config/stockist/config.toml (or $XDG_CONFIG_HOME/stockist/config.toml)
      2. ./stockist.toml
      3. Environment variables (STOCKIST_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    STOCKIST_DATABASE_URL     Database connection string (default: ~/.local/state/stockist/stockist.db)
    STOCKIST_SNAPSHOT_DIR     Directory holding <vendor>.json snapshot files
    STOCKIST_ENV              Set to "production" to disable developer fixtures
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Manage the vendor registry
    Vendor {
        #[command(subcommand)]
        action: VendorAction,
    },
    /// Synchronize a vendor's catalog
    Sync {
        /// Vendor slug to synchronize
        vendor: String,

        /// Apply the diff for real (without this flag the sync is a dry run)
        #[arg(long)]
        apply: bool,

        /// Explicit snapshot path, overriding source resolution
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Actor recorded for audit attribution (default from config)
        #[arg(short, long)]
        actor: Option<String>,

        /// JSON file of raw items to preview against, bypassing source
        /// resolution (dry run only)
        #[arg(long)]
        inject: Option<PathBuf>,

        /// Print the summary as JSON instead of styled text
        #[arg(long)]
        json: bool,
    },
    /// List sync run history, most recent first
    Runs {
        /// Restrict to one vendor
        #[arg(short, long)]
        vendor: Option<String>,

        /// Restrict to one status (pending, success, failed)
        #[arg(short, long)]
        status: Option<String>,

        /// Only runs started at or after this instant (RFC 3339)
        #[arg(long)]
        since: Option<String>,

        /// Only runs started before this instant (RFC 3339)
        #[arg(long)]
        until: Option<String>,

        /// Page size
        #[arg(short, long, default_value_t = 20)]
        limit: u64,
    },
    /// Show a vendor's last known good sync state
    State {
        /// Vendor slug
        vendor: String,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[derive(Subcommand)]
enum VendorAction {
    /// Register a vendor
    Add {
        /// URL-safe vendor slug
        slug: String,

        /// Human-readable display name
        name: String,

        /// Sync strategy (snapshot, remote-api); omit to register without one
        #[arg(short, long)]
        integration: Option<String>,
    },
    /// List registered vendors
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing for non-TTY mode (structured logging)
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("stockist=info,stockist_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    let database_url = config
        .database_url()
        .ok_or("Failed to determine database URL")?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Vendor { action } => {
            commands::vendor::handle_vendor(action, &database_url).await?;
        }
        Commands::Sync {
            vendor,
            apply,
            source,
            actor,
            inject,
            json,
        } => {
            commands::sync::handle_sync(
                commands::sync::SyncArgs {
                    vendor,
                    apply,
                    source,
                    actor,
                    inject,
                    json,
                },
                &config,
                &database_url,
            )
            .await?;
        }
        Commands::Runs {
            vendor,
            status,
            since,
            until,
            limit,
        } => {
            commands::runs::handle_runs(vendor, status, since, until, limit, &database_url)
                .await?;
        }
        Commands::State { vendor } => {
            commands::state::handle_state(&vendor, &database_url).await?;
        }
    }

    Ok(())
}

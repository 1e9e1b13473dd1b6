//! Schema migration runner
//!
//! Run with: cargo run --bin migration -- <up|down|fresh|status>
//!
//! The database URL comes from the regular configuration stack (`APP__DATABASE_URL`
//! and friends); `--database-url` overrides it.

use clap::{Parser, Subcommand};
use migrations::{Migrator, MigratorTrait};
use tracing::info;

use procurement_api::{config, db};

#[derive(Debug, Parser)]
#[command(name = "migration", about = "Manage the procurement-api database schema")]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: MigrationCommand,
}

#[derive(Debug, Subcommand)]
enum MigrationCommand {
    /// Apply pending migrations
    Up {
        /// Apply at most this many
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and re-apply all migrations
    Fresh,
    /// Show which migrations have been applied
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    info!("Connecting to database");
    let conn = db::establish_connection_from_app_config(&cfg).await?;

    match cli.command {
        MigrationCommand::Up { steps } => {
            Migrator::up(&conn, steps).await?;
            info!("Migrations applied");
        }
        MigrationCommand::Down { steps } => {
            Migrator::down(&conn, Some(steps)).await?;
            info!(steps, "Migrations rolled back");
        }
        MigrationCommand::Fresh => {
            Migrator::fresh(&conn).await?;
            info!("Schema recreated");
        }
        MigrationCommand::Status => {
            Migrator::status(&conn).await?;
        }
    }

    Ok(())
}

//! sift: statement ingestion CLI
//!
//! Usage:
//!   sift import --bank chase --card "Freedom" export.csv
//!   sift ocr --card "Costco Visa" scan.pdf photo.jpg
//!   cat scan.pdf | sift ocr --card "Costco Visa" --year 2023 --stdin-name scan.pdf
//!   sift banks

mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use sift_core::UserId;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use commands::RunContext;
use config::SiftConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    if let Commands::Banks = cli.command {
        return commands::cmd_banks();
    }

    let ctx = RunContext {
        config: SiftConfig::load(cli.config.as_deref())?,
        user: UserId(cli.user),
        dry_run: cli.dry_run,
        db: cli.db,
    };

    match &cli.command {
        Commands::Import { bank, card, files } => commands::cmd_import(&ctx, bank, card, files).await,
        Commands::Ocr { card, year, stdin_name, files } => {
            let scan = commands::ScanOptions { card: card.as_str(), year: *year };
            commands::cmd_ocr(&ctx, &scan, files, stdin_name.as_deref()).await
        }
        Commands::Banks => commands::cmd_banks(),
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sift", about = "Import bank statements and categorize transactions.", version)]
pub struct Cli {
    /// Config file (default: <config dir>/sift/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path (default: <data dir>/sift/sift.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// User the transactions belong to
    #[arg(long, global = true, default_value_t = 1)]
    pub user: i64,

    /// Print canonical CSV to stdout instead of storing rows
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import CSV exports from a known bank.
    Import {
        /// Bank id, e.g. chase or citibank (see `sift banks`)
        #[arg(long)]
        bank: String,
        /// Card label stored on every row
        #[arg(long)]
        card: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Import scanned statements (PDF, JPEG, PNG, HEIC) through OCR.
    Ocr {
        #[arg(long)]
        card: String,
        /// Year for posting dates printed without one (default: current year)
        #[arg(long)]
        year: Option<i32>,
        /// Read one document from stdin; NAME supplies its file type, e.g. scan.pdf
        #[arg(long, value_name = "NAME")]
        stdin_name: Option<String>,
        #[arg(required_unless_present = "stdin_name")]
        files: Vec<PathBuf>,
    },
    /// List supported bank ids.
    Banks,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_import_with_globals() {
        let cli = Cli::try_parse_from([
            "sift", "--user", "4", "import", "--bank", "chase", "--card", "Freedom", "a.csv", "b.csv",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.user, 4);
        assert!(cli.dry_run);
        match cli.command {
            Commands::Import { bank, card, files } => {
                assert_eq!(bank, "chase");
                assert_eq!(card, "Freedom");
                assert_eq!(files.len(), 2);
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn ocr_requires_files() {
        assert!(Cli::try_parse_from(["sift", "ocr", "--card", "Visa"]).is_err());
    }

    #[test]
    fn ocr_accepts_stdin_instead_of_files() {
        let cli = Cli::try_parse_from([
            "sift", "ocr", "--card", "Visa", "--year", "2023", "--stdin-name", "scan.pdf",
        ])
        .unwrap();
        match cli.command {
            Commands::Ocr { year, stdin_name, files, .. } => {
                assert_eq!(year, Some(2023));
                assert_eq!(stdin_name.as_deref(), Some("scan.pdf"));
                assert!(files.is_empty());
            }
            _ => panic!("expected ocr"),
        }
    }
}

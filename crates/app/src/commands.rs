use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sift_core::{sort_by_date, CanonicalRow, UserId};
use sift_import::{
    import_from_dataframe, map_raw_table_to_standard, map_raw_table_to_standard_in_year,
    write_canonical_csv, Categorizer, CanonicalizerRegistry, OpenAiCompatibleCategorizer,
};
use sift_ocr::{default_backend, extract_statement_to_df, OcrBackend, StagedUpload};
use sift_storage::{create_db, SqliteRepository};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{error, info, warn};

use crate::config::SiftConfig;

pub struct RunContext {
    pub config: SiftConfig,
    pub user: UserId,
    pub dry_run: bool,
    pub db: Option<PathBuf>,
}

/// Where finished rows go: stdout as CSV, or the database.
enum Sink {
    Print(Vec<CanonicalRow>),
    Store(SqliteRepository),
}

impl Sink {
    async fn open(ctx: &RunContext) -> Result<Self> {
        if ctx.dry_run {
            return Ok(Sink::Print(Vec::new()));
        }
        let path = match &ctx.db {
            Some(path) => path.clone(),
            None => default_db_path()?,
        };
        let pool = create_db(&path)
            .await
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Ok(Sink::Store(SqliteRepository::new(pool)))
    }

    async fn accept(&mut self, user: UserId, file: &Path, rows: Vec<CanonicalRow>) {
        match self {
            Sink::Print(all) => all.extend(rows),
            Sink::Store(repo) => {
                let report = import_from_dataframe(&rows, user, repo).await;
                info!(file = %file.display(), %report, "Stored transactions");
                if !report.is_clean() {
                    for e in &report.errors {
                        warn!(file = %file.display(), "{e}");
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<()> {
        if let Sink::Print(rows) = self {
            write_canonical_csv(&rows, std::io::stdout().lock())?;
        }
        Ok(())
    }
}

fn default_db_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "sift", "sift")
        .context("Could not determine a data directory; pass --db")?;
    std::fs::create_dir_all(dirs.data_dir())?;
    Ok(dirs.data_dir().join("sift.db"))
}

pub fn build_categorizer(config: &SiftConfig) -> Result<Categorizer> {
    let categorizer = Categorizer::new(&config.categories);
    let Some(host) = config.ai.host.as_deref() else {
        return Ok(categorizer);
    };
    let ai = OpenAiCompatibleCategorizer::new(
        host,
        config.ai.model(),
        config.ai.api_key.clone(),
        config.ai.timeout(),
    )
    .context("Failed to set up AI categorizer")?;
    info!(host, model = ai.model(), "AI categorization fallback enabled");
    Ok(categorizer.with_ai(Arc::new(ai)))
}

fn finish_files(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        bail!("{failed} of {total} files failed");
    }
    Ok(())
}

pub async fn cmd_import(ctx: &RunContext, bank: &str, card: &str, files: &[PathBuf]) -> Result<()> {
    let registry = CanonicalizerRegistry::with_default_banks();
    registry.get(bank)?;
    let categorizer = build_categorizer(&ctx.config)?;
    let mut sink = Sink::open(ctx).await?;

    let mut failed = 0;
    for file in files {
        match registry
            .create_from_file(ctx.user, bank, card, file, &categorizer)
            .await
        {
            Ok(statement) => {
                if statement.dropped_rows > 0 {
                    warn!(file = %file.display(), dropped = statement.dropped_rows, "Skipped unparseable rows");
                }
                sink.accept(ctx.user, file, statement.into_rows()).await;
            }
            Err(e) => {
                error!(file = %file.display(), error = %e, "Import failed");
                failed += 1;
            }
        }
    }

    sink.finish()?;
    finish_files(failed, files.len())
}

/// Per-run settings for scanned statements.
pub struct ScanOptions<'a> {
    pub card: &'a str,
    /// Year for dates like `01/15`; `None` means the current year.
    pub year: Option<i32>,
}

/// Write an upload arriving on a stream to a temp file named after `name`.
pub async fn stage_upload(name: &str, mut input: impl AsyncRead + Unpin) -> Result<StagedUpload> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes).await.context("Failed to read upload")?;
    if bytes.is_empty() {
        bail!("Upload '{name}' is empty");
    }
    let staged = StagedUpload::from_bytes(name, &bytes).context("Failed to stage upload")?;
    info!(name, bytes = bytes.len(), path = %staged.path().display(), "Staged upload");
    Ok(staged)
}

pub async fn cmd_ocr(
    ctx: &RunContext,
    scan: &ScanOptions<'_>,
    files: &[PathBuf],
    stdin_name: Option<&str>,
) -> Result<()> {
    let backend = default_backend(&ctx.config.ocr);
    let categorizer = build_categorizer(&ctx.config)?;

    // Held until the loop ends so the temp file outlives its scan.
    let staged = match stdin_name {
        Some(name) => Some(stage_upload(name, tokio::io::stdin()).await?),
        None => None,
    };
    let mut inputs: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
    if let Some(staged) = &staged {
        inputs.push(staged.path());
    }

    let mut sink = Sink::open(ctx).await?;
    let mut failed = 0;
    for file in inputs.iter().copied() {
        match scan_file(ctx, scan, file, backend.as_ref(), &categorizer).await {
            Ok(rows) => sink.accept(ctx.user, file, rows).await,
            Err(e) => {
                error!(file = %file.display(), error = %format!("{e:#}"), "OCR import failed");
                failed += 1;
            }
        }
    }

    sink.finish()?;
    finish_files(failed, inputs.len())
}

/// OCR one document, infer its columns and categorize the rows. Rows with no
/// keyword hit go to the AI in a single batch.
pub async fn scan_file(
    ctx: &RunContext,
    scan: &ScanOptions<'_>,
    file: &Path,
    backend: &dyn OcrBackend,
    categorizer: &Categorizer,
) -> Result<Vec<CanonicalRow>> {
    let raw = extract_statement_to_df(file, &ctx.config.ocr, backend).await?;
    let mut rows = match scan.year {
        Some(year) => map_raw_table_to_standard_in_year(&raw, scan.card, year),
        None => map_raw_table_to_standard(&raw, scan.card),
    };
    info!(file = %file.display(), extracted = raw.len(), kept = rows.len(), "Mapped OCR table");

    let mut unresolved = Vec::new();
    for (i, row) in rows.iter_mut().enumerate() {
        match categorizer.match_keyword(&row.description) {
            Some(category) => row.category = Some(category.to_string()),
            None => unresolved.push(i),
        }
    }

    if !unresolved.is_empty() {
        let descriptions: Vec<String> =
            unresolved.iter().map(|&i| rows[i].description.clone()).collect();
        let answers = categorizer.categorize_batch(&descriptions).await;
        for (&i, answer) in unresolved.iter().zip(answers) {
            rows[i].category = Some(answer);
        }
    }

    sort_by_date(&mut rows);
    Ok(rows)
}

pub fn cmd_banks() -> Result<()> {
    for id in CanonicalizerRegistry::with_default_banks().available() {
        println!("{id}");
    }
    Ok(())
}

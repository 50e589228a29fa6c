//! PDF handling: text-layer check, OCR repair and layout table extraction.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use lopdf::Document;
use regex::Regex;
use sift_core::{cell, Cell, RawTable};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::types::OcrConfig;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    Load(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{program} did not finish within {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

/// True when any page yields non-blank text. Pages whose text cannot be
/// decoded count as blank.
pub fn has_text_layer(path: &Path) -> Result<bool, PdfError> {
    let doc = Document::load(path)?;
    let searchable = doc.get_pages().keys().any(|&page| {
        doc.extract_text(&[page])
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    });
    debug!(path = %path.display(), searchable, "Checked PDF text layer");
    Ok(searchable)
}

/// Run `program` with `args`, killing it if it outlives `timeout`.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> Result<Output, PdfError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| PdfError::Spawn { program: program.to_string(), source })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| PdfError::Timeout { program: program.to_string(), timeout })??;

    if !output.status.success() {
        return Err(PdfError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// Add a text layer to a scanned PDF. The repaired copy lives in a temporary
/// file that is deleted when the handle drops.
pub async fn ocr_repair(input: &Path, config: &OcrConfig) -> Result<NamedTempFile, PdfError> {
    let output = tempfile::Builder::new().prefix("sift-ocr-").suffix(".pdf").tempfile()?;
    info!(path = %input.display(), tool = %config.ocrmypdf, "Running OCR repair on scanned PDF");
    run_tool(
        &config.ocrmypdf,
        [OsStr::new("--skip-text"), input.as_os_str(), output.path().as_os_str()],
        config.timeout(),
    )
    .await?;
    Ok(output)
}

/// Page text with the visual layout kept; pages are separated by form feeds.
pub async fn render_layout(path: &Path, config: &OcrConfig) -> Result<String, PdfError> {
    let output = run_tool(
        &config.pdftotext,
        [OsStr::new("-layout"), path.as_os_str(), OsStr::new("-")],
        config.timeout(),
    )
    .await?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn re_column_gap() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\s{2,}").expect("invalid regex"))
}

/// Cells of a layout line, split on runs of two or more spaces.
fn split_cells(line: &str) -> Vec<&str> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    re_column_gap().split(line).collect()
}

/// Tables found in layout text: runs of at least two consecutive lines that
/// each split into two or more cells. Blank lines end a run.
pub fn detect_tables(text: &str) -> Vec<Vec<Vec<String>>> {
    let mut tables = Vec::new();
    for page in text.split('\x0c') {
        let mut run: Vec<Vec<String>> = Vec::new();
        for line in page.lines() {
            let cells = split_cells(line);
            if cells.len() >= 2 {
                run.push(cells.into_iter().map(str::to_string).collect());
            } else {
                flush_run(&mut run, &mut tables);
            }
        }
        flush_run(&mut run, &mut tables);
    }
    tables
}

fn flush_run(run: &mut Vec<Vec<String>>, tables: &mut Vec<Vec<Vec<String>>>) {
    if run.len() >= 2 {
        tables.push(std::mem::take(run));
    } else {
        run.clear();
    }
}

/// Stack every table into one positional table as wide as the widest row.
pub fn tables_to_raw(tables: Vec<Vec<Vec<String>>>) -> RawTable {
    RawTable::positional(
        tables
            .into_iter()
            .flatten()
            .map(|row| row.iter().map(|v| cell(v)).collect::<Vec<Cell>>()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn write_pdf(path: &Path, text: Option<&str>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut operations = Vec::new();
        if let Some(text) = text {
            operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ];
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn text_pdf_is_searchable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.pdf");
        write_pdf(&path, Some("01/15/2024 SHELL OIL 50.00"));
        assert!(has_text_layer(&path).unwrap());
    }

    #[test]
    fn blank_pdf_is_not_searchable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        write_pdf(&path, None);
        assert!(!has_text_layer(&path).unwrap());
    }

    #[test]
    fn non_pdf_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        assert!(matches!(has_text_layer(&path), Err(PdfError::Load(_))));
    }

    #[test]
    fn detects_runs_of_multi_cell_lines() {
        let text = "ACME CARD SERVICES\n\
                    \n\
                    01/03/2024    STARBUCKS SEATTLE      4.50\n\
                    01/04/2024    SHELL OIL 5521        40.00\n\
                    01/05/2024    AMAZON MKTPLACE       19.99   pending\n\
                    \n\
                    Total      64.49\n\
                    \x0c\
                    Page 2 heading\n\
                    02/01/2024    NETFLIX               15.49\n\
                    02/02/2024    SPOTIFY                9.99\n";
        let tables = detect_tables(text);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 3);
        assert_eq!(tables[0][1], vec!["01/04/2024", "SHELL OIL 5521", "40.00"]);
        assert_eq!(tables[1][0][1], "NETFLIX");

        let raw = tables_to_raw(tables);
        assert_eq!(raw.len(), 5);
        assert_eq!(raw.width(), 4);
        assert_eq!(raw.get(0, 3), None);
        assert_eq!(raw.get(2, 3), Some("pending"));
    }

    #[test]
    fn single_multi_cell_line_is_not_a_table() {
        assert!(detect_tables("Total      64.49\nthanks\n").is_empty());
        assert!(detect_tables("").is_empty());
    }

    #[tokio::test]
    async fn missing_tool_is_a_spawn_error() {
        let err = run_tool("sift-no-such-tool", ["x"], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let err = run_tool("sleep", ["5"], Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, PdfError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_reports_status() {
        let err = run_tool("false", Vec::<&str>::new(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::Failed { .. }));
    }
}

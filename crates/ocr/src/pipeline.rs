use std::path::Path;

use sift_core::RawTable;
use thiserror::Error;
use tracing::info;

use crate::lines::lines_to_table;
use crate::pdf::{self, PdfError};
use crate::preprocess::{self, PreprocessError};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::{DocumentKind, OcrConfig, SUPPORTED_EXTENSIONS};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported file type '{}'; expected one of: {}", .path, SUPPORTED_EXTENSIONS.join(", "))]
    UnsupportedFileType { path: String },
    #[error("No codec available to decode {path}: {detail}")]
    MissingCodec { path: String, detail: String },
    #[error("OCR repair of scanned PDF failed: {0}")]
    OcrRepair(#[source] PdfError),
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Pull an unlabeled transaction table out of a PDF or a photo.
pub async fn extract_statement_to_df(
    path: &Path,
    config: &OcrConfig,
    backend: &dyn OcrBackend,
) -> Result<RawTable, PipelineError> {
    let kind = DocumentKind::from_path(path).ok_or_else(|| PipelineError::UnsupportedFileType {
        path: path.display().to_string(),
    })?;

    let table = match kind {
        DocumentKind::Pdf => pdf_to_table(path, config).await?,
        DocumentKind::Image | DocumentKind::HeifImage => image_to_table(path, backend)?,
    };
    info!(path = %path.display(), ?kind, rows = table.len(), columns = table.width(), "Extracted statement table");
    Ok(table)
}

async fn pdf_to_table(path: &Path, config: &OcrConfig) -> Result<RawTable, PipelineError> {
    let repaired;
    let source = if pdf::has_text_layer(path)? {
        path
    } else {
        repaired = pdf::ocr_repair(path, config).await.map_err(PipelineError::OcrRepair)?;
        repaired.path()
    };
    let text = pdf::render_layout(source, config).await?;
    Ok(pdf::tables_to_raw(pdf::detect_tables(&text)))
}

fn image_to_table(path: &Path, backend: &dyn OcrBackend) -> Result<RawTable, PipelineError> {
    let png = preprocess::prepare_for_ocr(path).map_err(|e| match e {
        PreprocessError::Unsupported(detail) => PipelineError::MissingCodec {
            path: path.display().to_string(),
            detail,
        },
        other => PipelineError::Preprocess(other),
    })?;
    let text = backend.recognize(&png)?;
    Ok(lines_to_table(&text))
}

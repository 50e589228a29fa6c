use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUBPROCESS_TIMEOUT_SECS: u64 = 300;

/// External tools and limits used by the OCR pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    /// Program that adds a text layer to scanned PDFs.
    pub ocrmypdf: String,
    /// Program that renders PDF text with the page layout preserved.
    pub pdftotext: String,
    pub timeout_secs: u64,
    pub tesseract_lang: String,
    pub tessdata: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            ocrmypdf: "ocrmypdf".into(),
            pdftotext: "pdftotext".into(),
            timeout_secs: DEFAULT_SUBPROCESS_TIMEOUT_SECS,
            tesseract_lang: "eng".into(),
            tessdata: None,
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    /// HEIC/HEIF photos, which need codec support in the image decoder.
    HeifImage,
}

impl DocumentKind {
    /// Classify by extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "jpg" | "jpeg" | "png" => Some(DocumentKind::Image),
            "heic" | "heif" => Some(DocumentKind::HeifImage),
            _ => None,
        }
    }
}

pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["pdf", "jpg", "jpeg", "png", "heic", "heif"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_matching_ignores_case() {
        assert_eq!(DocumentKind::from_path(Path::new("a/stmt.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("r.JpEg")), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_path(Path::new("r.heic")), Some(DocumentKind::HeifImage));
        assert_eq!(DocumentKind::from_path(Path::new("data.csv")), None);
        assert_eq!(DocumentKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn config_defaults_fill_missing_keys() {
        let cfg: OcrConfig = toml::from_str("timeout_secs = 10").unwrap();
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.ocrmypdf, "ocrmypdf");
        assert_eq!(OcrConfig::default().timeout_secs, 300);
    }
}

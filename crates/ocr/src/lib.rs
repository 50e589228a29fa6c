pub mod lines;
pub mod pdf;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod staging;
pub mod types;

pub use lines::lines_to_table;
pub use pdf::PdfError;
pub use pipeline::{extract_statement_to_df, PipelineError};
pub use preprocess::{prepare_for_ocr, PreprocessError};
pub use recognizer::{default_backend, MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use staging::StagedUpload;
pub use types::{DocumentKind, OcrConfig, SUPPORTED_EXTENSIONS};

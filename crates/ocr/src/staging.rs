use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// An uploaded document written to a temporary file. The file keeps the
/// upload's extension so dispatch still works, and is removed on drop.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    pub fn from_bytes(name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let suffix = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("sift-upload-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

use std::fmt;

use async_trait::async_trait;
use sift_core::{CanonicalRow, UserId};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error("Storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Where canonical rows end up. Implemented by the storage crate.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Store one row for `user`, returning the new record id.
    async fn create_transaction(&self, user: UserId, row: &CanonicalRow) -> Result<i64, PersistError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub succeeded: usize,
    pub failed: usize,
    /// `"row N: <reason>"`, 0-based.
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed)
    }
}

/// Persist every row, continuing past individual failures.
pub async fn import_from_dataframe(
    rows: &[CanonicalRow],
    user: UserId,
    repo: &dyn TransactionRepository,
) -> ImportReport {
    let mut report = ImportReport::default();
    for (index, row) in rows.iter().enumerate() {
        match repo.create_transaction(user, row).await {
            Ok(_) => report.succeeded += 1,
            Err(e) => {
                warn!(row = index, %user, error = %e, "Failed to store transaction");
                report.failed += 1;
                report.errors.push(format!("row {index}: {e}"));
            }
        }
    }
    info!(%user, %report, "Import finished");
    report
}

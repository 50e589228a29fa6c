use std::collections::HashMap;
use std::path::Path;

use sift_core::UserId;
use thiserror::Error;
use tracing::info;

use crate::banks::spec_for;
use crate::canonical::{canonicalize, BankId, BankSpec, CanonicalStatement, CanonicalizeError};
use crate::categorize::Categorizer;

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Unknown bank '{requested}'. Available banks: {}", .available.join(", "))]
    UnknownBank {
        requested: String,
        available: Vec<String>,
    },
    #[error(transparent)]
    Canonicalize(#[from] CanonicalizeError),
}

/// Bank id → canonicalizer. Built once at startup and passed to callers.
#[derive(Debug, Clone, Default)]
pub struct CanonicalizerRegistry {
    specs: HashMap<String, BankSpec>,
}

impl CanonicalizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_banks() -> Self {
        let mut registry = Self::new();
        for bank in BankId::ALL {
            registry.register(bank.as_str(), spec_for(bank));
        }
        registry
    }

    /// Ids are case-insensitive. Registering an existing id replaces it.
    pub fn register(&mut self, bank_id: &str, spec: BankSpec) {
        self.specs.insert(bank_id.trim().to_lowercase(), spec);
    }

    pub fn get(&self, bank_id: &str) -> Result<&BankSpec, FactoryError> {
        self.specs
            .get(&bank_id.trim().to_lowercase())
            .ok_or_else(|| FactoryError::UnknownBank {
                requested: bank_id.to_string(),
                available: self.available(),
            })
    }

    pub fn available(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.specs.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Read `path` with the named bank's reader and run the full pipeline.
    pub async fn create_from_file(
        &self,
        user: UserId,
        bank_id: &str,
        card_label: &str,
        path: &Path,
        categorizer: &Categorizer,
    ) -> Result<CanonicalStatement, FactoryError> {
        let spec = self.get(bank_id)?;
        info!(bank = %spec.bank, path = %path.display(), "Reading bank statement");
        let raw = spec.read_file(path).map_err(CanonicalizeError::from)?;
        Ok(canonicalize(user, card_label, &raw, spec, categorizer).await?)
    }
}

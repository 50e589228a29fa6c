use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::category::UNKNOWN_CATEGORY;
use super::money::Money;

/// Column order of the canonical schema. Downstream consumers rely on it.
pub const CANONICAL_COLUMNS: [&str; 5] = ["Card", "Date", "Description", "Amount", "Category"];

/// One normalized statement transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub card: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    /// `None` until the categorizer has run.
    pub category: Option<String>,
}

impl CanonicalRow {
    pub fn new(card: &str, date: NaiveDate, description: &str, amount: Money) -> Self {
        CanonicalRow {
            card: card.to_string(),
            date,
            description: description.to_string(),
            amount,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// The resolved category, or "Unknown" when unresolved or blank.
    pub fn category_or_unknown(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => UNKNOWN_CATEGORY,
        }
    }
}

/// Flat, string-typed view of a row in canonical column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "Card")]
    pub card: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Category")]
    pub category: String,
}

impl From<&CanonicalRow> for CanonicalRecord {
    fn from(row: &CanonicalRow) -> Self {
        CanonicalRecord {
            card: row.card.clone(),
            date: row.date.format("%Y-%m-%d").to_string(),
            description: row.description.clone(),
            amount: row.amount.to_plain_string(),
            category: row.category_or_unknown().to_string(),
        }
    }
}

/// Stable sort by date ascending; rows sharing a date keep document order.
pub fn sort_by_date(rows: &mut [CanonicalRow]) {
    rows.sort_by_key(|r| r.date);
}

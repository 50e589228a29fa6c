//! The shared pipeline every bank canonicalizer runs through.
//!
//! A bank is described by a [`BankSpec`]: its exact header, how many banner
//! lines precede it, and a row mapper. [`canonicalize`] does the rest eagerly
//! and hands back an immutable [`CanonicalStatement`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use sift_core::{sort_by_date, CanonicalRow, Money, RawTable, UserId};
use thiserror::Error;
use tracing::{debug, info};

use crate::categorize::Categorizer;
use crate::csv::{read_statement_file, CsvError};
use crate::parse::parse_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BankId {
    AmericanExpress,
    BankOfAmerica,
    Citibank,
    Chase,
}

impl BankId {
    pub const ALL: [BankId; 4] = [
        BankId::AmericanExpress,
        BankId::BankOfAmerica,
        BankId::Citibank,
        BankId::Chase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BankId::AmericanExpress => "american_express",
            BankId::BankOfAmerica => "bank_of_america",
            BankId::Citibank => "citibank",
            BankId::Chase => "chase",
        }
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BankId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        BankId::ALL
            .into_iter()
            .find(|b| b.as_str() == wanted)
            .ok_or_else(|| format!("unknown bank id: {s}"))
    }
}

/// Named access to one row of a header-keyed table.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a RawTable,
    row: usize,
}

impl<'a> RowView<'a> {
    pub fn new(table: &'a RawTable, row: usize) -> Self {
        Self { table, row }
    }

    /// Cell under `column`, `None` when missing or blank.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let col = self.table.column_index(column)?;
        self.table.get(self.row, col)
    }

    pub fn text(&self, column: &str) -> String {
        self.get(column).unwrap_or_default().to_string()
    }
}

/// What a bank's row mapper extracts before the shared normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRow {
    pub date: Option<String>,
    pub description: String,
    /// `None` when the source amount did not parse; the row is then dropped.
    pub amount: Option<Decimal>,
    pub category_hint: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct BankSpec {
    pub bank: BankId,
    pub input_columns: &'static [&'static str],
    pub skip_rows: usize,
    pub map_row: fn(&RowView<'_>) -> MappedRow,
}

impl BankSpec {
    /// Read the bank's export, skipping its leading banner rows.
    pub fn read_file(&self, path: &Path) -> Result<RawTable, CsvError> {
        read_statement_file(path, self.skip_rows)
    }

    pub fn validate_columns(&self, raw: &RawTable) -> Result<(), CanonicalizeError> {
        if raw.columns().iter().map(String::as_str).eq(self.input_columns.iter().copied()) {
            Ok(())
        } else {
            Err(CanonicalizeError::ColumnMismatch {
                bank: self.bank,
                expected: self.input_columns.iter().map(|c| c.to_string()).collect(),
                found: raw.columns().to_vec(),
            })
        }
    }
}

#[derive(Error, Debug)]
pub enum CanonicalizeError {
    #[error("{bank} statement columns do not match: expected {expected:?}, found {found:?}")]
    ColumnMismatch {
        bank: BankId,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Failed to read statement: {0}")]
    Read(#[from] CsvError),
}

/// A fully processed statement for one user and one card.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalStatement {
    pub user: UserId,
    pub bank: BankId,
    pub card: String,
    /// Sorted by date ascending.
    pub rows: Vec<CanonicalRow>,
    /// Source rows whose date or amount did not parse.
    pub dropped_rows: usize,
}

impl CanonicalStatement {
    pub fn into_rows(self) -> Vec<CanonicalRow> {
        self.rows
    }
}

pub async fn canonicalize(
    user: UserId,
    card: &str,
    raw: &RawTable,
    spec: &BankSpec,
    categorizer: &Categorizer,
) -> Result<CanonicalStatement, CanonicalizeError> {
    spec.validate_columns(raw)?;

    let mut rows = Vec::with_capacity(raw.len());
    let mut dropped_rows = 0;

    for index in 0..raw.len() {
        let mapped = (spec.map_row)(&RowView::new(raw, index));
        let date = mapped.date.as_deref().and_then(parse_date);
        let (Some(date), Some(amount)) = (date, mapped.amount) else {
            debug!(bank = %spec.bank, row = index, "Dropping row with unparseable date or amount");
            dropped_rows += 1;
            continue;
        };

        let category = match mapped.category_hint.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(hint) => categorizer.resolve(hint, &mapped.description).await,
            None => categorizer.categorize(&mapped.description).await,
        };

        rows.push(
            CanonicalRow::new(card, date, &mapped.description, Money::from_decimal(amount))
                .with_category(category),
        );
    }

    sort_by_date(&mut rows);
    info!(
        bank = %spec.bank,
        %user,
        card,
        rows = rows.len(),
        dropped = dropped_rows,
        "Canonicalized statement"
    );

    Ok(CanonicalStatement { user, bank: spec.bank, card: card.to_string(), rows, dropped_rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_tolerant_amount;
    use sift_core::{cell, default_categories};

    fn simple_map(row: &RowView<'_>) -> MappedRow {
        MappedRow {
            date: row.get("Date").map(str::to_string),
            description: row.text("Description"),
            amount: row.get("Amount").and_then(parse_tolerant_amount),
            category_hint: None,
        }
    }

    const SIMPLE: BankSpec = BankSpec {
        bank: BankId::AmericanExpress,
        input_columns: &["Date", "Description", "Amount"],
        skip_rows: 0,
        map_row: simple_map,
    };

    fn table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut t = RawTable::new(columns.iter().map(|c| c.to_string()).collect());
        for r in rows {
            t.push_row(r.iter().map(|v| cell(v)).collect());
        }
        t
    }

    #[test]
    fn bank_ids_parse_case_insensitively() {
        assert_eq!("CHASE".parse::<BankId>(), Ok(BankId::Chase));
        assert_eq!(" Bank_Of_America ".parse::<BankId>(), Ok(BankId::BankOfAmerica));
        assert!("wells_fargo".parse::<BankId>().is_err());
        assert_eq!(BankId::Citibank.to_string(), "citibank");
    }

    #[test]
    fn column_mismatch_names_both_headers() {
        let t = table(&["Date", "Amount"], &[]);
        let err = SIMPLE.validate_columns(&t).unwrap_err();
        match &err {
            CanonicalizeError::ColumnMismatch { bank, expected, found } => {
                assert_eq!(*bank, BankId::AmericanExpress);
                assert_eq!(expected.len(), 3);
                assert_eq!(found, &vec!["Date".to_string(), "Amount".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("american_express"));
    }

    #[test]
    fn column_order_matters() {
        let t = table(&["Description", "Date", "Amount"], &[]);
        assert!(SIMPLE.validate_columns(&t).is_err());
    }

    #[tokio::test]
    async fn rows_are_sorted_and_bad_rows_counted() {
        let t = table(
            &["Date", "Description", "Amount"],
            &[
                &["03/01/2024", "SHELL OIL 123", "40.00"],
                &["garbage", "BROKEN", "1.00"],
                &["01/15/2024", "WHOLE FOODS", "80.25"],
                &["02/10/2024", "NOTHING MATCHES", "abc"],
                &["01/15/2024", "CORNER SHOP", "5.00"],
            ],
        );
        let categorizer = Categorizer::new(&default_categories());
        let statement = canonicalize(UserId(7), "Amex Gold", &t, &SIMPLE, &categorizer)
            .await
            .unwrap();

        assert_eq!(statement.dropped_rows, 2);
        assert_eq!(statement.user, UserId(7));
        let order: Vec<_> = statement.rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(order, vec!["WHOLE FOODS", "CORNER SHOP", "SHELL OIL 123"]);
        assert_eq!(statement.rows[2].category.as_deref(), Some("Car"));
        assert_eq!(statement.rows[1].category.as_deref(), Some("Unknown"));
        assert!(statement.rows.iter().all(|r| r.card == "Amex Gold"));
    }

    #[tokio::test]
    async fn mismatch_stops_before_any_row_work() {
        let t = table(&["When", "What", "HowMuch"], &[&["01/01/2024", "X", "1.00"]]);
        let categorizer = Categorizer::new(&default_categories());
        let result = canonicalize(UserId(1), "Card", &t, &SIMPLE, &categorizer).await;
        assert!(matches!(result, Err(CanonicalizeError::ColumnMismatch { .. })));
    }
}

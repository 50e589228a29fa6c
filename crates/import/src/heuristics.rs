//! Column inference for tables with no known schema (OCR and PDF output).
//!
//! Each column is scored by how many of its cells look like a date or an
//! amount; the best-scoring columns become Date and Amount and the remaining
//! column with the longest average text becomes Description.
//!
//! Statement PDFs often print posting dates without a year; those are placed
//! in a caller-supplied statement year, or the current year by default.

use chrono::{Datelike, Local};
use rust_decimal::Decimal;
use sift_core::{CanonicalRow, Money, RawTable, UNKNOWN_CATEGORY};
use tracing::debug;

use crate::parse::{parse_date_in_year, parse_tolerant_amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnChoice {
    pub date: usize,
    pub amount: usize,
    /// `None` when no third column is left over.
    pub description: Option<usize>,
}

pub fn date_column_scores(raw: &RawTable, year: i32) -> Vec<usize> {
    score_columns(raw, |v| parse_date_in_year(v, year).is_some())
}

pub fn amount_column_scores(raw: &RawTable) -> Vec<usize> {
    score_columns(raw, |v| parse_tolerant_amount(v).is_some())
}

fn score_columns(raw: &RawTable, hit: impl Fn(&str) -> bool) -> Vec<usize> {
    (0..raw.width())
        .map(|col| raw.column(col).flatten().filter(|v| hit(v)).count())
        .collect()
}

/// Index of the first column holding the maximum score. All-zero scores still
/// pick column 0; only a table with no columns yields `None`.
pub fn pick_best(scores: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (col, &score) in scores.iter().enumerate() {
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((col, score));
        }
    }
    best.map(|(col, _)| col)
}

/// Among columns not in `exclude`, the one whose present values are longest
/// on average. Ties go to the leftmost column.
pub fn pick_description(raw: &RawTable, exclude: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for col in (0..raw.width()).filter(|c| !exclude.contains(c)) {
        let (total, count) = raw
            .column(col)
            .flatten()
            .fold((0usize, 0usize), |(t, n), v| (t + v.chars().count(), n + 1));
        let average = if count == 0 { 0.0 } else { total as f64 / count as f64 };
        if best.map_or(true, |(_, a)| average > a) {
            best = Some((col, average));
        }
    }
    best.map(|(col, _)| col)
}

pub fn infer_columns(raw: &RawTable, year: i32) -> Option<ColumnChoice> {
    let date = pick_best(&date_column_scores(raw, year))?;
    let amount = pick_best(&amount_column_scores(raw))?;
    let description = pick_description(raw, &[date, amount]);
    Some(ColumnChoice { date, amount, description })
}

/// Map an unlabeled table onto canonical rows for `card_label`.
///
/// Category is the Unknown placeholder; categorization happens later. Rows
/// without a parseable date and amount are dropped. Year-less dates land in
/// the current year.
pub fn map_raw_table_to_standard(raw: &RawTable, card_label: &str) -> Vec<CanonicalRow> {
    map_raw_table_to_standard_in_year(raw, card_label, Local::now().year())
}

/// [`map_raw_table_to_standard`] with an explicit year for dates like `01/15`.
pub fn map_raw_table_to_standard_in_year(
    raw: &RawTable,
    card_label: &str,
    year: i32,
) -> Vec<CanonicalRow> {
    let Some(choice) = infer_columns(raw, year) else {
        return Vec::new();
    };
    debug!(?choice, rows = raw.len(), "Inferred statement columns");

    let mut rows = Vec::with_capacity(raw.len());
    for row in 0..raw.len() {
        let date = raw.get(row, choice.date).and_then(|v| parse_date_in_year(v, year));
        let amount: Option<Decimal> = raw.get(row, choice.amount).and_then(parse_tolerant_amount);
        let (Some(date), Some(amount)) = (date, amount) else {
            debug!(row, "Dropping row without parseable date and amount");
            continue;
        };
        let description = choice
            .description
            .and_then(|col| raw.get(row, col))
            .unwrap_or_default();
        rows.push(
            CanonicalRow::new(card_label, date, description, Money::from_decimal(amount))
                .with_category(UNKNOWN_CATEGORY),
        );
    }
    rows
}

//! Turn a recognized page transcript into date / line / amount rows.

use std::sync::OnceLock;

use regex::Regex;
use sift_core::{Cell, RawTable};

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_plain_amount, r"^\d+(?:\.\d+)?$");
re!(re_paren_amount, r"^\(\d+(?:\.\d+)?\)$");

/// First token, reading left to right, that looks like a date.
pub fn date_token<'a>(tokens: &[&'a str]) -> Option<&'a str> {
    tokens
        .iter()
        .copied()
        .find(|t| t.contains(['/', '-', '.']))
}

/// First token, reading right to left, that looks like an amount.
pub fn amount_token<'a>(tokens: &[&'a str]) -> Option<&'a str> {
    tokens.iter().rev().copied().find(|t| is_amount_token(t))
}

fn is_amount_token(token: &str) -> bool {
    let stripped = token.replace(['$', ','], "");
    let stripped = stripped.strip_suffix('-').unwrap_or(&stripped);
    re_plain_amount().is_match(stripped) || re_paren_amount().is_match(stripped)
}

/// One row per line holding both a date token and an amount token:
/// `[date, full line, amount]`.
pub fn lines_to_table(text: &str) -> RawTable {
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if let (Some(date), Some(amount)) = (date_token(&tokens), amount_token(&tokens)) {
            rows.push(vec![
                Some(date.to_string()),
                Some(line.to_string()),
                Some(amount.to_string()),
            ]);
        }
    }
    let mut table = RawTable::positional(rows);
    if table.width() == 0 {
        table = RawTable::new(vec!["col_0".into(), "col_1".into(), "col_2".into()]);
    }
    table
}

//! Row mappers and header layouts for the supported bank exports.

use rust_decimal::Decimal;

use crate::canonical::{BankId, BankSpec, MappedRow, RowView};
use crate::parse::parse_tolerant_amount;

pub const AMERICAN_EXPRESS: BankSpec = BankSpec {
    bank: BankId::AmericanExpress,
    input_columns: &["Date", "Description", "Card Member", "Account #", "Amount"],
    skip_rows: 0,
    map_row: map_american_express,
};

pub const BANK_OF_AMERICA: BankSpec = BankSpec {
    bank: BankId::BankOfAmerica,
    input_columns: &["Posted Date", "Reference Number", "Payee", "Address", "Amount"],
    skip_rows: 0,
    map_row: map_bank_of_america,
};

// Citi prefixes the header with an account line and a blank line.
pub const CITIBANK: BankSpec = BankSpec {
    bank: BankId::Citibank,
    input_columns: &["Status", "Date", "Description", "Debit", "Credit"],
    skip_rows: 2,
    map_row: map_citibank,
};

// Chase prefixes three lines of account summary.
pub const CHASE: BankSpec = BankSpec {
    bank: BankId::Chase,
    input_columns: &[
        "Transaction Date",
        "Post Date",
        "Description",
        "Category",
        "Type",
        "Amount",
        "Memo",
    ],
    skip_rows: 3,
    map_row: map_chase,
};

pub fn spec_for(bank: BankId) -> BankSpec {
    match bank {
        BankId::AmericanExpress => AMERICAN_EXPRESS,
        BankId::BankOfAmerica => BANK_OF_AMERICA,
        BankId::Citibank => CITIBANK,
        BankId::Chase => CHASE,
    }
}

fn plain_amount(value: Option<&str>) -> Option<Decimal> {
    value?.trim().parse::<Decimal>().ok()
}

fn map_american_express(row: &RowView<'_>) -> MappedRow {
    MappedRow {
        date: row.get("Date").map(str::to_string),
        description: row.text("Description"),
        amount: plain_amount(row.get("Amount")),
        category_hint: None,
    }
}

/// Bank of America exports charges as negatives; canonical charges are positive.
fn map_bank_of_america(row: &RowView<'_>) -> MappedRow {
    MappedRow {
        date: row.get("Posted Date").map(str::to_string),
        description: row.text("Payee"),
        amount: plain_amount(row.get("Amount")).map(|a| -a),
        category_hint: None,
    }
}

/// Debit and Credit are separate columns; a blank side counts as zero.
fn map_citibank(row: &RowView<'_>) -> MappedRow {
    let side = |column: &str| match row.get(column) {
        None => Some(Decimal::ZERO),
        Some(v) => parse_tolerant_amount(v),
    };
    let amount = match (side("Debit"), side("Credit")) {
        (Some(debit), Some(credit)) => Some(debit + credit),
        _ => None,
    };
    MappedRow {
        date: row.get("Date").map(str::to_string),
        description: row.text("Description"),
        amount,
        category_hint: None,
    }
}

fn map_chase(row: &RowView<'_>) -> MappedRow {
    let amount = row
        .get("Amount")
        .map(|v| v.replace(['$', ','], ""))
        .and_then(|v| plain_amount(Some(&v)));
    MappedRow {
        date: row.get("Transaction Date").map(str::to_string),
        description: row.text("Description"),
        amount,
        category_hint: row.get("Category").map(str::to_string),
    }
}

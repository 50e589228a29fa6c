use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Formats tried, in order, by [`parse_date`]. Two-digit-year variants come
/// before their four-digit twins so "1/5/24" is not read as year 24.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Posting-date layouts printed without a year, resolved by
/// [`parse_date_in_year`].
const YEARLESS_FORMATS: &[&str] = &["%m/%d", "%m-%d", "%b %d", "%B %d", "%d %b", "%d %B"];

/// Permissive calendar-date parsing for statement cells.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = trim_date(s)?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Like [`parse_date`], but also accepts `01/15` or `Jan 15` and places them
/// in `year`. A full date keeps its own year.
pub fn parse_date_in_year(s: &str, year: i32) -> Option<NaiveDate> {
    if let Some(date) = parse_date(s) {
        return Some(date);
    }
    let s = format!("{} {year}", trim_date(s)?);
    YEARLESS_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&s, &format!("{fmt} %Y")).ok())
}

fn trim_date(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // Exports sometimes carry a midnight timestamp.
    Some(match (s.get(..10), s.get(10..11)) {
        (Some(day), Some("T")) => day,
        _ => s.strip_suffix(" 00:00:00").unwrap_or(s),
    })
}

/// Tolerant money parsing: `$` and thousands commas are ignored, `(12.34)` and
/// `12.34-` are negative. Blank or non-numeric input is "no value", never zero.
pub fn parse_tolerant_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let (negative, body) = if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else if let Some(stripped) = s.strip_suffix('-') {
        (true, stripped)
    } else {
        (false, s)
    };

    let cleaned = body.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let value = Decimal::from_str(cleaned).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── parse_date ────────────────────────────────────────────────────────────

    #[test]
    fn parse_date_common_layouts() {
        assert_eq!(parse_date("2024-01-15"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("01/15/2024"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("1/5/24"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("01-15-2024"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("15.01.2024"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("Jan 15, 2024"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("January 15, 2024"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("15 Jan 2024"), Some(d(2024, 1, 15)));
    }

    #[test]
    fn parse_date_strips_midnight_timestamp() {
        assert_eq!(parse_date("2024-03-01T00:00:00"), Some(d(2024, 3, 1)));
        assert_eq!(parse_date("2024-03-01 00:00:00"), Some(d(2024, 3, 1)));
    }

    #[test]
    fn parse_date_upper_case_month() {
        assert_eq!(parse_date("OCT 05, 2024"), Some(d(2024, 10, 5)));
    }

    #[test]
    fn parse_date_rejects_text_and_amounts() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("SHELL OIL"), None);
        assert_eq!(parse_date("12.34"), None);
        assert_eq!(parse_date("13/45/2024"), None);
    }

    #[test]
    fn year_less_dates_take_the_given_year() {
        assert_eq!(parse_date("01/15"), None);
        assert_eq!(parse_date_in_year("01/15", 2023), Some(d(2023, 1, 15)));
        assert_eq!(parse_date_in_year("1-16", 2023), Some(d(2023, 1, 16)));
        assert_eq!(parse_date_in_year("Jan 17", 2023), Some(d(2023, 1, 17)));
        assert_eq!(parse_date_in_year("DEC 31", 2023), Some(d(2023, 12, 31)));
        assert_eq!(parse_date_in_year("05 Feb", 2023), Some(d(2023, 2, 5)));
    }

    #[test]
    fn year_less_parsing_keeps_explicit_years_and_rejects_noise() {
        assert_eq!(parse_date_in_year("01/15/2021", 2023), Some(d(2021, 1, 15)));
        assert_eq!(parse_date_in_year("02/29", 2023), None);
        assert_eq!(parse_date_in_year("02/29", 2024), Some(d(2024, 2, 29)));
        assert_eq!(parse_date_in_year("50.00", 2023), None);
        assert_eq!(parse_date_in_year("SHELL OIL", 2023), None);
        assert_eq!(parse_date_in_year("", 2023), None);
    }

    // ── parse_tolerant_amount ─────────────────────────────────────────────────

    #[test]
    fn amount_plain_and_signed() {
        assert_eq!(parse_tolerant_amount("123.45"), Some(dec("123.45")));
        assert_eq!(parse_tolerant_amount("-50.00"), Some(dec("-50.00")));
        assert_eq!(parse_tolerant_amount("100"), Some(dec("100")));
    }

    #[test]
    fn amount_strips_currency_and_commas() {
        assert_eq!(parse_tolerant_amount(" $1,234.56 "), Some(dec("1234.56")));
        assert_eq!(parse_tolerant_amount("-$5.00"), Some(dec("-5.00")));
    }

    #[test]
    fn amount_parentheses_are_negative() {
        assert_eq!(parse_tolerant_amount("(12.34)"), Some(dec("-12.34")));
        assert_eq!(parse_tolerant_amount("($1,000.00)"), Some(dec("-1000.00")));
    }

    #[test]
    fn amount_trailing_minus_is_negative() {
        assert_eq!(parse_tolerant_amount("12.34-"), Some(dec("-12.34")));
    }

    #[test]
    fn amount_blank_is_no_value_not_zero() {
        assert_eq!(parse_tolerant_amount(""), None);
        assert_eq!(parse_tolerant_amount("   "), None);
        assert_eq!(parse_tolerant_amount("$"), None);
        assert_eq!(parse_tolerant_amount("()"), None);
    }

    #[test]
    fn amount_garbage_is_no_value() {
        assert_eq!(parse_tolerant_amount("SHELL OIL"), None);
        assert_eq!(parse_tolerant_amount("01/15/2024"), None);
        assert_eq!(parse_tolerant_amount("1.2.3"), None);
    }
}

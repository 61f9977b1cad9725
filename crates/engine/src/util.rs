//! Internal helpers for input validation and cell conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and parsing so the engine enforces consistent invariants.

use chrono::{Local, NaiveDate};

use crate::{EngineError, ResultEngine};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current local calendar date.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Trim a user supplied name and reject empty values.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Parse an ISO date cell. A trailing time part (`2025-01-31 00:00:00` or
/// `2025-01-31T00:00:00`) is ignored.
pub(crate) fn parse_date_cell(value: &str) -> Result<Option<NaiveDate>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let date_part = trimmed
        .split(['T', ' '])
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map(Some)
        .map_err(|_| format!("invalid date '{trimmed}'"))
}

pub(crate) fn format_date_cell(value: Option<NaiveDate>) -> String {
    value
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

pub(crate) fn parse_bool_cell(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "0" | "n" => Ok(false),
        "true" | "yes" | "1" | "y" => Ok(true),
        other => Err(format!("invalid boolean '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_cells_accept_time_suffix() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 31);
        assert_eq!(parse_date_cell("2025-01-31").unwrap(), expected);
        assert_eq!(parse_date_cell("2025-01-31 00:00:00").unwrap(), expected);
        assert_eq!(parse_date_cell("2025-01-31T00:00:00").unwrap(), expected);
        assert_eq!(parse_date_cell("  ").unwrap(), None);
        assert!(parse_date_cell("31/01/2025").is_err());
    }

    #[test]
    fn bool_cells() {
        assert!(parse_bool_cell("TRUE").unwrap());
        assert!(parse_bool_cell("yes").unwrap());
        assert!(!parse_bool_cell("").unwrap());
        assert!(!parse_bool_cell("False").unwrap());
        assert!(parse_bool_cell("maybe").is_err());
    }

    #[test]
    fn names_are_trimmed() {
        assert_eq!(normalize_required_name("  Food ", "category").unwrap(), "Food");
        assert!(normalize_required_name("   ", "category").is_err());
    }
}

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the engine (incomes,
/// expected/actual amounts, derived totals) to avoid floating-point drift.
///
/// The value is signed so derived figures (variance, remaining money) can go
/// below zero. Record fields only ever hold non-negative amounts, see
/// [`Amount::parse_non_negative`].
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let amount = Amount::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "$12.34");
/// assert_eq!(amount.to_decimal_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Amount;
///
/// assert_eq!("10".parse::<Amount>().unwrap().cents(), 1000);
/// assert_eq!("10,5".parse::<Amount>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<Amount>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
#[repr(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Largest magnitude a record may hold: ten billion.
    ///
    /// Millions of such amounts still sum inside `i64`, so totals over a
    /// loaded sheet cannot overflow.
    pub const MAX: Amount = Amount(1_000_000_000_000);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Parses a decimal string and rejects negative values.
    pub fn parse_non_negative(s: &str) -> Result<Self, EngineError> {
        let amount: Amount = s.parse()?;
        amount.ensure_non_negative()
    }

    /// Parses a cell of the backing file: extra decimals (float noise such
    /// as `95.19999999999999`) are rounded to cents. Negative values are
    /// rejected.
    pub(crate) fn parse_cell(s: &str) -> Result<Self, EngineError> {
        parse(s, Fraction::Round)?.ensure_non_negative()
    }

    /// Returns the amount unchanged when it is in `0..=MAX`.
    pub fn ensure_non_negative(self) -> Result<Self, EngineError> {
        if self.is_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "{} must not be negative",
                self.to_decimal_string()
            )));
        }
        if self > Self::MAX {
            return Err(too_large());
        }
        Ok(self)
    }

    /// Plain decimal rendering without currency symbol, e.g. `-12.30`.
    ///
    /// This is the form written to the backing file.
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    /// Ratio `self / other` as a percentage, `None` when `other` is zero.
    pub fn percent_of(self, other: Amount) -> Option<f64> {
        if other.is_zero() {
            return None;
        }
        Some(self.0 as f64 / other.0 as f64 * 100.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}${units}.{cents:02}")
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.to_decimal_string()
    }
}

impl TryFrom<String> for Amount {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        self.0 -= rhs.0;
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator, an optional leading `+`/`-`
    /// and an optional leading `$`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - magnitude up to [`Amount::MAX`]
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s, Fraction::Strict)
    }
}

/// What to do with fractional digits beyond cents.
#[derive(Clone, Copy)]
enum Fraction {
    Strict,
    /// Round half away from zero.
    Round,
}

fn parse(s: &str, fraction: Fraction) -> Result<Amount, EngineError> {
    let empty = || EngineError::InvalidAmount("empty amount".to_string());
    let invalid = || EngineError::InvalidAmount(format!("invalid amount '{}'", s.trim()));

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, trimmed)
    };

    let rest = rest.trim();
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let units_str = parts.next().ok_or_else(invalid)?;
    let frac = parts.next().unwrap_or("");

    if parts.next().is_some() {
        return Err(invalid());
    }
    if units_str.is_empty()
        || !units_str.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    if frac.len() > 2 && matches!(fraction, Fraction::Strict) {
        return Err(EngineError::InvalidAmount("too many decimals".to_string()));
    }

    let digit = |index: usize| {
        frac.as_bytes()
            .get(index)
            .map_or(0, |byte| i64::from(byte - b'0'))
    };
    let mut cents = digit(0) * 10 + digit(1);
    if digit(2) >= 5 {
        cents += 1;
    }

    let units: i64 = units_str.parse().map_err(|_| too_large())?;
    let total = units
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .filter(|total| *total <= Amount::MAX.0)
        .ok_or_else(too_large)?;

    Ok(Amount(if negative { -total } else { total }))
}

fn too_large() -> EngineError {
    EngineError::InvalidAmount(format!("amount larger than {}", Amount::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_dollars() {
        assert_eq!(Amount::new(0).to_string(), "$0.00");
        assert_eq!(Amount::new(1).to_string(), "$0.01");
        assert_eq!(Amount::new(10).to_string(), "$0.10");
        assert_eq!(Amount::new(1050).to_string(), "$10.50");
        assert_eq!(Amount::new(-1050).to_string(), "-$10.50");
        assert_eq!(Amount::new(-5).to_decimal_string(), "-0.05");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Amount>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<Amount>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<Amount>().unwrap().cents(), 1050);
        assert_eq!("-0.01".parse::<Amount>().unwrap().cents(), -1);
        assert_eq!("+1.00".parse::<Amount>().unwrap().cents(), 100);
        assert_eq!("  2.30 ".parse::<Amount>().unwrap().cents(), 230);
        assert_eq!("$4.00".parse::<Amount>().unwrap().cents(), 400);
        assert_eq!("7.".parse::<Amount>().unwrap().cents(), 700);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!("12.345".parse::<Amount>().is_err());
        assert!("0.001".parse::<Amount>().is_err());
    }

    #[test]
    fn parse_caps_the_magnitude() {
        assert_eq!("10000000000".parse::<Amount>().unwrap(), Amount::MAX);
        assert!("10000000000.01".parse::<Amount>().is_err());
        assert!("500000000000000000".parse::<Amount>().is_err());
        assert!("99999999999999999999999".parse::<Amount>().is_err());
        assert!(Amount::new(i64::MAX).ensure_non_negative().is_err());
    }

    #[test]
    fn file_cells_round_to_cents() {
        assert_eq!(Amount::parse_cell("95.19999999999999").unwrap(), Amount::new(9_520));
        assert_eq!(Amount::parse_cell("0.005").unwrap(), Amount::new(1));
        assert_eq!(Amount::parse_cell("0.004").unwrap(), Amount::ZERO);
        assert_eq!(Amount::parse_cell("99.995").unwrap(), Amount::new(10_000));
        assert_eq!(Amount::parse_cell("100.0").unwrap(), Amount::new(10_000));
        assert!(Amount::parse_cell("-1.5").is_err());
        assert!(Amount::parse_cell("1.2.3").is_err());
    }

    #[test]
    fn non_negative_guard() {
        assert!(Amount::parse_non_negative("-3").is_err());
        assert_eq!(Amount::parse_non_negative("3").unwrap(), Amount::new(300));
    }

    #[test]
    fn percent_of_zero_is_undefined() {
        assert_eq!(Amount::new(100).percent_of(Amount::ZERO), None);
        assert_eq!(Amount::new(50).percent_of(Amount::new(200)), Some(25.0));
    }
}

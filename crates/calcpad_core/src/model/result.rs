//! Calculation result value object.
//!
//! # Responsibility
//! - Define the tagged result type produced by every evaluation.
//! - Apply canonical display formatting at construction time.
//!
//! # Invariants
//! - `value()` is decimal, never binary floating point.
//! - Formatting is locale-fixed: thousands separators from 1000, two
//!   decimal places for non-integers unless overridden.
//! - A silent error carries an empty message and renders nothing.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Display symbols for known currency codes. Unknown codes fall back to
/// the code itself followed by a space.
const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("JPY", "¥"),
    ("RUB", "₽"),
    ("ILS", "₪"),
    ("INR", "₹"),
    ("KRW", "₩"),
    ("BTC", "₿"),
];

/// Day-count origin for date results.
fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch date")
}

/// Semantic tag of a [`CalcResult`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Number,
    Currency,
    Unit,
    Percentage,
    Date,
    Error,
}

/// Immutable evaluation outcome for one calculation line.
///
/// Each variant carries exactly the fields valid for its kind; the display
/// string is computed once at construction and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalcResult {
    Number {
        value: Decimal,
        formatted: String,
    },
    Currency {
        value: Decimal,
        /// ISO-like currency code, uppercase.
        code: String,
        formatted: String,
    },
    Unit {
        value: Decimal,
        /// Display unit label, already mapped through label overrides.
        unit: String,
        formatted: String,
    },
    Percentage {
        value: Decimal,
        formatted: String,
    },
    Date {
        date: NaiveDate,
        formatted: String,
    },
    Error {
        /// Empty message means "render nothing" (blank/comment lines).
        message: String,
    },
}

impl CalcResult {
    /// Plain number: 0 decimals when whole, else 2 (or the override).
    pub fn number(value: Decimal, decimal_places: Option<u32>) -> Self {
        Self::Number {
            value,
            formatted: format_decimal(value, decimal_places),
        }
    }

    /// Currency amount, always rendered at 2 decimals unless overridden.
    pub fn currency(value: Decimal, code: &str, decimal_places: Option<u32>) -> Self {
        let code = code.to_ascii_uppercase();
        let amount = format_decimal(value, Some(decimal_places.unwrap_or(2)));
        let formatted = match currency_symbol(&code) {
            Some(symbol) => format!("{symbol}{amount}"),
            None => format!("{code} {amount}"),
        };
        Self::Currency {
            value,
            code,
            formatted,
        }
    }

    /// Measured quantity with a display unit label.
    pub fn unit(value: Decimal, unit_label: &str, decimal_places: Option<u32>) -> Self {
        Self::Unit {
            value,
            unit: unit_label.to_string(),
            formatted: format!("{} {unit_label}", format_decimal(value, decimal_places)),
        }
    }

    /// Percentage value rendered with a trailing `" %"`.
    pub fn percentage(value: Decimal, decimal_places: Option<u32>) -> Self {
        Self::Percentage {
            value,
            formatted: format!("{} %", format_decimal(value, decimal_places)),
        }
    }

    /// Calendar date from a day count relative to 1970-01-01.
    ///
    /// Produces an error result when the day count leaves the supported
    /// calendar range.
    pub fn date(days_since_epoch: i64) -> Self {
        match epoch().checked_add_signed(chrono::Duration::days(days_since_epoch)) {
            Some(date) => Self::Date {
                date,
                formatted: date.format("%b %-d, %Y").to_string(),
            },
            None => Self::error(format!("date out of range: {days_since_epoch} days")),
        }
    }

    /// Visible error with a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Silent error: blank input and comment lines render nothing.
    pub fn silent() -> Self {
        Self::Error {
            message: String::new(),
        }
    }

    /// Signed infinity marker produced by division by zero.
    pub fn infinite(negative: bool) -> Self {
        if negative {
            Self::Number {
                value: Decimal::MIN,
                formatted: "-Infinity".to_string(),
            }
        } else {
            Self::Number {
                value: Decimal::MAX,
                formatted: "Infinity".to_string(),
            }
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Number { .. } => ResultKind::Number,
            Self::Currency { .. } => ResultKind::Currency,
            Self::Unit { .. } => ResultKind::Unit,
            Self::Percentage { .. } => ResultKind::Percentage,
            Self::Date { .. } => ResultKind::Date,
            Self::Error { .. } => ResultKind::Error,
        }
    }

    /// Numeric value of the result. Errors contribute zero; dates report
    /// their day count relative to the epoch.
    pub fn value(&self) -> Decimal {
        match self {
            Self::Number { value, .. }
            | Self::Currency { value, .. }
            | Self::Unit { value, .. }
            | Self::Percentage { value, .. } => *value,
            Self::Date { date, .. } => Decimal::from((*date - epoch()).num_days()),
            Self::Error { .. } => Decimal::ZERO,
        }
    }

    /// Canonical display string. Empty exactly for silent errors.
    pub fn formatted(&self) -> &str {
        match self {
            Self::Number { formatted, .. }
            | Self::Currency { formatted, .. }
            | Self::Unit { formatted, .. }
            | Self::Percentage { formatted, .. }
            | Self::Date { formatted, .. } => formatted,
            Self::Error { message } => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// True for errors that should render nothing at all.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Error { message } if message.is_empty())
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, symbol)| *symbol)
}

/// Formats a decimal with the canonical rules: whole numbers render without
/// decimals unless an explicit precision is requested; everything else gets
/// two places (or the override); magnitudes of 1000 and above are grouped
/// with thousands separators.
pub fn format_decimal(value: Decimal, decimal_places: Option<u32>) -> String {
    let places = match decimal_places {
        Some(places) => places,
        None if value.fract().is_zero() => 0,
        None => 2,
    };
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{rounded:.places$}", places = places as usize);
    if rounded.abs() >= Decimal::ONE_THOUSAND {
        group_thousands(&plain)
    } else {
        plain
    }
}

fn group_thousands(plain: &str) -> String {
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (index, ch) in int_part.chars().enumerate() {
        let remaining = int_part.len() - index;
        if index > 0 && remaining % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Best-effort `f64` view of a result value, for callers that only need an
/// approximate magnitude.
pub fn approximate_f64(result: &CalcResult) -> Option<f64> {
    if result.is_error() {
        return None;
    }
    result.value().to_f64()
}

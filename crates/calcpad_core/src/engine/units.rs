//! Unit and currency conversion tables.
//!
//! # Responsibility
//! - Resolve unit aliases to a category and a base-relative factor.
//! - Convert values within a category, and across the supported
//!   length ↔ CSS pixel chain.
//!
//! # Invariants
//! - Linear categories convert as `value * factor[source] / factor[target]`
//!   against a single base unit per category (meter, liter, kilogram,
//!   second, byte; USD for currency).
//! - Temperature composes explicit to/from-kelvin steps; CSS units depend
//!   on the evaluation context's em/ppi bases, never on a static factor.
//! - Display labels are looked up separately from conversion factors.

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Family of interconvertible units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCategory {
    Length,
    Volume,
    Weight,
    Time,
    Data,
    Temperature,
    Css,
    Currency,
}

/// Resolved unit: canonical token, category and base-relative factor.
/// The factor is meaningful for linear categories and currency; temperature
/// and CSS conversions ignore it.
#[derive(Debug, Clone, Copy)]
pub struct UnitDef {
    pub canonical: &'static str,
    pub category: UnitCategory,
    factor: Decimal,
}

struct UnitSpec {
    aliases: &'static [&'static str],
    canonical: &'static str,
    category: UnitCategory,
    factor: Decimal,
}

use UnitCategory::{Css, Currency, Data, Length, Temperature, Time, Volume, Weight};

static UNIT_SPECS: &[UnitSpec] = &[
    // Length, base meter.
    UnitSpec { aliases: &["mm", "millimeter", "millimeters"], canonical: "mm", category: Length, factor: dec!(0.001) },
    UnitSpec { aliases: &["cm", "centimeter", "centimeters"], canonical: "cm", category: Length, factor: dec!(0.01) },
    UnitSpec { aliases: &["m", "meter", "meters", "metre", "metres"], canonical: "m", category: Length, factor: dec!(1) },
    UnitSpec { aliases: &["km", "kilometer", "kilometers"], canonical: "km", category: Length, factor: dec!(1000) },
    UnitSpec { aliases: &["in", "inch", "inches"], canonical: "in", category: Length, factor: dec!(0.0254) },
    UnitSpec { aliases: &["ft", "foot", "feet"], canonical: "ft", category: Length, factor: dec!(0.3048) },
    UnitSpec { aliases: &["yd", "yard", "yards"], canonical: "yd", category: Length, factor: dec!(0.9144) },
    UnitSpec { aliases: &["mi", "mile", "miles"], canonical: "mi", category: Length, factor: dec!(1609.344) },
    // Volume, base liter.
    UnitSpec { aliases: &["ml", "milliliter", "milliliters"], canonical: "ml", category: Volume, factor: dec!(0.001) },
    UnitSpec { aliases: &["l", "liter", "liters", "litre", "litres"], canonical: "l", category: Volume, factor: dec!(1) },
    UnitSpec { aliases: &["tsp", "teaspoon", "teaspoons"], canonical: "tsp", category: Volume, factor: dec!(0.00492892159375) },
    UnitSpec { aliases: &["tbsp", "tablespoon", "tablespoons"], canonical: "tbsp", category: Volume, factor: dec!(0.01478676478125) },
    UnitSpec { aliases: &["floz"], canonical: "floz", category: Volume, factor: dec!(0.0295735295625) },
    UnitSpec { aliases: &["cup", "cups"], canonical: "cup", category: Volume, factor: dec!(0.2365882365) },
    UnitSpec { aliases: &["pint", "pints"], canonical: "pint", category: Volume, factor: dec!(0.473176473) },
    UnitSpec { aliases: &["qt", "quart", "quarts"], canonical: "qt", category: Volume, factor: dec!(0.946352946) },
    UnitSpec { aliases: &["gal", "gallon", "gallons"], canonical: "gal", category: Volume, factor: dec!(3.785411784) },
    // Weight, base kilogram.
    UnitSpec { aliases: &["mg", "milligram", "milligrams"], canonical: "mg", category: Weight, factor: dec!(0.000001) },
    UnitSpec { aliases: &["g", "gram", "grams"], canonical: "g", category: Weight, factor: dec!(0.001) },
    UnitSpec { aliases: &["kg", "kilogram", "kilograms"], canonical: "kg", category: Weight, factor: dec!(1) },
    UnitSpec { aliases: &["t", "ton", "tons", "tonne", "tonnes"], canonical: "t", category: Weight, factor: dec!(1000) },
    UnitSpec { aliases: &["oz", "ounce", "ounces"], canonical: "oz", category: Weight, factor: dec!(0.028349523125) },
    UnitSpec { aliases: &["lb", "lbs", "pound", "pounds"], canonical: "lb", category: Weight, factor: dec!(0.45359237) },
    UnitSpec { aliases: &["st", "stone", "stones"], canonical: "st", category: Weight, factor: dec!(6.35029318) },
    // Time, base second.
    UnitSpec { aliases: &["ms", "millisecond", "milliseconds"], canonical: "ms", category: Time, factor: dec!(0.001) },
    UnitSpec { aliases: &["s", "sec", "secs", "second", "seconds"], canonical: "s", category: Time, factor: dec!(1) },
    UnitSpec { aliases: &["min", "mins", "minute", "minutes"], canonical: "min", category: Time, factor: dec!(60) },
    UnitSpec { aliases: &["h", "hr", "hrs", "hour", "hours"], canonical: "h", category: Time, factor: dec!(3600) },
    UnitSpec { aliases: &["day", "days"], canonical: "day", category: Time, factor: dec!(86400) },
    UnitSpec { aliases: &["week", "weeks"], canonical: "week", category: Time, factor: dec!(604800) },
    UnitSpec { aliases: &["month", "months"], canonical: "month", category: Time, factor: dec!(2592000) },
    UnitSpec { aliases: &["year", "years", "yr", "yrs"], canonical: "year", category: Time, factor: dec!(31536000) },
    // Data, base byte, powers of 1024.
    UnitSpec { aliases: &["bit", "bits"], canonical: "bit", category: Data, factor: dec!(0.125) },
    UnitSpec { aliases: &["b", "byte", "bytes"], canonical: "b", category: Data, factor: dec!(1) },
    UnitSpec { aliases: &["kb", "kilobyte", "kilobytes"], canonical: "kb", category: Data, factor: dec!(1024) },
    UnitSpec { aliases: &["mb", "megabyte", "megabytes"], canonical: "mb", category: Data, factor: dec!(1048576) },
    UnitSpec { aliases: &["gb", "gigabyte", "gigabytes"], canonical: "gb", category: Data, factor: dec!(1073741824) },
    UnitSpec { aliases: &["tb", "terabyte", "terabytes"], canonical: "tb", category: Data, factor: dec!(1099511627776) },
    UnitSpec { aliases: &["pb", "petabyte", "petabytes"], canonical: "pb", category: Data, factor: dec!(1125899906842624) },
    // Temperature, converted through kelvin.
    UnitSpec { aliases: &["c", "celsius"], canonical: "c", category: Temperature, factor: dec!(1) },
    UnitSpec { aliases: &["f", "fahrenheit"], canonical: "f", category: Temperature, factor: dec!(1) },
    UnitSpec { aliases: &["k", "kelvin"], canonical: "k", category: Temperature, factor: dec!(1) },
    // CSS, converted through pixels with context bases.
    UnitSpec { aliases: &["px", "pixel", "pixels"], canonical: "px", category: Css, factor: dec!(1) },
    UnitSpec { aliases: &["em"], canonical: "em", category: Css, factor: dec!(1) },
    UnitSpec { aliases: &["pt", "point", "points"], canonical: "pt", category: Css, factor: dec!(1) },
    // Currency, factor is units per USD. Approximate static rates.
    UnitSpec { aliases: &["usd", "dollar", "dollars"], canonical: "usd", category: Currency, factor: dec!(1) },
    UnitSpec { aliases: &["eur", "euro", "euros"], canonical: "eur", category: Currency, factor: dec!(0.92) },
    UnitSpec { aliases: &["gbp"], canonical: "gbp", category: Currency, factor: dec!(0.79) },
    UnitSpec { aliases: &["jpy", "yen"], canonical: "jpy", category: Currency, factor: dec!(149.5) },
    UnitSpec { aliases: &["rub", "ruble", "rubles"], canonical: "rub", category: Currency, factor: dec!(92) },
    UnitSpec { aliases: &["ils", "shekel", "shekels"], canonical: "ils", category: Currency, factor: dec!(3.65) },
    UnitSpec { aliases: &["cad"], canonical: "cad", category: Currency, factor: dec!(1.36) },
    UnitSpec { aliases: &["aud"], canonical: "aud", category: Currency, factor: dec!(1.52) },
    UnitSpec { aliases: &["chf"], canonical: "chf", category: Currency, factor: dec!(0.88) },
    UnitSpec { aliases: &["cny", "yuan"], canonical: "cny", category: Currency, factor: dec!(7.24) },
    UnitSpec { aliases: &["inr"], canonical: "inr", category: Currency, factor: dec!(83.1) },
    UnitSpec { aliases: &["btc", "bitcoin"], canonical: "btc", category: Currency, factor: dec!(0.000016) },
];

/// Preferred display strings where the raw token is not what users expect
/// to read back. Everything else displays its canonical token.
static DISPLAY_LABELS: &[(&str, &str)] = &[
    ("tsp", "tsp."),
    ("tbsp", "tbsp."),
    ("floz", "fl. oz"),
    ("l", "L"),
    ("c", "°C"),
    ("f", "°F"),
    ("k", "K"),
];

static UNIT_TABLE: Lazy<HashMap<&'static str, UnitDef>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for spec in UNIT_SPECS {
        for alias in spec.aliases {
            table.insert(
                *alias,
                UnitDef {
                    canonical: spec.canonical,
                    category: spec.category,
                    factor: spec.factor,
                },
            );
        }
    }
    table
});

/// Resolves a lowercase unit alias.
pub fn lookup(alias: &str) -> Option<UnitDef> {
    UNIT_TABLE.get(alias).copied()
}

/// Normalizes a display label or user token back to an alias shape:
/// lowercase with decoration (dots, spaces, degree signs) removed, so
/// `"tsp."` and `"°C"` resolve like `"tsp"` and `"c"`.
pub fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|ch| !matches!(ch, '.' | ' ' | '°'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Display string for a canonical unit token.
pub fn display_label(canonical: &str) -> &str {
    DISPLAY_LABELS
        .iter()
        .find(|(token, _)| *token == canonical)
        .map(|(_, label)| *label)
        .unwrap_or(canonical)
}

/// Conversion failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    UnknownUnit(String),
    Unsupported { source: String, target: String },
    OutOfRange,
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUnit(token) => write!(f, "unknown unit: {token}"),
            Self::Unsupported { source, target } => {
                write!(f, "cannot convert {source} to {target}")
            }
            Self::OutOfRange => write!(f, "conversion out of range"),
        }
    }
}

impl Error for ConversionError {}

/// Successful conversion: the target-unit value plus its resolved target.
#[derive(Debug, Clone)]
pub struct Converted {
    pub value: Decimal,
    pub target: UnitDef,
}

/// Converts `value` between two unit aliases.
///
/// Same-category conversions use the category rule (factor ratio, kelvin
/// composition, or pixel composition). Physical length and CSS chain
/// through pixels via `ppi_base`; everything else across categories is
/// unsupported and names both units in the error.
pub fn convert(
    value: Decimal,
    source_alias: &str,
    target_alias: &str,
    em_base: Decimal,
    ppi_base: Decimal,
) -> Result<Converted, ConversionError> {
    let source =
        lookup(source_alias).ok_or_else(|| ConversionError::UnknownUnit(source_alias.into()))?;
    let target =
        lookup(target_alias).ok_or_else(|| ConversionError::UnknownUnit(target_alias.into()))?;

    let converted = match (source.category, target.category) {
        (Temperature, Temperature) => from_kelvin(target.canonical, to_kelvin(source.canonical, value)?)?,
        (Css, Css) => {
            from_pixels(target.canonical, to_pixels(source.canonical, value, em_base, ppi_base)?, em_base, ppi_base)?
        }
        (Currency, Currency) => value
            .checked_div(source.factor)
            .and_then(|usd| usd.checked_mul(target.factor))
            .ok_or(ConversionError::OutOfRange)?,
        (Length, Css) => {
            let inches = value
                .checked_mul(source.factor)
                .and_then(|meters| meters.checked_div(dec!(0.0254)))
                .ok_or(ConversionError::OutOfRange)?;
            let pixels = inches.checked_mul(ppi_base).ok_or(ConversionError::OutOfRange)?;
            from_pixels(target.canonical, pixels, em_base, ppi_base)?
        }
        (Css, Length) => {
            let pixels = to_pixels(source.canonical, value, em_base, ppi_base)?;
            let meters = pixels
                .checked_div(ppi_base)
                .and_then(|inches| inches.checked_mul(dec!(0.0254)))
                .ok_or(ConversionError::OutOfRange)?;
            meters.checked_div(target.factor).ok_or(ConversionError::OutOfRange)?
        }
        (a, b) if a == b => value
            .checked_mul(source.factor)
            .and_then(|base| base.checked_div(target.factor))
            .ok_or(ConversionError::OutOfRange)?,
        _ => {
            return Err(ConversionError::Unsupported {
                source: source.canonical.to_string(),
                target: target.canonical.to_string(),
            })
        }
    };

    Ok(Converted {
        value: converted,
        target,
    })
}

fn to_kelvin(canonical: &str, value: Decimal) -> Result<Decimal, ConversionError> {
    match canonical {
        "c" => value.checked_add(dec!(273.15)).ok_or(ConversionError::OutOfRange),
        "f" => value
            .checked_add(dec!(459.67))
            .and_then(|shifted| shifted.checked_mul(dec!(5)))
            .and_then(|scaled| scaled.checked_div(dec!(9)))
            .ok_or(ConversionError::OutOfRange),
        _ => Ok(value),
    }
}

fn from_kelvin(canonical: &str, kelvin: Decimal) -> Result<Decimal, ConversionError> {
    match canonical {
        "c" => kelvin.checked_sub(dec!(273.15)).ok_or(ConversionError::OutOfRange),
        "f" => kelvin
            .checked_mul(dec!(9))
            .and_then(|scaled| scaled.checked_div(dec!(5)))
            .and_then(|shifted| shifted.checked_sub(dec!(459.67)))
            .ok_or(ConversionError::OutOfRange),
        _ => Ok(kelvin),
    }
}

fn to_pixels(
    canonical: &str,
    value: Decimal,
    em_base: Decimal,
    ppi_base: Decimal,
) -> Result<Decimal, ConversionError> {
    match canonical {
        "em" => value.checked_mul(em_base).ok_or(ConversionError::OutOfRange),
        "pt" => value
            .checked_mul(ppi_base)
            .and_then(|scaled| scaled.checked_div(dec!(72)))
            .ok_or(ConversionError::OutOfRange),
        _ => Ok(value),
    }
}

fn from_pixels(
    canonical: &str,
    pixels: Decimal,
    em_base: Decimal,
    ppi_base: Decimal,
) -> Result<Decimal, ConversionError> {
    match canonical {
        "em" => pixels.checked_div(em_base).ok_or(ConversionError::OutOfRange),
        "pt" => pixels
            .checked_mul(dec!(72))
            .and_then(|scaled| scaled.checked_div(ppi_base))
            .ok_or(ConversionError::OutOfRange),
        _ => Ok(pixels),
    }
}

//! Calculation engine: dispatchers, evaluation context and public helpers.
//!
//! # Responsibility
//! - Resolve one input line to a [`CalcResult`] through the fixed
//!   dispatcher chain: blank/comment, assignment, unit conversion,
//!   percentage sentence forms, then the normalized generic fallback.
//! - Expose the pure classification helpers used by callers.
//!
//! # Invariants
//! - Dispatcher order is fixed and first match wins; the chain is
//!   regression-tested and must not be reordered.
//! - Evaluation is a pure function of `(input, context)`; the engine
//!   never panics and never returns `Err` across this boundary.
//! - The engine reads variables but never writes them; persisting an
//!   assignment is the caller's job.

pub mod dates;
pub mod expr;
pub mod normalize;
pub mod units;

use crate::model::document::{LineCategory, VariableMap};
use crate::model::result::CalcResult;
use chrono::NaiveDate;
use dates::DateInterpretation;
use expr::Evaluated;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Per-call evaluation configuration and variable bindings.
#[derive(Debug, Clone)]
pub struct EvalContext<'a> {
    pub variables: &'a VariableMap,
    /// Pixels per CSS `em`.
    pub em_base: Decimal,
    /// Pixels per inch.
    pub ppi_base: Decimal,
    /// Formatted-output precision override.
    pub decimal_places: Option<u32>,
    /// Reference date for relative-date phrases; injected so evaluation
    /// never reads the system clock.
    pub today: NaiveDate,
}

impl<'a> EvalContext<'a> {
    pub fn new(variables: &'a VariableMap) -> Self {
        Self {
            variables,
            em_base: dec!(16),
            ppi_base: dec!(96),
            decimal_places: None,
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_em_base(mut self, em_base: Decimal) -> Self {
        self.em_base = em_base;
        self
    }

    pub fn with_ppi_base(mut self, ppi_base: Decimal) -> Self {
        self.ppi_base = ppi_base;
        self
    }

    pub fn with_decimal_places(mut self, decimal_places: u32) -> Self {
        self.decimal_places = Some(decimal_places);
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

static ASSIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s*=\s*(.+)$").expect("valid assignment regex"));
static CONVERT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)\s+in\s+(\w+)\s*$").expect("valid conversion regex"));
static PERCENT_OF_WHAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?|[a-z_]\w*)\s*%\s+of\s+what\s+is\s+(.+)$")
        .expect("valid reverse percentage regex")
});
static PERCENT_OF_SENTENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?|[a-z_]\w*)\s*%\s+of\s+(.+)$")
        .expect("valid percent-of sentence regex")
});
static PERCENT_OFF_SENTENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?|[a-z_]\w*)\s*%\s+off\s+(.+)$")
        .expect("valid percent-off sentence regex")
});
static RATIO_PERCENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)\s+as\s+a\s+%\s+of\s+(.+)$").expect("valid ratio percentage regex")
});
static PERCENT_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)%\s*(of|off)\b").expect("valid percent keyword regex"));
static FUNCTION_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\b(sqrt|cbrt|sin|cos|tan|asin|acos|atan|log|floor|ceil|round|abs)\b|\b(square|cube)\s+root\b)",
    )
    .expect("valid function name regex")
});
static CSS_UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(px|em|pt)\b").expect("valid css unit regex"));

/// Evaluates one line against the supplied context.
pub fn evaluate(input: &str, ctx: &EvalContext<'_>) -> CalcResult {
    let trimmed = input.trim();
    if is_comment(trimmed) {
        return CalcResult::silent();
    }
    if let Some(result) = try_assignment(trimmed, ctx) {
        return result;
    }
    if let Some(result) = try_conversion(trimmed, ctx) {
        return result;
    }
    if let Some(result) = try_percentage(trimmed, ctx) {
        return result;
    }
    evaluate_fallback(trimmed, ctx)
}

/// Returns the lowercased target name when the line is an assignment,
/// without evaluating anything.
pub fn extract_variable_name(input: &str) -> Option<String> {
    let caps = ASSIGN_RE.captures(input.trim())?;
    let name = &caps[1];
    let rhs = &caps[2];
    if name.chars().all(|ch| ch.is_ascii_digit()) || rhs.starts_with('=') {
        return None;
    }
    Some(name.to_lowercase())
}

/// Classifies a line for UI coloring. Pure string matching, independent of
/// evaluation.
pub fn detect_category(input: &str) -> LineCategory {
    let trimmed = input.trim();
    if is_comment(trimmed) {
        return LineCategory::Comment;
    }
    if extract_variable_name(trimmed).is_some() {
        return LineCategory::Variables;
    }
    if CSS_UNIT_RE.is_match(trimmed) {
        return LineCategory::CssCalculations;
    }
    if let Some(caps) = CONVERT_RE.captures(trimmed) {
        if units::lookup(&caps[2].to_lowercase()).is_some() {
            return LineCategory::UnitConversion;
        }
    }
    if FUNCTION_NAME_RE.is_match(trimmed) {
        return LineCategory::Functions;
    }
    LineCategory::Basic
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('#')
}

fn try_assignment(line: &str, ctx: &EvalContext<'_>) -> Option<CalcResult> {
    let caps = ASSIGN_RE.captures(line)?;
    let name = &caps[1];
    let rhs = caps[2].trim();
    if name.chars().all(|ch| ch.is_ascii_digit()) || rhs.starts_with('=') {
        return None;
    }
    Some(evaluate(rhs, ctx))
}

fn try_conversion(line: &str, ctx: &EvalContext<'_>) -> Option<CalcResult> {
    let caps = CONVERT_RE.captures(line)?;
    let target_token = caps[2].to_lowercase();
    let target = units::lookup(&target_token)?;
    let lhs = caps[1].trim();

    // Currency-symbol source: "$300 in rub".
    let (stripped, code) = normalize::strip_currency(lhs);
    if let Some(code) = code {
        return Some(match eval_numeric(&stripped, ctx) {
            Ok(amount) => finish_conversion(amount, &code.to_lowercase(), &target_token, ctx),
            Err(message) => CalcResult::error(message),
        });
    }

    // Trailing unit token source: "4 cm in inches", "(2 + 2) km in mi".
    if let Some((amount_expr, source_token)) = split_trailing_unit(lhs) {
        if units::lookup(&source_token).is_some() {
            let amount = if amount_expr.is_empty() {
                Ok(Decimal::ONE)
            } else {
                eval_numeric(&amount_expr, ctx)
            };
            return Some(match amount {
                Ok(value) => finish_conversion(value, &source_token, &target_token, ctx),
                Err(message) => CalcResult::error(message),
            });
        }
    }

    // Variable source carrying a unit or currency result.
    if let Some(existing) = ctx.variables.get(lhs) {
        match existing {
            CalcResult::Unit { value, unit, .. } => {
                let source = units::normalize_token(unit);
                return Some(finish_conversion(*value, &source, &target_token, ctx));
            }
            CalcResult::Currency { value, code, .. } => {
                return Some(finish_conversion(
                    *value,
                    &code.to_lowercase(),
                    &target_token,
                    ctx,
                ));
            }
            _ => {}
        }
    }

    // Plain number with a px/em target converts against the other CSS base.
    if matches!(target.canonical, "px" | "em") {
        if let Ok(amount) = eval_numeric(lhs, ctx) {
            let implicit = if target.canonical == "px" { "em" } else { "px" };
            return Some(finish_conversion(amount, implicit, &target_token, ctx));
        }
    }

    None
}

fn split_trailing_unit(lhs: &str) -> Option<(String, String)> {
    let trimmed = lhs.trim_end();
    let bytes = trimmed.as_bytes();
    let mut start = trimmed.len();
    while start > 0 && bytes[start - 1].is_ascii_alphabetic() {
        start -= 1;
    }
    if start == trimmed.len() {
        return None;
    }
    // A '_' just before the run means this is an identifier tail, not a
    // number-plus-unit pair.
    if start > 0 && bytes[start - 1] == b'_' {
        return None;
    }
    Some((
        trimmed[..start].trim().to_string(),
        trimmed[start..].to_lowercase(),
    ))
}

fn finish_conversion(
    value: Decimal,
    source_alias: &str,
    target_alias: &str,
    ctx: &EvalContext<'_>,
) -> CalcResult {
    match units::convert(value, source_alias, target_alias, ctx.em_base, ctx.ppi_base) {
        Ok(converted) => {
            if converted.target.category == units::UnitCategory::Currency {
                CalcResult::currency(converted.value, converted.target.canonical, ctx.decimal_places)
            } else {
                CalcResult::unit(
                    converted.value,
                    units::display_label(converted.target.canonical),
                    ctx.decimal_places,
                )
            }
        }
        Err(err) => CalcResult::error(err.to_string()),
    }
}

fn try_percentage(line: &str, ctx: &EvalContext<'_>) -> Option<CalcResult> {
    // Reverse percentage first: its pattern is a superset of plain
    // percent-of and would otherwise be shadowed.
    if let Some(caps) = PERCENT_OF_WHAT_RE.captures(line) {
        return Some(percent_of_what(&caps[1], &caps[2], ctx));
    }
    if let Some(caps) = PERCENT_OF_SENTENCE_RE.captures(line) {
        return Some(percent_of(&caps[1], &caps[2], ctx));
    }
    if let Some(caps) = PERCENT_OFF_SENTENCE_RE.captures(line) {
        return Some(percent_off(&caps[1], &caps[2], ctx));
    }
    if let Some(caps) = RATIO_PERCENT_RE.captures(line) {
        return Some(ratio_percent(&caps[1], &caps[2], ctx));
    }
    None
}

fn percent_of_what(pct_expr: &str, operand_expr: &str, ctx: &EvalContext<'_>) -> CalcResult {
    let pct = match eval_numeric(pct_expr, ctx) {
        Ok(value) => value,
        Err(message) => return CalcResult::error(message),
    };
    if pct.is_zero() {
        return CalcResult::error("division by zero");
    }
    let operand = evaluate(operand_expr, ctx);
    if operand.is_error() {
        return operand;
    }
    match operand
        .value()
        .checked_mul(dec!(100))
        .and_then(|scaled| scaled.checked_div(pct))
    {
        Some(value) => rewrap(&operand, value, ctx),
        None => CalcResult::error("numeric overflow"),
    }
}

fn percent_of(pct_expr: &str, operand_expr: &str, ctx: &EvalContext<'_>) -> CalcResult {
    let pct = match eval_numeric(pct_expr, ctx) {
        Ok(value) => value,
        Err(message) => return CalcResult::error(message),
    };
    let operand = evaluate(operand_expr, ctx);
    if operand.is_error() {
        return operand;
    }
    match pct
        .checked_div(dec!(100))
        .and_then(|rate| rate.checked_mul(operand.value()))
    {
        Some(value) => rewrap(&operand, value, ctx),
        None => CalcResult::error("numeric overflow"),
    }
}

fn percent_off(pct_expr: &str, operand_expr: &str, ctx: &EvalContext<'_>) -> CalcResult {
    let pct = match eval_numeric(pct_expr, ctx) {
        Ok(value) => value,
        Err(message) => return CalcResult::error(message),
    };
    let operand = evaluate(operand_expr, ctx);
    if operand.is_error() {
        return operand;
    }
    let rate = match pct.checked_div(dec!(100)) {
        Some(rate) => rate,
        None => return CalcResult::error("numeric overflow"),
    };
    match Decimal::ONE
        .checked_sub(rate)
        .and_then(|keep| operand.value().checked_mul(keep))
    {
        Some(value) => rewrap(&operand, value, ctx),
        None => CalcResult::error("numeric overflow"),
    }
}

fn ratio_percent(part_expr: &str, whole_expr: &str, ctx: &EvalContext<'_>) -> CalcResult {
    let part = evaluate(part_expr, ctx);
    if part.is_error() {
        return part;
    }
    let whole = evaluate(whole_expr, ctx);
    if whole.is_error() {
        return whole;
    }
    if whole.value().is_zero() {
        return CalcResult::error("division by zero");
    }
    match part
        .value()
        .checked_div(whole.value())
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
    {
        Some(value) => CalcResult::percentage(value, ctx.decimal_places),
        None => CalcResult::error("numeric overflow"),
    }
}

/// Wraps a derived value in the same kind as the operand it came from.
fn rewrap(operand: &CalcResult, value: Decimal, ctx: &EvalContext<'_>) -> CalcResult {
    match operand {
        CalcResult::Currency { code, .. } => CalcResult::currency(value, code, ctx.decimal_places),
        CalcResult::Unit { unit, .. } => CalcResult::unit(value, unit, ctx.decimal_places),
        _ => CalcResult::number(value, ctx.decimal_places),
    }
}

fn evaluate_fallback(line: &str, ctx: &EvalContext<'_>) -> CalcResult {
    let dates = dates::substitute_relative_dates(line, ctx.today);
    let (working, currency_code) = normalize::strip_currency(&dates.rewritten);

    // A self-standing percent with no of/off keyword reads as a
    // percentage literal expression.
    let percent_literal =
        working.contains('%') && !PERCENT_KEYWORD_RE.is_match(&working);

    let mut working = normalize::rewrite_inline_percent(&working);
    if let Some(message) = normalize::find_incomplete_percent(&working) {
        return CalcResult::error(message);
    }
    if percent_literal {
        working = working.replace('%', "");
    }
    working = normalize::apply_word_operators(&working);
    working = normalize::rewrite_degrees(&working);
    working = normalize::balance_parens(&working);
    working = normalize::substitute_variables(&working, ctx.variables);
    // Second percent pass: variable substitution can expose parenthesized
    // operands that were names on the first pass.
    working = normalize::rewrite_inline_percent(&working);

    match expr::evaluate(&working) {
        Err(err) => CalcResult::error(err.to_string()),
        Ok(Evaluated::Infinity { negative }) => CalcResult::infinite(negative),
        Ok(Evaluated::Finite(value)) => {
            wrap_plain(value, currency_code, percent_literal, dates.interpretation, ctx)
        }
    }
}

fn wrap_plain(
    value: Decimal,
    currency_code: Option<&'static str>,
    percent_literal: bool,
    interpretation: DateInterpretation,
    ctx: &EvalContext<'_>,
) -> CalcResult {
    if let Some(code) = currency_code {
        return CalcResult::currency(value, code, ctx.decimal_places);
    }
    if percent_literal {
        return CalcResult::percentage(value, ctx.decimal_places);
    }
    match interpretation {
        DateInterpretation::AsDate => match value.trunc().to_i64() {
            Some(days) => CalcResult::date(days),
            None => CalcResult::error("date out of range"),
        },
        DateInterpretation::AsDayCount => CalcResult::unit(value, "days", ctx.decimal_places),
        DateInterpretation::None => CalcResult::number(value, ctx.decimal_places),
    }
}

/// Normalizes and evaluates a sub-expression to a plain decimal, for
/// dispatcher operands that only need a magnitude.
fn eval_numeric(expression: &str, ctx: &EvalContext<'_>) -> Result<Decimal, String> {
    let dates = dates::substitute_relative_dates(expression, ctx.today);
    let (working, _) = normalize::strip_currency(&dates.rewritten);
    let mut working = normalize::rewrite_inline_percent(&working);
    working = normalize::apply_word_operators(&working);
    working = normalize::rewrite_degrees(&working);
    working = normalize::balance_parens(&working);
    working = normalize::substitute_variables(&working, ctx.variables);
    working = normalize::rewrite_inline_percent(&working);
    match expr::evaluate(&working) {
        Ok(Evaluated::Finite(value)) => Ok(value),
        Ok(Evaluated::Infinity { .. }) => Err("division by zero".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

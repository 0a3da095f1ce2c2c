//! Natural-language normalization passes.
//!
//! # Responsibility
//! - Rewrite human phrasings into a machine-parseable expression string.
//! - Keep each pass from corrupting text that a later pass still needs.
//!
//! # Invariants
//! - Passes run in a fixed order; the word-operator table is ordered
//!   longest phrase first so specific phrases win over their fragments.
//! - The inline percent rewrite accepts numeric literals and parenthesized
//!   sub-expressions, so it can run again after variable substitution.
//! - Variable substitution is word-boundary, case-insensitive, and always
//!   parenthesizes the substituted value.

use crate::model::document::VariableMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Currency symbols recognized as a leading or trailing marker.
static CURRENCY_SYMBOLS: &[(char, &str)] = &[
    ('$', "USD"),
    ('€', "EUR"),
    ('£', "GBP"),
    ('¥', "JPY"),
];

static LEADING_CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([$€£¥])\s*").expect("valid leading currency regex"));
static TRAILING_CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([$€£¥])\s*$").expect("valid trailing currency regex"));

/// Detects and strips a single leading or trailing currency symbol,
/// returning the remaining expression and the inferred currency code.
pub fn strip_currency(input: &str) -> (String, Option<&'static str>) {
    if let Some(caps) = LEADING_CURRENCY_RE.captures(input) {
        let code = symbol_code(&caps[1]);
        return (LEADING_CURRENCY_RE.replace(input, "").into_owned(), code);
    }
    if let Some(caps) = TRAILING_CURRENCY_RE.captures(input) {
        let code = symbol_code(&caps[1]);
        return (TRAILING_CURRENCY_RE.replace(input, "").into_owned(), code);
    }
    (input.to_string(), None)
}

fn symbol_code(symbol: &str) -> Option<&'static str> {
    let ch = symbol.chars().next()?;
    CURRENCY_SYMBOLS
        .iter()
        .find(|(known, _)| *known == ch)
        .map(|(_, code)| *code)
}

// Operand shape shared by both inline percent rewrites: a numeric literal
// or one parenthesized sub-expression.
const PERCENT_OPERAND: &str = r"(\d+(?:\.\d+)?|\([^()]*\))";

static PERCENT_OFF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){PERCENT_OPERAND}\s*%\s*off\b\s*{PERCENT_OPERAND}"
    ))
    .expect("valid percent-off regex")
});
static PERCENT_OF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){PERCENT_OPERAND}\s*%\s*of\b\s*{PERCENT_OPERAND}"
    ))
    .expect("valid percent-of regex")
});

/// Rewrites inline `N% of M` and `N% off M` into parenthesized arithmetic.
pub fn rewrite_inline_percent(expression: &str) -> String {
    let off_applied = PERCENT_OFF_RE.replace_all(expression, "($2*(1-$1/100))");
    PERCENT_OF_RE
        .replace_all(&off_applied, "(($1/100)*$2)")
        .into_owned()
}

static INCOMPLETE_PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)%\s*(off|of)\s*$").expect("valid incomplete percent regex"));

/// Reports a trailing `N% of` / `N% off` with no operand.
pub fn find_incomplete_percent(expression: &str) -> Option<String> {
    INCOMPLETE_PERCENT_RE.captures(expression).map(|caps| {
        format!(
            "Incomplete expression: missing operand after '% {}'",
            caps[1].to_lowercase()
        )
    })
}

/// Ordered word-operator substitutions. Longer, more specific phrases
/// must appear before any shorter substring they contain.
static WORD_OPERATORS: &[(&str, &str)] = &[
    (r"to\s+the\s+power\s+of", "^"),
    (r"multiplied\s+by", "*"),
    (r"divided\s+by", "/"),
    (r"square\s+root\s+of", "sqrt("),
    (r"cube\s+root\s+of", "cbrt("),
    (r"absolute\s+value\s+of", "abs("),
    (r"sine\s+of", "sin("),
    (r"cosine\s+of", "cos("),
    (r"tangent\s+of", "tan("),
    (r"log\s+of", "log("),
    (r"floor\s+of", "floor("),
    (r"ceiling\s+of", "ceil("),
    (r"squared", "^2"),
    (r"cubed", "^3"),
    (r"times", "*"),
    (r"plus", "+"),
    (r"and", "+"),
    (r"minus", "-"),
    (r"over", "/"),
    (r"pow", "^"),
];

static WORD_OPERATOR_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    WORD_OPERATORS
        .iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(&format!(r"(?i)\b{pattern}\b")).expect("valid word operator regex"),
                *replacement,
            )
        })
        .collect()
});

static DIGIT_X_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d)\s*x\s*(\d)").expect("valid x operator regex"));

/// Applies the natural-language operator table.
pub fn apply_word_operators(expression: &str) -> String {
    let mut working = expression.to_string();
    for (regex, replacement) in WORD_OPERATOR_RES.iter() {
        working = regex.replace_all(&working, *replacement).into_owned();
    }
    DIGIT_X_RE.replace_all(&working, "$1 * $2").into_owned()
}

static DEGREE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*°").expect("valid degree regex"));

/// Converts degree notation to radians inline.
pub fn rewrite_degrees(expression: &str) -> String {
    DEGREE_RE
        .replace_all(expression, "(($1) * pi / 180)")
        .into_owned()
}

/// Appends the closing parens still owed after function-name rewrites.
pub fn balance_parens(expression: &str) -> String {
    let open = expression.matches('(').count();
    let close = expression.matches(')').count();
    if open > close {
        let mut balanced = expression.to_string();
        balanced.extend(std::iter::repeat(')').take(open - close));
        balanced
    } else {
        expression.to_string()
    }
}

/// Substitutes every known variable reference with its parenthesized
/// numeric value. Longer names are substituted first so one name never
/// clobbers another that contains it.
pub fn substitute_variables(expression: &str, variables: &VariableMap) -> String {
    let mut names: Vec<&str> = variables.iter().map(|(name, _)| name).collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));

    let mut working = expression.to_string();
    for name in names {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(name));
        let regex = Regex::new(&pattern).expect("valid variable regex");
        if let Some(result) = variables.get(name) {
            let replacement = format!("({})", result.value().normalize());
            working = regex.replace_all(&working, replacement.as_str()).into_owned();
        }
    }
    working
}

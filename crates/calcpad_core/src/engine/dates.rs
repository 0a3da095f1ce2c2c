//! Relative-date phrase substitution.
//!
//! # Responsibility
//! - Replace natural-language date phrases with day-count integers so
//!   date arithmetic becomes plain integer arithmetic.
//! - Decide how the numeric result should be read back (calendar date or
//!   day count).
//!
//! # Invariants
//! - Phrases are matched longest first; `next week` must win before a
//!   shorter `next` fragment could interfere.
//! - Day counts are relative to 1970-01-01.
//! - The reference date is injected, never read from the system clock.

use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// How the final numeric value of an expression should be interpreted
/// after date substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInterpretation {
    /// No date phrase was involved.
    None,
    /// Read the result as a calendar date.
    AsDate,
    /// Read the result as a number of days.
    AsDayCount,
}

/// Outcome of the date substitution pass.
#[derive(Debug, Clone)]
pub struct DateSubstitution {
    pub rewritten: String,
    pub interpretation: DateInterpretation,
}

enum Offset {
    Days(i64),
    Months(i32),
}

/// Phrase table, ordered longest-match-first.
static DATE_PHRASES: &[(&str, Offset)] = &[
    ("day after tomorrow", Offset::Days(2)),
    ("day before yesterday", Offset::Days(-2)),
    ("next week", Offset::Days(7)),
    ("last week", Offset::Days(-7)),
    ("next month", Offset::Months(1)),
    ("last month", Offset::Months(-1)),
    ("next year", Offset::Months(12)),
    ("last year", Offset::Months(-12)),
    ("tomorrow", Offset::Days(1)),
    ("yesterday", Offset::Days(-1)),
    ("today", Offset::Days(0)),
];

static DATE_PHRASE_RES: Lazy<Vec<(Regex, &'static Offset)>> = Lazy::new(|| {
    DATE_PHRASES
        .iter()
        .map(|(phrase, offset)| {
            let pattern = format!(r"(?i)\b{}\b", phrase.replace(' ', r"\s+"));
            (
                Regex::new(&pattern).expect("valid date phrase regex"),
                offset,
            )
        })
        .collect()
});

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch date")
}

/// Days between the epoch and `date`.
pub fn days_since_epoch(date: NaiveDate) -> i64 {
    (date - epoch()).num_days()
}

fn resolve(today: NaiveDate, offset: &Offset) -> Option<NaiveDate> {
    match offset {
        Offset::Days(days) => today.checked_add_signed(chrono::Duration::days(*days)),
        Offset::Months(months) if *months >= 0 => {
            today.checked_add_months(Months::new(*months as u32))
        }
        Offset::Months(months) => today.checked_sub_months(Months::new(months.unsigned_abs())),
    }
}

/// Replaces every known relative-date phrase with its day count.
///
/// Exactly one substituted phrase means the expression result is a
/// calendar date; two or more combined with subtraction means the result
/// is a day count.
pub fn substitute_relative_dates(input: &str, today: NaiveDate) -> DateSubstitution {
    let mut rewritten = input.to_string();
    let mut substitutions = 0usize;

    for (regex, offset) in DATE_PHRASE_RES.iter() {
        if !regex.is_match(&rewritten) {
            continue;
        }
        let day_count = resolve(today, offset)
            .map(days_since_epoch)
            .unwrap_or_else(|| days_since_epoch(today));
        substitutions += regex.find_iter(&rewritten).count();
        rewritten = regex
            .replace_all(&rewritten, day_count.to_string())
            .into_owned();
    }

    let interpretation = match substitutions {
        0 => DateInterpretation::None,
        1 => DateInterpretation::AsDate,
        _ if input.contains('-') || contains_minus_word(input) => DateInterpretation::AsDayCount,
        _ => DateInterpretation::AsDate,
    };

    DateSubstitution {
        rewritten,
        interpretation,
    }
}

fn contains_minus_word(input: &str) -> bool {
    static MINUS_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bminus\b").expect("valid minus regex"));
    MINUS_RE.is_match(input)
}

#[cfg(test)]
mod tests {
    use super::{substitute_relative_dates, DateInterpretation};
    use chrono::NaiveDate;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn single_phrase_becomes_a_date_expression() {
        let sub = substitute_relative_dates("today + 7", reference());
        // 2024-03-15 is day 19797.
        assert_eq!(sub.rewritten, "19797 + 7");
        assert_eq!(sub.interpretation, DateInterpretation::AsDate);
    }

    #[test]
    fn longer_phrases_win_over_fragments() {
        let sub = substitute_relative_dates("next week", reference());
        assert_eq!(sub.rewritten, "19804");
        assert_eq!(sub.interpretation, DateInterpretation::AsDate);
    }

    #[test]
    fn month_phrases_use_calendar_arithmetic() {
        let sub = substitute_relative_dates("next month", reference());
        // 2024-04-15, not a fixed 30-day jump from a different month length.
        assert_eq!(sub.rewritten, "19828");
    }

    #[test]
    fn two_phrases_with_subtraction_become_a_day_count() {
        let sub = substitute_relative_dates("tomorrow - today", reference());
        assert_eq!(sub.rewritten, "19798 - 19797");
        assert_eq!(sub.interpretation, DateInterpretation::AsDayCount);
    }

    #[test]
    fn unrelated_text_is_untouched() {
        let sub = substitute_relative_dates("5 + 3", reference());
        assert_eq!(sub.rewritten, "5 + 3");
        assert_eq!(sub.interpretation, DateInterpretation::None);
    }
}

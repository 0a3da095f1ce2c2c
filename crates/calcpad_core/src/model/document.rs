//! Document and line domain model.
//!
//! # Responsibility
//! - Define the calculation sheet aggregate: ordered lines plus a shared
//!   variable namespace.
//! - Maintain structural invariants across every mutation.
//!
//! # Invariants
//! - A document always contains at least one line.
//! - Line `order` values are dense `0..n-1` after any mutation.
//! - Variable names are lowercased at write and lookup time; last write
//!   wins in place.
//! - Editing a line's input clears its stale `result` and `category`.

use crate::model::result::CalcResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a document.
pub type DocumentId = Uuid;

/// Stable identifier for a line within a document.
pub type LineId = Uuid;

/// Classification tag used by UI layers for line coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCategory {
    Basic,
    UnitConversion,
    Functions,
    Variables,
    CssCalculations,
    Comment,
}

/// One editable calculation line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub input: String,
    /// `None` until the evaluation step runs, and again after any edit.
    pub result: Option<CalcResult>,
    /// Dense zero-based position within the owning document.
    pub order: usize,
    pub category: Option<LineCategory>,
}

impl Line {
    fn new(order: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            input: String::new(),
            result: None,
            order,
            category: None,
        }
    }

    /// Replaces the raw input and invalidates derived state.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.result = None;
        self.category = None;
    }
}

/// Case-insensitive variable namespace scoped to one document.
///
/// Stored as an ordered pair list so the serialized form is exactly a list
/// of `(name, result)` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableMap {
    entries: Vec<(String, CalcResult)>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a variable, ignoring case.
    pub fn get(&self, name: &str) -> Option<&CalcResult> {
        let normalized = name.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| *key == normalized)
            .map(|(_, result)| result)
    }

    /// Writes a variable under its lowercase name, replacing in place when
    /// the name already exists.
    pub fn set(&mut self, name: &str, result: CalcResult) {
        let normalized = name.to_lowercase();
        match self.entries.iter_mut().find(|(key, _)| *key == normalized) {
            Some((_, existing)) => *existing = result,
            None => self.entries.push((normalized, result)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CalcResult)> {
        self.entries
            .iter()
            .map(|(name, result)| (name.as_str(), result))
    }
}

/// Structural errors for document mutations.
#[derive(Debug, PartialEq, Eq)]
pub enum DocumentError {
    LineNotFound(LineId),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineNotFound(id) => write!(f, "line not found: {id}"),
        }
    }
}

impl Error for DocumentError {}

/// Calculation sheet aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    lines: Vec<Line>,
    pub variables: VariableMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a document with a generated ID and one blank line.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Creates a document with a caller-provided stable ID.
    pub fn with_id(id: DocumentId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            lines: vec![Line::new(0)],
            variables: VariableMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub(crate) fn line_mut(&mut self, id: LineId) -> Option<&mut Line> {
        self.lines.iter_mut().find(|line| line.id == id)
    }

    /// Appends a blank line at the end and returns its ID.
    pub fn append_line(&mut self) -> LineId {
        let line = Line::new(self.lines.len());
        let id = line.id;
        self.lines.push(line);
        self.touch();
        id
    }

    /// Inserts a blank line at `index` (clamped to the end) and returns its
    /// ID. Following lines are renumbered.
    pub fn insert_line(&mut self, index: usize) -> LineId {
        let index = index.min(self.lines.len());
        let line = Line::new(index);
        let id = line.id;
        self.lines.insert(index, line);
        self.renumber();
        self.touch();
        id
    }

    /// Replaces a line's raw input, clearing its stale result.
    pub fn set_line_input(
        &mut self,
        id: LineId,
        input: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let line = self.line_mut(id).ok_or(DocumentError::LineNotFound(id))?;
        line.set_input(input);
        self.touch();
        Ok(())
    }

    /// Removes a line and renumbers the rest. Removing the only line
    /// leaves one fresh blank line in its place.
    pub fn remove_line(&mut self, id: LineId) -> Result<(), DocumentError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.id == id)
            .ok_or(DocumentError::LineNotFound(id))?;
        self.lines.remove(index);
        if self.lines.is_empty() {
            self.lines.push(Line::new(0));
        }
        self.renumber();
        self.touch();
        Ok(())
    }

    /// Bumps the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn renumber(&mut self) {
        for (index, line) in self.lines.iter_mut().enumerate() {
            line.order = index;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentError, VariableMap};
    use crate::model::result::CalcResult;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn new_document_has_one_blank_line() {
        let doc = Document::new("sheet");
        assert_eq!(doc.lines().len(), 1);
        assert_eq!(doc.lines()[0].order, 0);
        assert!(doc.lines()[0].input.is_empty());
    }

    #[test]
    fn removing_the_only_line_leaves_a_fresh_blank_line() {
        let mut doc = Document::new("sheet");
        let original = doc.lines()[0].id;
        doc.set_line_input(original, "1 + 1").unwrap();

        doc.remove_line(original).unwrap();

        assert_eq!(doc.lines().len(), 1);
        assert_ne!(doc.lines()[0].id, original);
        assert!(doc.lines()[0].input.is_empty());
    }

    #[test]
    fn removal_renumbers_densely() {
        let mut doc = Document::new("sheet");
        let first = doc.lines()[0].id;
        let second = doc.append_line();
        let third = doc.append_line();

        doc.remove_line(second).unwrap();

        let orders: Vec<usize> = doc.lines().iter().map(|line| line.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_eq!(doc.lines()[0].id, first);
        assert_eq!(doc.lines()[1].id, third);
    }

    #[test]
    fn editing_input_clears_result() {
        let mut doc = Document::new("sheet");
        let id = doc.lines()[0].id;
        doc.line_mut(id).unwrap().result = Some(CalcResult::number(dec!(2), None));

        doc.set_line_input(id, "3").unwrap();

        assert!(doc.lines()[0].result.is_none());
    }

    #[test]
    fn unknown_line_is_reported() {
        let mut doc = Document::new("sheet");
        let missing = Uuid::new_v4();
        assert_eq!(
            doc.remove_line(missing),
            Err(DocumentError::LineNotFound(missing))
        );
    }

    #[test]
    fn variables_are_case_insensitive_and_last_write_wins() {
        let mut vars = VariableMap::new();
        vars.set("Amount", CalcResult::number(dec!(3), None));
        vars.set("other", CalcResult::number(dec!(1), None));
        vars.set("AMOUNT", CalcResult::number(dec!(5), None));

        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get("amount").unwrap().value(), dec!(5));
        assert_eq!(vars.get("AmOuNt").unwrap().value(), dec!(5));
        let names: Vec<&str> = vars.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["amount", "other"]);
    }
}

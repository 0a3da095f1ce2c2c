//! Document recompute orchestration.
//!
//! # Responsibility
//! - Drive line evaluation against the document's variable namespace.
//! - Persist assignment results back into the variable map.
//! - Aggregate line values into a document total.
//!
//! # Invariants
//! - `calculate_one` evaluates against the current variable snapshot and
//!   never cascades to other lines.
//! - `calculate_all` is a single top-to-bottom pass: a line sees variables
//!   from earlier lines only.
//! - Error results never block the rest of the document and are excluded
//!   from `total`.
//! - The total is kind-blind across currencies and units; callers wanting
//!   unit-aware sums must convert first.

use crate::engine::{self, EvalContext};
use crate::model::document::{Document, DocumentError, LineId, VariableMap};
use crate::model::result::CalcResult;
use crate::service::ai_fallback::{AiCalculator, AiRequest};
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Inputs shorter than this never reach the AI fallback.
const MIN_FALLBACK_INPUT_CHARS: usize = 12;

const FALLBACK_SYSTEM_PROMPT: &str = "You are a calculator. Interpret the input as one \
calculation and reply with a single numeric value and an optional unit.";

/// Engine configuration applied to every evaluation run by this service.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub em_base: Decimal,
    pub ppi_base: Decimal,
    pub decimal_places: Option<u32>,
    /// Reference date for relative-date phrases. `None` snapshots the
    /// local clock per evaluation call.
    pub today: Option<NaiveDate>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            em_base: dec!(16),
            ppi_base: dec!(96),
            decimal_places: None,
            today: None,
        }
    }
}

/// Service error for document recompute operations.
#[derive(Debug, PartialEq, Eq)]
pub enum ServiceError {
    LineNotFound(LineId),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineNotFound(id) => write!(f, "line not found: {id}"),
        }
    }
}

impl Error for ServiceError {}

impl From<DocumentError> for ServiceError {
    fn from(value: DocumentError) -> Self {
        match value {
            DocumentError::LineNotFound(id) => Self::LineNotFound(id),
        }
    }
}

/// Facade driving the engine over whole documents.
pub struct DocumentService {
    settings: EngineSettings,
}

impl DocumentService {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn context<'a>(&self, variables: &'a VariableMap) -> EvalContext<'a> {
        let mut ctx = EvalContext::new(variables)
            .with_em_base(self.settings.em_base)
            .with_ppi_base(self.settings.ppi_base);
        if let Some(places) = self.settings.decimal_places {
            ctx = ctx.with_decimal_places(places);
        }
        if let Some(today) = self.settings.today {
            ctx = ctx.with_today(today);
        }
        ctx
    }

    /// Evaluates one line against the current variable snapshot. A
    /// successful assignment writes its variable; nothing else cascades.
    pub fn calculate_one(
        &self,
        doc: &mut Document,
        line_id: LineId,
    ) -> Result<CalcResult, ServiceError> {
        let input = doc
            .line(line_id)
            .ok_or(ServiceError::LineNotFound(line_id))?
            .input
            .clone();

        let result = engine::evaluate(&input, &self.context(&doc.variables));
        let category = engine::detect_category(&input);

        if !result.is_error() {
            if let Some(name) = engine::extract_variable_name(&input) {
                doc.variables.set(&name, result.clone());
            }
        }

        let line = doc
            .line_mut(line_id)
            .ok_or(ServiceError::LineNotFound(line_id))?;
        line.result = Some(result.clone());
        line.category = Some(category);
        doc.touch();

        debug!(
            "event=calculate_one module=service status=ok line={line_id} kind={:?}",
            result.kind()
        );
        Ok(result)
    }

    /// Like [`Self::calculate_one`], then hands visible errors on long
    /// inputs to the external interpreter, once. A usable answer replaces
    /// the stored result; anything else keeps the local error.
    pub fn calculate_one_with_fallback(
        &self,
        doc: &mut Document,
        line_id: LineId,
        ai: &dyn AiCalculator,
    ) -> Result<CalcResult, ServiceError> {
        let local = self.calculate_one(doc, line_id)?;
        if !local.is_error() || local.is_silent() {
            return Ok(local);
        }

        let input = doc
            .line(line_id)
            .ok_or(ServiceError::LineNotFound(line_id))?
            .input
            .clone();
        if input.trim().chars().count() < MIN_FALLBACK_INPUT_CHARS {
            return Ok(local);
        }

        let response = ai.process(&AiRequest {
            input: input.clone(),
            system_prompt: FALLBACK_SYSTEM_PROMPT.to_string(),
        });
        let interpreted = match (response.success, response.value) {
            (true, Some(value)) => match response.unit {
                Some(unit) => CalcResult::unit(value, &unit, self.settings.decimal_places),
                None => CalcResult::number(value, self.settings.decimal_places),
            },
            _ => {
                warn!("event=ai_fallback module=service status=failed line={line_id}");
                return Ok(local);
            }
        };

        if let Some(line) = doc.line_mut(line_id) {
            line.result = Some(interpreted.clone());
        }
        doc.touch();
        debug!("event=ai_fallback module=service status=ok line={line_id}");
        Ok(interpreted)
    }

    /// Re-evaluates every line top to bottom against a variable map that
    /// is rebuilt incrementally: a line can reference variables defined on
    /// earlier lines in the same pass, never later ones.
    pub fn calculate_all(&self, doc: &mut Document) {
        doc.variables.clear();
        for index in 0..doc.lines().len() {
            let line = &doc.lines()[index];
            let (line_id, input) = (line.id, line.input.clone());

            let result = engine::evaluate(&input, &self.context(&doc.variables));
            let category = engine::detect_category(&input);

            if !result.is_error() {
                if let Some(name) = engine::extract_variable_name(&input) {
                    doc.variables.set(&name, result.clone());
                }
            }
            if let Some(line) = doc.line_mut(line_id) {
                line.result = Some(result);
                line.category = Some(category);
            }
        }
        doc.touch();
        debug!(
            "event=calculate_all module=service status=ok lines={} vars={}",
            doc.lines().len(),
            doc.variables.len()
        );
    }

    /// Sum of every evaluated non-error line value, blind to mixed kinds.
    pub fn total(&self, doc: &Document) -> Decimal {
        doc.lines()
            .iter()
            .filter_map(|line| line.result.as_ref())
            .filter(|result| !result.is_error())
            .fold(Decimal::ZERO, |acc, result| {
                acc.checked_add(result.value()).unwrap_or(acc)
            })
    }
}

impl Default for DocumentService {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

//! Core calculation engine for CalcPad.
//! This crate is the single source of truth for evaluation semantics.

pub mod engine;
pub mod logging;
pub mod model;
pub mod service;

pub use engine::{detect_category, evaluate, extract_variable_name, EvalContext};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{
    Document, DocumentError, DocumentId, Line, LineCategory, LineId, VariableMap,
};
pub use model::result::{CalcResult, ResultKind};
pub use service::ai_fallback::{AiCalculator, AiRequest, AiResponse};
pub use service::document_service::{DocumentService, EngineSettings, ServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

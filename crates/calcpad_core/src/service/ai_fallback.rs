//! External AI-assisted interpreter contract.
//!
//! # Responsibility
//! - Define the collaborator interface used when local evaluation fails
//!   on a non-trivial input.
//!
//! # Invariants
//! - The collaborator is best-effort: a failed or empty response never
//!   replaces the local error.
//! - The trait is synchronous; dispatching it off-thread, cancelling or
//!   timing it out is the implementing caller's concern.

use rust_decimal::Decimal;

/// One interpretation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiRequest {
    pub input: String,
    pub system_prompt: String,
}

/// Collaborator answer. `value` is meaningful only when `success` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AiResponse {
    pub success: bool,
    pub value: Option<Decimal>,
    pub unit: Option<String>,
}

/// External interpreter invoked as a last resort for failed evaluations.
pub trait AiCalculator {
    fn process(&self, request: &AiRequest) -> AiResponse;
}

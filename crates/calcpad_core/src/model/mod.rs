//! Domain model for calculation sheets.
//!
//! # Responsibility
//! - Define the canonical data structures shared by the engine, services,
//!   and serialization.
//!
//! # Invariants
//! - Every domain object is identified by a stable uuid.
//! - Results are immutable value objects; documents own all mutation.

pub mod document;
pub mod result;

//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine calls over documents.
//! - Keep callers decoupled from engine internals and collaborator
//!   contracts.

pub mod ai_fallback;
pub mod document_service;

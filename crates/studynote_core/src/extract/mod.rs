//! Structured note extraction from free-text generation output.
//!
//! # Responsibility
//! - Normalize formatting noise around JSON payloads (`defence`).
//! - Parse, validate and aggregate note records into a `NoteBatch` (`notes`).
//!
//! # Invariants
//! - Normalization never repairs JSON beyond removing code fences.
//! - A batch containing any invalid record is rejected as a whole.

pub mod defence;
pub mod notes;

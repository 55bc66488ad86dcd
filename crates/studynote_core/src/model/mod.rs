//! Domain model for generated study notes.
//!
//! # Responsibility
//! - Define the validated note record and its persisted batch shape.
//!
//! # Invariants
//! - Notes are only constructed from fully valid input; nothing is coerced.

pub mod note;

//! Local persistence for stage hand-off and stage output.
//!
//! # Responsibility
//! - Store the session id between stages (`session_repo`).
//! - Store validated note batches (`note_batch_repo`).
//!
//! # Invariants
//! - Stages receive persisted state through these traits, never by reading
//!   well-known paths themselves.

pub mod note_batch_repo;
pub mod session_repo;

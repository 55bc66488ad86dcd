//! Interactive question routing.
//!
//! # Responsibility
//! - Decide per question whether the remote run should answer conversationally
//!   or ground its answer in the indexed documents.

pub mod classifier;

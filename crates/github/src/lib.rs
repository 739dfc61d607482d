//! GitHub Actions backend for weft.
//!
//! Turns a validated plan into one matrix workflow: every selected
//! compiler becomes a matrix include entry, every conditional build
//! action becomes a runtime guard over the entry's encoding variables,
//! and the whole file lands under `.github/workflows/`.

#![warn(missing_docs)]

pub mod emitter;
pub mod schema;

pub use emitter::GithubEmitter;

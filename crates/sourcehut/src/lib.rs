//! Sourcehut builds backend for weft.
//!
//! Where the GitHub backend shares one step list across a matrix and
//! guards at runtime, this backend assembles each compiler's task group
//! against a singleton universe, so every decision collapses to emit or
//! omit and the generated manifests carry no conditionals at all.

#![warn(missing_docs)]

pub mod emitter;
pub mod schema;

pub use emitter::SourcehutEmitter;

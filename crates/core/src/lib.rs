//! Core types for weft: compiler identities, the range algebra, and the
//! guarded script machinery shared by every backend.
//!
//! The pipeline runs in one direction. A configuration names a set of
//! [`CompilerId`]s and a handful of feature ranges; [`compile`] turns each
//! range into a [`Decision`] against that set; [`Script`] and
//! [`StepBuilder`] turn decisions into backend-neutral steps. Backends
//! only consume [`BuiltStep`]s, so the conditional logic lives here once.

#![warn(missing_docs)]

pub mod compiler;
pub mod error;
pub mod predicate;
pub mod range;
pub mod script;
pub mod steps;

pub use compiler::{
    CompilerId, CompilerKind, CompilerSet, SetupMethod, encode_version, parse_lenient_version,
};
pub use error::{Error, InvariantError, Result};
pub use predicate::{Decision, GuardExpr, compile};
pub use range::{CompilerRange, VersionOp};
pub use script::Script;
pub use steps::{BuiltStep, StepBuilder, StepKind};

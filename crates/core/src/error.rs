//! Error types for the core building blocks.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors caused by malformed user input (versions, ranges, universes).
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A version string could not be parsed.
    #[error("invalid compiler version '{input}': {reason}")]
    #[diagnostic(
        code(weft::core::invalid_version),
        help("versions have one to three numeric components, like '9', '9.2', or '9.2.8'")
    )]
    InvalidVersion {
        /// The offending input.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A range expression could not be parsed.
    #[error("invalid compiler range '{input}': {reason}")]
    #[diagnostic(
        code(weft::core::invalid_range),
        help(
            "ranges combine 'all', 'none', 'ghc', 'ghcjs', versions, and comparisons with '&&', '||', and parentheses, like '>=8.10 && <9.6'"
        )
    )]
    InvalidRange {
        /// The offending input.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Two distinct compilers of the same kind collapse to one runtime encoding.
    #[error("compilers {first} and {second} share the runtime encoding {encoding}")]
    #[diagnostic(
        code(weft::core::encoding_collision),
        help(
            "patch levels above 99 are clamped in the numeric encoding; pick versions that differ in major or minor"
        )
    )]
    EncodingCollision {
        /// Display name of the first colliding compiler.
        first: String,
        /// Display name of the second colliding compiler.
        second: String,
        /// The shared encoding.
        encoding: u64,
    },
}

/// Internal invariant violations. These are bugs in an assembler, not
/// configuration mistakes, and abort assembly immediately.
#[derive(Error, Debug, Diagnostic)]
pub enum InvariantError {
    /// A version-guarded decision reached a backend action step.
    #[error("step '{name}' references a backend action but carries a runtime version guard")]
    #[diagnostic(
        code(weft::core::guarded_action),
        help("action steps can only be emitted unconditionally or skipped; this is an assembler bug")
    )]
    GuardedAction {
        /// Name of the offending step.
        name: String,
    },

    /// A step was appended without a name.
    #[error("a step was appended with an empty name")]
    #[diagnostic(code(weft::core::empty_step_name))]
    EmptyStepName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_version_message() {
        let err = Error::InvalidVersion {
            input: "9.x".to_string(),
            reason: "component 'x' is not a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid compiler version '9.x': component 'x' is not a number"
        );
    }

    #[test]
    fn invalid_range_message() {
        let err = Error::InvalidRange {
            input: ">= && 9".to_string(),
            reason: "expected a version after '>='".to_string(),
        };
        assert!(err.to_string().contains(">= && 9"));
    }

    #[test]
    fn encoding_collision_message() {
        let err = Error::EncodingCollision {
            first: "ghc-9.9.20260101".to_string(),
            second: "ghc-9.9.20260102".to_string(),
            encoding: 90999,
        };
        assert!(err.to_string().contains("90999"));
    }

    #[test]
    fn diagnostic_codes() {
        let err = Error::InvalidVersion {
            input: String::new(),
            reason: String::new(),
        };
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("weft::core::invalid_version".to_string())
        );

        let err = InvariantError::GuardedAction {
            name: "Checkout".to_string(),
        };
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("weft::core::guarded_action".to_string())
        );
    }

    #[test]
    fn guarded_action_mentions_step() {
        let err = InvariantError::GuardedAction {
            name: "Cache store".to_string(),
        };
        assert!(err.to_string().contains("Cache store"));
    }
}

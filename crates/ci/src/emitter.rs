//! The backend seam.
//!
//! An [`Emitter`] turns a validated [`Plan`] into ready-to-commit files
//! for one CI system. Emitters do no I/O: they return [`OutputFile`]s with
//! repository-relative paths, and the caller decides whether and where to
//! write them. That keeps generation atomic: nothing touches disk until
//! every selected emitter has succeeded.

use std::path::PathBuf;

use thiserror::Error;

use crate::plan::Plan;

pub mod registry;

/// Error types for emitter operations.
#[derive(Debug, Error)]
pub enum EmitError {
    /// YAML serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// No emitter is registered under the requested name.
    #[error("unknown format '{format}'. Available: {available}")]
    UnknownFormat {
        /// The requested format name.
        format: String,
        /// Comma-separated registered formats.
        available: String,
    },

    /// The plan cannot be expressed by this backend.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// An internal invariant broke during assembly. This is a bug in the
    /// generator, not in the configuration.
    #[error(transparent)]
    Invariant(#[from] weft_core::InvariantError),
}

/// Result type for emitter operations.
pub type EmitResult<T> = std::result::Result<T, EmitError>;

/// One generated file, path relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Where the file belongs, e.g. `.github/workflows/servant.yml`.
    pub path: PathBuf,
    /// The full file contents.
    pub contents: String,
}

impl OutputFile {
    /// Create an output file.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Trait for CI definition emitters.
///
/// Implementations map one plan to one backend's file set. Multi-file
/// output is ordinary (the manifest backend writes one file per compiler
/// in parallel mode), so emission returns a list; its order must be
/// deterministic for a given plan.
pub trait Emitter: Send + Sync {
    /// Generate this backend's files from the plan.
    ///
    /// # Errors
    /// Returns `EmitError` if serialization fails or an internal
    /// invariant breaks.
    fn emit(&self, plan: &Plan) -> EmitResult<Vec<OutputFile>>;

    /// Format identifier, used for CLI flag matching (e.g. `github`).
    fn format_name(&self) -> &'static str;

    /// Human-readable description of this emitter.
    fn description(&self) -> &'static str {
        "CI workflow emitter"
    }

    /// Validate the plan before emission.
    ///
    /// Override to reject plans this backend cannot express. The default
    /// accepts everything.
    ///
    /// # Errors
    /// Returns `EmitError` if validation fails.
    fn validate(&self, plan: &Plan) -> EmitResult<()> {
        let _ = plan;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::plan::Plan;

    fn demo_plan() -> Plan {
        let config = Config::from_toml_str(
            r#"
[project]
name = "demo"

[[compiler]]
version = "9.2.8"

[[package]]
name = "demo"
"#,
        )
        .unwrap();
        Plan::from_config(config).unwrap()
    }

    struct TestEmitter;

    impl Emitter for TestEmitter {
        fn emit(&self, plan: &Plan) -> EmitResult<Vec<OutputFile>> {
            Ok(vec![OutputFile::new("ci.yml", format!("# {}", plan.name))])
        }

        fn format_name(&self) -> &'static str {
            "test"
        }
    }

    #[test]
    fn emitter_trait_round_trip() {
        let emitter = TestEmitter;
        let plan = demo_plan();
        let files = emitter.emit(&plan).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, PathBuf::from("ci.yml"));
        assert_eq!(files[0].contents, "# demo");
        assert_eq!(emitter.format_name(), "test");
        assert_eq!(emitter.description(), "CI workflow emitter");
    }

    #[test]
    fn default_validation_accepts() {
        let emitter = TestEmitter;
        assert!(emitter.validate(&demo_plan()).is_ok());
    }

    #[test]
    fn invariant_errors_convert() {
        let err: EmitError = weft_core::InvariantError::EmptyStepName.into();
        assert!(matches!(err, EmitError::Invariant(_)));
    }
}

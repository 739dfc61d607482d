//! Error types for configuration loading and planning.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration and planning operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors a user can fix by editing their configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration at {path}: {source}")]
    #[diagnostic(
        code(weft::ci::read_failed),
        help("Check that the path exists and is readable, or pass --config with the right location")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Path that was being read.
        path: PathBuf,
    },

    /// TOML syntax or shape error.
    #[error("TOML parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(weft::ci::toml_error),
        help("Ensure the TOML has valid syntax and only the documented weft.toml keys")
    )]
    Toml {
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },

    /// The project name is missing or blank.
    #[error("project name is empty")]
    #[diagnostic(
        code(weft::ci::empty_project_name),
        help("Set [project] name to the repository's name; it names generated workflow files")
    )]
    EmptyProjectName,

    /// No compilers were configured.
    #[error("no compilers configured")]
    #[diagnostic(
        code(weft::ci::no_compilers),
        help("Add at least one [[compiler]] entry with a version")
    )]
    NoCompilers,

    /// No packages were configured.
    #[error("no packages configured")]
    #[diagnostic(
        code(weft::ci::no_packages),
        help("Add at least one [[package]] entry with a name")
    )]
    NoPackages,

    /// The same compiler appears twice.
    #[error("compiler '{id}' is listed more than once")]
    #[diagnostic(
        code(weft::ci::duplicate_compiler),
        help("Each [[compiler]] entry must name a distinct kind and version")
    )]
    DuplicateCompiler {
        /// Display form of the duplicated compiler.
        id: String,
    },

    /// The same package name appears twice.
    #[error("package '{name}' is listed more than once")]
    #[diagnostic(
        code(weft::ci::duplicate_package),
        help("Each [[package]] entry must have a distinct name")
    )]
    DuplicatePackage {
        /// The duplicated package name.
        name: String,
    },

    /// The same constraint-set name appears twice.
    #[error("constraint set '{name}' is listed more than once")]
    #[diagnostic(
        code(weft::ci::duplicate_constraint_set),
        help("Each [[constraint-set]] entry must have a distinct name")
    )]
    DuplicateConstraintSet {
        /// The duplicated set name.
        name: String,
    },

    /// A named constraint set's range matches none of the selected
    /// compilers. A feature range doing the same is silently absent, but a
    /// named set that never runs is almost certainly a typo.
    #[error("constraint set '{name}' matches no selected compiler")]
    #[diagnostic(
        code(weft::ci::unused_constraint_set),
        help("Widen the set's 'compilers' range or remove the entry")
    )]
    UnusedConstraintSet {
        /// Name of the set that never applies.
        name: String,
    },

    /// A range string in a named field failed to parse.
    #[error("invalid range in {field}: {source}")]
    #[diagnostic(
        code(weft::ci::invalid_field_range),
        help(
            "Ranges combine versions, 'all', 'none', 'ghc', 'ghcjs' with comparisons, '&&', '||', and parentheses"
        )
    )]
    FieldRange {
        /// Which configuration field held the bad range.
        field: String,
        /// The underlying parse error.
        #[source]
        source: weft_core::Error,
    },

    /// A core validation error (bad version, encoding collision).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] weft_core::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn messages_name_the_offender() {
        let error = ConfigError::DuplicateCompiler {
            id: "ghc-9.2.8".to_string(),
        };
        assert!(error.to_string().contains("ghc-9.2.8"));

        let error = ConfigError::UnusedConstraintSet {
            name: "old-aeson".to_string(),
        };
        assert!(error.to_string().contains("old-aeson"));
    }

    #[test]
    fn field_range_carries_the_field() {
        let source = "club".parse::<weft_core::CompilerRange>().unwrap_err();
        let error = ConfigError::FieldRange {
            field: "features.tests".to_string(),
            source,
        };
        let message = error.to_string();
        assert!(message.contains("features.tests"));
        assert!(message.contains("club"));
    }

    #[test]
    fn toml_error_mentions_the_path() {
        let source = toml::from_str::<toml::Value>("not valid = [").unwrap_err();
        let error = ConfigError::Toml {
            source,
            path: Some(PathBuf::from("/repo/weft.toml")),
        };
        assert!(error.to_string().contains("weft.toml"));
    }

    #[test]
    fn diagnostic_codes_are_registered() {
        assert_eq!(
            ConfigError::NoCompilers.code().map(|c| c.to_string()),
            Some("weft::ci::no_compilers".to_string())
        );
        assert_eq!(
            ConfigError::EmptyProjectName.code().map(|c| c.to_string()),
            Some("weft::ci::empty_project_name".to_string())
        );
        assert!(ConfigError::NoPackages.help().is_some());
    }

    #[test]
    fn core_errors_pass_through_transparently() {
        let source = weft_core::parse_lenient_version("9.x").unwrap_err();
        let error: ConfigError = source.into();
        assert!(error.to_string().contains("9.x"));
        assert_eq!(
            error.code().map(|c| c.to_string()),
            Some("weft::core::invalid_version".to_string())
        );
    }
}

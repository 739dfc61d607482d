//! Command-line surface: argument parsing, error taxonomy, exit codes.
//!
//! Exit codes are part of the interface: 0 for success, [`EXIT_CLI`] for
//! anything the user can fix by editing `weft.toml` or their invocation,
//! [`EXIT_GEN`] for failures inside generation itself.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use thiserror::Error;

use weft_ci::{ConfigError, EmitError};

/// CLI or configuration error exit code.
pub const EXIT_CLI: i32 = 2;
/// Generation failure exit code.
pub const EXIT_GEN: i32 = 3;

/// CLI-level errors with exit code mapping.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Configuration or invocation error (exit code 2).
    #[error("configuration error: {message}")]
    #[diagnostic(code(weft::cli::config))]
    Config {
        /// The error message.
        message: String,
        /// Optional help text.
        #[help]
        help: Option<String>,
    },
    /// Generation failure (exit code 3).
    #[error("generation error: {message}")]
    #[diagnostic(code(weft::cli::generate))]
    Generate {
        /// The error message.
        message: String,
        /// Optional help text.
        #[help]
        help: Option<String>,
    },
    /// Filesystem failure while writing output (exit code 3).
    #[error("I/O error: {message}")]
    #[diagnostic(code(weft::cli::io))]
    Io {
        /// The error message.
        message: String,
        /// Optional help text.
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text.
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a generation error.
    #[must_use]
    pub fn generate(message: impl Into<String>) -> Self {
        Self::Generate {
            message: message.into(),
            help: None,
        }
    }

    /// Create a generation error with help text.
    #[must_use]
    pub fn generate_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Generate {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            help: None,
        }
    }
}

/// Configuration errors carry their own diagnostic help; preserve it.
impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let help = err.help().map(|h| h.to_string());
        Self::Config {
            message: err.to_string(),
            help,
        }
    }
}

impl From<EmitError> for CliError {
    fn from(err: EmitError) -> Self {
        match err {
            EmitError::UnknownFormat { .. } => Self::config_with_help(
                err.to_string(),
                "Run 'weft formats' to list the registered backends",
            ),
            EmitError::InvalidPlan(_) => Self::config(err.to_string()),
            EmitError::Serialization(_) | EmitError::Invariant(_) => Self::generate_with_help(
                err.to_string(),
                "This is a bug in weft, not in your configuration; please report it",
            ),
        }
    }
}

/// Map a CLI error to its exit code.
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Generate { .. } | CliError::Io { .. } => EXIT_GEN,
    }
}

/// Render an error to stderr through miette.
pub fn render_error(err: &CliError) {
    let report = Report::new(err.clone());
    eprintln!("{report:?}");
    // Make sure the report lands before the process exits.
    let _ = io::stderr().flush();
}

/// Logging verbosity for the `--level` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Show all logs.
    Trace,
    /// Show debug and above.
    Debug,
    /// Show info and above.
    Info,
    /// Show warnings and above (default).
    Warn,
    /// Show errors only.
    Error,
}

impl LogLevel {
    /// The `EnvFilter` directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(about = "Generate CI pipelines for Haskell compiler matrices from weft.toml")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate CI definition files from the configuration.
    #[command(about = "Generate CI definition files")]
    Generate {
        /// Path to the configuration file.
        #[arg(
            long,
            short = 'c',
            help = "Path to the configuration file",
            default_value = "weft.toml"
        )]
        config: PathBuf,

        /// Backend to generate, or `all` for every registered backend.
        #[arg(
            long,
            short = 'f',
            help = "Backend to generate ('all' for every registered backend)",
            default_value = "all"
        )]
        format: String,

        /// Directory the generated repository-relative paths are resolved
        /// against.
        #[arg(
            long,
            short = 'o',
            help = "Directory to write generated files into",
            default_value = "."
        )]
        output_dir: PathBuf,
    },
    /// Validate the configuration and report the resolved plan.
    #[command(about = "Validate the configuration without writing files")]
    Check {
        /// Path to the configuration file.
        #[arg(
            long,
            short = 'c',
            help = "Path to the configuration file",
            default_value = "weft.toml"
        )]
        config: PathBuf,
    },
    /// List the registered output formats.
    #[command(about = "List available output formats")]
    Formats {
        /// Emit the format list as JSON.
        #[arg(long, help = "Emit the format list as JSON")]
        json: bool,
    },
}

/// Parse command-line arguments, exiting on `--help`/`--version` or usage
/// errors the way clap does.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

//! `weft.toml` schema types.
//!
//! These are the raw deserialized shapes; ranges and versions stay as
//! strings here and are parsed during planning so every failure can name
//! the field it came from. Unknown keys are rejected.

use serde::Deserialize;
use std::path::Path;

use weft_core::{CompilerKind, SetupMethod};

use crate::error::{ConfigError, Result};

/// Root of a `weft.toml` document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Project identity.
    pub project: ProjectConfig,

    /// Compiler matrix entries (`[[compiler]]`).
    #[serde(default, rename = "compiler")]
    pub compilers: Vec<CompilerConfig>,

    /// Optional feature toggles as range strings.
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Package entries (`[[package]]`).
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageConfig>,

    /// Constraint-set entries (`[[constraint-set]]`).
    #[serde(default, rename = "constraint-set")]
    pub constraint_sets: Vec<ConstraintSetConfig>,

    /// GitHub Actions backend settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Sourcehut backend settings.
    #[serde(default)]
    pub sourcehut: SourcehutConfig,
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|source| ConfigError::Toml { source, path: None })
    }

    /// Read and parse a configuration file, attaching the path to any
    /// failure.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            source,
            path: Some(path.to_path_buf()),
        })
    }
}

/// `[project]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Project name; names the generated workflow files.
    pub name: String,
}

/// One `[[compiler]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CompilerConfig {
    /// Version, lenient (`"9.2"` means 9.2.0).
    pub version: String,

    /// Compiler family.
    #[serde(default)]
    pub kind: CompilerKind,

    /// Installation mechanism on CI workers.
    #[serde(default)]
    pub setup: SetupMethod,

    /// Pre-release head snapshot.
    #[serde(default)]
    pub head: bool,

    /// Whether this compiler's job may fail without failing the run.
    /// Defaults to the `head` flag.
    pub allow_failure: Option<bool>,
}

/// `[features]` table. Every value is a range string; `tests` defaults to
/// `all`, everything else to `none`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FeaturesConfig {
    /// Range of compilers whose jobs run the test suites.
    #[serde(default = "range_all")]
    pub tests: String,

    /// Range of compilers whose jobs build and run benchmarks.
    #[serde(default = "range_none")]
    pub benchmarks: String,

    /// Range of compilers whose jobs build haddock documentation.
    #[serde(default = "range_none")]
    pub haddock: String,

    /// Range of compilers whose jobs run doctest.
    #[serde(default = "range_none")]
    pub doctest: String,

    /// Range of compilers whose jobs run hlint.
    #[serde(default = "range_none")]
    pub hlint: String,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            tests: range_all(),
            benchmarks: range_none(),
            haddock: range_none(),
            doctest: range_none(),
            hlint: range_none(),
        }
    }
}

fn range_all() -> String {
    "all".to_string()
}

fn range_none() -> String {
    "none".to_string()
}

/// One `[[package]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PackageConfig {
    /// Cabal package name.
    pub name: String,

    /// Directory holding the package, relative to the repository root.
    /// Defaults to the root itself.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Range of compilers this package builds with.
    #[serde(default = "range_all")]
    pub compilers: String,

    /// Whether the package exposes a library. Haddock and doctest lines
    /// are skipped for packages without one.
    #[serde(default = "default_true")]
    pub has_library_target: bool,

    /// Whether the package has a test suite. `cabal test` lines are
    /// skipped for packages without one.
    #[serde(default = "default_true")]
    pub has_test_target: bool,
}

fn default_dir() -> String {
    ".".to_string()
}

/// One `[[constraint-set]]` entry: a named re-build of the project under
/// extra cabal constraints.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConstraintSetConfig {
    /// Name of the set, used in step and task names.
    pub name: String,

    /// Range of compilers the set applies to.
    #[serde(default = "range_all")]
    pub compilers: String,

    /// Cabal constraint lines, e.g. `"aeson ==1.5.*"`.
    #[serde(default)]
    pub constraints: Vec<String>,

    /// Also run the test suites under these constraints.
    #[serde(default)]
    pub tests: bool,
}

/// `[github]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GithubConfig {
    /// Runner label for the matrix job.
    #[serde(default = "default_runs_on")]
    pub runs_on: String,

    /// Job timeout. Passed through as data, never enforced here.
    pub timeout_minutes: Option<u64>,

    /// Cache the cabal store between runs.
    #[serde(default = "default_true")]
    pub cache: bool,

    /// Branch filters for push/pull-request triggers. Empty means all
    /// branches.
    #[serde(default)]
    pub branches: Vec<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            runs_on: default_runs_on(),
            timeout_minutes: None,
            cache: true,
            branches: Vec::new(),
        }
    }
}

fn default_runs_on() -> String {
    "ubuntu-latest".to_string()
}

const fn default_true() -> bool {
    true
}

/// `[sourcehut]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SourcehutConfig {
    /// Build image.
    #[serde(default = "default_image")]
    pub image: String,

    /// Manifest layout: one manifest per compiler or one manifest with a
    /// task group per compiler.
    #[serde(default)]
    pub mode: ManifestMode,

    /// Extra distribution packages to install on the image.
    #[serde(default)]
    pub packages: Vec<String>,

    /// Repositories cloned into the build, `https://git.sr.ht/…` form.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Send a failure-notification mail to this address.
    pub email: Option<String>,
}

impl Default for SourcehutConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            mode: ManifestMode::default(),
            packages: Vec::new(),
            sources: Vec::new(),
            email: None,
        }
    }
}

fn default_image() -> String {
    "debian/stable".to_string()
}

/// How the Sourcehut backend lays out its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestMode {
    /// One manifest per compiler under `.builds/`.
    #[default]
    Parallel,
    /// A single `.build.yml` with a task group per compiler.
    Sequential,
}

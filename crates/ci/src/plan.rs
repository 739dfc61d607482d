//! The validated, resolved plan emitters work from.
//!
//! [`Plan::from_config`] is the single place raw configuration turns into
//! checked data: versions and ranges are parsed, duplicates rejected, and
//! every range that must select something is verified against the selected
//! universe. Emitters receive the plan by reference and read nothing else.

use tracing::warn;
use weft_core::{CompilerId, CompilerRange, CompilerSet, SetupMethod, compile};

use crate::config::{Config, GithubConfig, SourcehutConfig};
use crate::error::{ConfigError, Result};

/// One compiler's job: the identity plus per-job metadata that does not
/// participate in range evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPlan {
    /// The compiler this job builds with.
    pub id: CompilerId,
    /// How the worker installs it.
    pub setup: SetupMethod,
    /// Whether the job may fail without failing the run.
    pub allow_failure: bool,
}

/// A package and the range of compilers it builds with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePlan {
    /// Cabal package name.
    pub name: String,
    /// Directory relative to the repository root.
    pub dir: String,
    /// Applicability range.
    pub applies: CompilerRange,
    /// The package exposes a library (haddock/doctest apply).
    pub has_library_target: bool,
    /// The package has a test suite (`cabal test` applies).
    pub has_test_target: bool,
}

/// Feature ranges, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePlan {
    /// Run test suites.
    pub tests: CompilerRange,
    /// Build and run benchmarks.
    pub benchmarks: CompilerRange,
    /// Build haddock documentation.
    pub haddock: CompilerRange,
    /// Run doctest.
    pub doctest: CompilerRange,
    /// Run hlint.
    pub hlint: CompilerRange,
}

/// A named constraint set, resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSetPlan {
    /// Set name, used in step and task names.
    pub name: String,
    /// Applicability range. Guaranteed to match at least one universe
    /// member.
    pub applies: CompilerRange,
    /// Cabal constraint lines.
    pub constraints: Vec<String>,
    /// Also run tests under these constraints.
    pub run_tests: bool,
}

/// Everything an emitter needs, validated.
///
/// `jobs` and `universe` are aligned: `jobs[i].id` is the i-th member of
/// `universe`, both sorted by (kind, version).
#[derive(Debug, Clone)]
pub struct Plan {
    /// Project name.
    pub name: String,
    /// Per-compiler jobs, in universe order.
    pub jobs: Vec<JobPlan>,
    /// The selected compiler universe ranges compile against.
    pub universe: CompilerSet,
    /// Packages, in configuration order.
    pub packages: Vec<PackagePlan>,
    /// Feature ranges.
    pub features: FeaturePlan,
    /// Constraint sets, in configuration order.
    pub constraint_sets: Vec<ConstraintSetPlan>,
    /// GitHub backend settings, passed through.
    pub github: GithubConfig,
    /// Sourcehut backend settings, passed through.
    pub sourcehut: SourcehutConfig,
}

impl Plan {
    /// Validate a configuration into a plan.
    pub fn from_config(config: Config) -> Result<Self> {
        if config.project.name.trim().is_empty() {
            return Err(ConfigError::EmptyProjectName);
        }
        if config.compilers.is_empty() {
            return Err(ConfigError::NoCompilers);
        }
        if config.packages.is_empty() {
            return Err(ConfigError::NoPackages);
        }

        let mut jobs = Vec::with_capacity(config.compilers.len());
        for compiler in &config.compilers {
            let version = weft_core::parse_lenient_version(&compiler.version)?;
            let id = CompilerId::new(compiler.kind, version).with_head(compiler.head);
            jobs.push(JobPlan {
                allow_failure: compiler.allow_failure.unwrap_or(compiler.head),
                setup: compiler.setup,
                id,
            });
        }
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        for pair in jobs.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(ConfigError::DuplicateCompiler {
                    id: pair[0].id.to_string(),
                });
            }
        }
        let universe = CompilerSet::new(jobs.iter().map(|job| job.id.clone()).collect())?;

        let features = FeaturePlan {
            tests: parse_field_range("features.tests", &config.features.tests)?,
            benchmarks: parse_field_range("features.benchmarks", &config.features.benchmarks)?,
            haddock: parse_field_range("features.haddock", &config.features.haddock)?,
            doctest: parse_field_range("features.doctest", &config.features.doctest)?,
            hlint: parse_field_range("features.hlint", &config.features.hlint)?,
        };

        let mut packages = Vec::with_capacity(config.packages.len());
        for package in &config.packages {
            if packages.iter().any(|p: &PackagePlan| p.name == package.name) {
                return Err(ConfigError::DuplicatePackage {
                    name: package.name.clone(),
                });
            }
            let applies = parse_field_range(
                &format!("package '{}'", package.name),
                &package.compilers,
            )?;
            if compile(&applies, &universe).is_never() {
                warn!(
                    package = %package.name,
                    "package applies to no selected compiler"
                );
            }
            packages.push(PackagePlan {
                name: package.name.clone(),
                dir: package.dir.clone(),
                applies,
                has_library_target: package.has_library_target,
                has_test_target: package.has_test_target,
            });
        }

        let mut constraint_sets = Vec::with_capacity(config.constraint_sets.len());
        for set in &config.constraint_sets {
            if constraint_sets
                .iter()
                .any(|s: &ConstraintSetPlan| s.name == set.name)
            {
                return Err(ConfigError::DuplicateConstraintSet {
                    name: set.name.clone(),
                });
            }
            let applies =
                parse_field_range(&format!("constraint set '{}'", set.name), &set.compilers)?;
            if compile(&applies, &universe).is_never() {
                return Err(ConfigError::UnusedConstraintSet {
                    name: set.name.clone(),
                });
            }
            constraint_sets.push(ConstraintSetPlan {
                name: set.name.clone(),
                applies,
                constraints: set.constraints.clone(),
                run_tests: set.tests,
            });
        }

        Ok(Self {
            name: config.project.name,
            jobs,
            universe,
            packages,
            features,
            constraint_sets,
            github: config.github,
            sourcehut: config.sourcehut,
        })
    }

    /// Distinct setup methods in job order. One element means every job
    /// installs the same way; two means the matrix needs both paths.
    #[must_use]
    pub fn setups(&self) -> Vec<SetupMethod> {
        let mut seen = Vec::new();
        for job in &self.jobs {
            if !seen.contains(&job.setup) {
                seen.push(job.setup);
            }
        }
        seen
    }
}

fn parse_field_range(field: &str, input: &str) -> Result<CompilerRange> {
    input.parse().map_err(|source| ConfigError::FieldRange {
        field: field.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::CompilerKind;

    const FULL: &str = r#"
[project]
name = "servant"

[[compiler]]
version = "9.2.8"

[[compiler]]
version = "8.10.7"
setup = "apt"

[[compiler]]
version = "9.9"
head = true

[features]
tests = "all"
haddock = ">=9.0"
hlint = "==9.2.8"

[[package]]
name = "servant-core"
dir = "core"

[[package]]
name = "servant-client"
dir = "client"
compilers = ">=9.0"

[[constraint-set]]
name = "old-aeson"
compilers = ">=9.0"
constraints = ["aeson ==1.5.*"]
tests = true
"#;

    fn plan(toml: &str) -> Result<Plan> {
        Plan::from_config(Config::from_toml_str(toml).unwrap())
    }

    #[test]
    fn jobs_sort_and_align_with_the_universe() {
        let plan = plan(FULL).unwrap();
        assert_eq!(plan.jobs.len(), 3);
        assert_eq!(plan.universe.len(), 3);
        for (job, member) in plan.jobs.iter().zip(&plan.universe) {
            assert_eq!(&job.id, member);
        }
        assert_eq!(plan.jobs[0].id.to_string(), "ghc-8.10.7");
        assert_eq!(plan.jobs[2].id.to_string(), "ghc-9.9.0");
    }

    #[test]
    fn allow_failure_defaults_to_head() {
        let plan = plan(FULL).unwrap();
        assert!(!plan.jobs[0].allow_failure);
        assert!(plan.jobs[2].id.head);
        assert!(plan.jobs[2].allow_failure);
    }

    #[test]
    fn mixed_setups_are_reported_in_job_order() {
        let plan = plan(FULL).unwrap();
        assert_eq!(plan.setups(), [SetupMethod::Apt, SetupMethod::Ghcup]);
    }

    #[test]
    fn features_resolve_to_ranges() {
        let plan = plan(FULL).unwrap();
        let nine = CompilerId::new(
            CompilerKind::Ghc,
            weft_core::parse_lenient_version("9.2.8").unwrap(),
        );
        let eight = CompilerId::new(
            CompilerKind::Ghc,
            weft_core::parse_lenient_version("8.10.7").unwrap(),
        );
        assert!(plan.features.tests.matches(&eight));
        assert!(plan.features.haddock.matches(&nine));
        assert!(!plan.features.haddock.matches(&eight));
        assert!(!plan.features.benchmarks.matches(&nine));
    }

    #[test]
    fn constraint_sets_resolve() {
        let plan = plan(FULL).unwrap();
        assert_eq!(plan.constraint_sets.len(), 1);
        let set = &plan.constraint_sets[0];
        assert_eq!(set.name, "old-aeson");
        assert_eq!(set.constraints, ["aeson ==1.5.*"]);
        assert!(set.run_tests);
    }

    #[test]
    fn package_target_flags_pass_through() {
        let plan = plan(
            r#"
[project]
name = "x"

[[compiler]]
version = "9.2.8"

[[package]]
name = "x-core"

[[package]]
name = "x-bench"
has-library-target = false
has-test-target = false
"#,
        )
        .unwrap();
        assert!(plan.packages[0].has_library_target);
        assert!(plan.packages[0].has_test_target);
        assert!(!plan.packages[1].has_library_target);
        assert!(!plan.packages[1].has_test_target);
    }

    #[test]
    fn missing_compilers_is_an_error() {
        let err = plan("[project]\nname = \"x\"\n[[package]]\nname = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::NoCompilers));
    }

    #[test]
    fn missing_packages_is_an_error() {
        let err = plan("[project]\nname = \"x\"\n[[compiler]]\nversion = \"9.2\"").unwrap_err();
        assert!(matches!(err, ConfigError::NoPackages));
    }

    #[test]
    fn blank_project_name_is_an_error() {
        let err = plan("[project]\nname = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyProjectName));
    }

    #[test]
    fn duplicate_compilers_are_rejected() {
        let err = plan(
            r#"
[project]
name = "x"

[[compiler]]
version = "9.2.8"

[[compiler]]
version = "9.2.8"

[[package]]
name = "x"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCompiler { id } if id == "ghc-9.2.8"));
    }

    #[test]
    fn bad_range_errors_name_the_field() {
        let err = plan(
            r#"
[project]
name = "x"

[[compiler]]
version = "9.2.8"

[features]
hlint = "club"

[[package]]
name = "x"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("features.hlint"));
    }

    #[test]
    fn constraint_set_matching_nothing_is_an_error() {
        let err = plan(
            r#"
[project]
name = "x"

[[compiler]]
version = "9.2.8"

[[package]]
name = "x"

[[constraint-set]]
name = "legacy"
compilers = "<8.0"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnusedConstraintSet { name } if name == "legacy"));
    }

    #[test]
    fn package_matching_nothing_is_allowed() {
        // Warned about, not rejected: an empty range is an off-switch.
        let plan = plan(
            r#"
[project]
name = "x"

[[compiler]]
version = "9.2.8"

[[package]]
name = "x"
compilers = "none"
"#,
        )
        .unwrap();
        assert_eq!(plan.packages.len(), 1);
    }
}

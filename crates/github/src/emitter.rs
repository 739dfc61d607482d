//! GitHub Actions matrix workflow emitter.
//!
//! One workflow file, one `build` job, one matrix include entry per
//! selected compiler. Every entry runs the same step list; work that only
//! applies to some compilers is wrapped in runtime guards over the
//! `HCNUMVER`/`HCJSARITH` variables exported from matrix metadata, and
//! compiler installation is the one place a step keys off the metadata
//! directly (`matrix.setup`).

use std::path::PathBuf;

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::debug;

use weft_ci::{EmitError, EmitResult, Emitter, OutputFile, PackagePlan, Plan};
use weft_core::{
    BuiltStep, Decision, InvariantError, Script, SetupMethod, StepBuilder, StepKind, compile,
};

use crate::schema::{
    Job, Matrix, PullRequestTrigger, PushTrigger, Step, Strategy, Workflow, WorkflowTriggers,
};

const GENERATED_HEADER: &str =
    "# Generated by weft - do not edit manually\n# Regenerate with: weft generate --format github\n\n";

/// Script body installing the matrix entry's compiler through ghcup.
const GHCUP_SETUP: &str = "\
ghcup install ${{ matrix.kind }} ${{ matrix.version }}
ghcup set ${{ matrix.kind }} ${{ matrix.version }}
ghcup install cabal latest
echo \"$HOME/.ghcup/bin\" >> \"$GITHUB_PATH\"";

/// Script body installing the matrix entry's compiler from the hvr PPA.
const APT_SETUP: &str = "\
sudo add-apt-repository -y ppa:hvr/ghc
sudo apt-get update
sudo apt-get install -y ${{ matrix.compiler }} cabal-install
echo \"/opt/${{ matrix.kind }}/${{ matrix.version }}/bin\" >> \"$GITHUB_PATH\"";

/// GitHub Actions workflow emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct GithubEmitter;

impl GithubEmitter {
    /// Create the emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Emitter for GithubEmitter {
    fn emit(&self, plan: &Plan) -> EmitResult<Vec<OutputFile>> {
        debug!(
            project = %plan.name,
            compilers = plan.jobs.len(),
            "assembling github matrix workflow"
        );

        let built = build_steps(plan)?;
        let mixed = plan.setups().len() > 1;
        let steps = built.iter().map(|step| render_step(step, mixed)).collect();

        let job = Job {
            name: Some("${{ matrix.compiler }}".to_string()),
            runs_on: plan.github.runs_on.clone(),
            timeout_minutes: plan.github.timeout_minutes,
            continue_on_error: Some("${{ matrix.allow-failure }}".to_string()),
            strategy: Some(Strategy {
                matrix: Matrix {
                    include: matrix_include(plan),
                },
                fail_fast: Some(false),
            }),
            steps,
        };

        let mut jobs = IndexMap::new();
        jobs.insert("build".to_string(), job);

        let workflow = Workflow {
            name: plan.name.clone(),
            on: WorkflowTriggers {
                push: Some(PushTrigger {
                    branches: plan.github.branches.clone(),
                }),
                pull_request: Some(PullRequestTrigger {
                    branches: plan.github.branches.clone(),
                }),
            },
            jobs,
        };

        let yaml = serialize_workflow(&workflow)?;
        let path = PathBuf::from(format!(
            ".github/workflows/{}.yml",
            sanitize_filename(&plan.name)
        ));
        Ok(vec![OutputFile::new(path, yaml)])
    }

    fn format_name(&self) -> &'static str {
        "github"
    }

    fn description(&self) -> &'static str {
        "GitHub Actions matrix workflow"
    }

    fn validate(&self, plan: &Plan) -> EmitResult<()> {
        if sanitize_filename(&plan.name).is_empty() {
            return Err(EmitError::InvalidPlan(format!(
                "project name '{}' leaves no usable workflow filename",
                plan.name
            )));
        }
        Ok(())
    }
}

/// One include entry per compiler, in universe order. The entry carries
/// everything a run needs: the display id doubles as the compiler
/// executable name, `hcnum`/`jsarith` feed the runtime guards.
fn matrix_include(plan: &Plan) -> Vec<IndexMap<String, Value>> {
    plan.jobs
        .iter()
        .map(|job| {
            let mut entry = IndexMap::new();
            entry.insert("compiler".to_string(), Value::String(job.id.to_string()));
            entry.insert(
                "kind".to_string(),
                Value::String(job.id.kind.as_str().to_string()),
            );
            entry.insert(
                "version".to_string(),
                Value::String(job.id.version.to_string()),
            );
            entry.insert(
                "setup".to_string(),
                Value::String(job.setup.as_str().to_string()),
            );
            entry.insert("hcnum".to_string(), Value::Number(job.id.num_ver().into()));
            entry.insert(
                "jsarith".to_string(),
                Value::Number(job.id.kind.arith_flag().into()),
            );
            entry.insert("allow-failure".to_string(), Value::Bool(job.allow_failure));
            entry
        })
        .collect()
}

/// Assemble the shared step list against the full universe.
fn build_steps(plan: &Plan) -> Result<Vec<BuiltStep>, InvariantError> {
    let universe = &plan.universe;
    let mut builder = StepBuilder::new();

    builder.shell(
        "Set compiler environment",
        &Decision::Always,
        "echo \"HC=${{ matrix.compiler }}\" >> \"$GITHUB_ENV\"\n\
         echo \"HCNUMVER=${{ matrix.hcnum }}\" >> \"$GITHUB_ENV\"\n\
         echo \"HCJSARITH=${{ matrix.jsarith }}\" >> \"$GITHUB_ENV\"",
    )?;

    for setup in plan.setups() {
        match setup {
            SetupMethod::Ghcup => {
                builder.shell_for_setup("Install compiler (ghcup)", setup, GHCUP_SETUP)?;
            }
            SetupMethod::Apt => {
                builder.shell_for_setup("Install compiler (apt)", setup, APT_SETUP)?;
            }
        }
    }

    builder.action("Checkout", &Decision::Always, "actions/checkout@v4", &[])?;

    let cache = if plan.github.cache {
        Decision::Always
    } else {
        Decision::Never
    };
    builder.action(
        "Cache cabal store",
        &cache,
        "actions/cache@v4",
        &[
            ("key", "${{ runner.os }}-${{ matrix.compiler }}-${{ github.sha }}"),
            ("restore-keys", "${{ runner.os }}-${{ matrix.compiler }}-"),
            ("path", "~/.cabal/store"),
        ],
    )?;

    builder.shell(
        "Versions",
        &Decision::Always,
        "$HC --version\ncabal --version",
    )?;
    builder.shell("Update package index", &Decision::Always, "cabal update")?;

    let doctest = compile(&plan.features.doctest, universe);
    let hlint = compile(&plan.features.hlint, universe);

    let mut tools = Script::new();
    tools.emit(
        &doctest,
        "cabal install -j2 doctest --overwrite-policy=always",
    );
    tools.emit(&hlint, "cabal install -j2 hlint --overwrite-policy=always");
    builder.shell("Install build tools", &Decision::Always, &tools.text())?;

    let mut build = Script::new();
    for package in &plan.packages {
        let applies = compile(&package.applies, universe);
        build.emit(&applies, &format!("cabal build {}", package.name));
    }
    builder.shell("Build", &Decision::Always, &build.text())?;

    let tests = compile(&plan.features.tests, universe);
    builder.shell(
        "Run tests",
        &tests,
        &per_package_script(
            plan,
            |p| p.has_test_target,
            |p| format!("cabal test {}", p.name),
        ),
    )?;

    let benchmarks = compile(&plan.features.benchmarks, universe);
    builder.shell(
        "Run benchmarks",
        &benchmarks,
        &per_package_script(plan, |_| true, |p| format!("cabal bench {}", p.name)),
    )?;

    let haddock = compile(&plan.features.haddock, universe);
    builder.shell(
        "Haddock",
        &haddock,
        &per_package_script(
            plan,
            |p| p.has_library_target,
            |p| format!("cabal haddock {}", p.name),
        ),
    )?;

    builder.shell(
        "Doctest",
        &doctest,
        &per_package_script(
            plan,
            |p| p.has_library_target,
            |p| format!("(cd {} && doctest src)", p.dir),
        ),
    )?;

    let mut lint = Script::new();
    for package in &plan.packages {
        lint.line(format!("hlint {}", package.dir));
    }
    builder.shell("HLint", &hlint, &lint.text())?;

    for set in &plan.constraint_sets {
        let applies = compile(&set.applies, universe);
        let flags: String = set
            .constraints
            .iter()
            .map(|c| format!(" --constraint='{c}'"))
            .collect();
        let mut body = Script::new();
        body.line(format!("cabal build all{flags}"));
        if set.run_tests {
            body.line(format!("cabal test all{flags}"));
        }
        builder.shell(&format!("Constraint set {}", set.name), &applies, &body.text())?;
    }

    Ok(builder.finish())
}

/// Per-package lines, each wrapped by that package's applicability
/// decision. The caller wraps the whole result in the feature decision,
/// so guards nest. Packages the filter rejects (no library, no test
/// suite) contribute no line at all.
fn per_package_script(
    plan: &Plan,
    include: impl Fn(&PackagePlan) -> bool,
    line: impl Fn(&PackagePlan) -> String,
) -> String {
    let mut script = Script::new();
    for package in plan.packages.iter().filter(|p| include(p)) {
        let applies = compile(&package.applies, &plan.universe);
        script.emit(&applies, &line(package));
    }
    script.text()
}

/// Turn a built step into its schema form. Setup-tagged steps become
/// `if: matrix.setup == '…'` conditions, but only when the universe
/// actually mixes setup methods.
fn render_step(built: &BuiltStep, mixed_setups: bool) -> Step {
    let mut step = match &built.kind {
        StepKind::Shell { script } => Step::run(script.clone()),
        StepKind::Action { uses, inputs } => {
            let mut step = Step::uses(uses.clone());
            for (key, value) in inputs {
                step = step.with_input(key.clone(), value.clone());
            }
            step
        }
    };
    step = step.with_name(built.name.clone());
    if let Some(setup) = built.setup
        && mixed_setups
    {
        step = step.with_if(format!("matrix.setup == '{setup}'"));
    }
    step
}

/// Serialize a workflow to YAML with the generated-file header.
fn serialize_workflow(workflow: &Workflow) -> EmitResult<String> {
    let yaml =
        serde_yaml::to_string(workflow).map_err(|e| EmitError::Serialization(e.to_string()))?;
    Ok(format!("{GENERATED_HEADER}{yaml}"))
}

/// Sanitize a project name for use as a workflow filename.
fn sanitize_filename(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

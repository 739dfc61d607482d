//! Sourcehut build manifest emitter.
//!
//! Each compiler's task group is assembled against the singleton universe
//! holding just that compiler, so the predicate compiler collapses every
//! range to emit-or-omit and no generated script ever branches. Parallel
//! mode writes one manifest per compiler under `.builds/`; sequential
//! mode writes a single `.build.yml` whose task names carry a sanitized
//! compiler prefix. The task scripts themselves are identical in both
//! modes.

use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::{debug, warn};

use weft_ci::{
    EmitError, EmitResult, Emitter, JobPlan, ManifestMode, OutputFile, PackagePlan, Plan,
};
use weft_core::{
    CompilerSet, Decision, InvariantError, Script, SetupMethod, StepBuilder, StepKind, compile,
};

use crate::schema::{Manifest, Task, Trigger};

const GENERATED_HEADER: &str =
    "# Generated by weft - do not edit manually\n# Regenerate with: weft generate --format sourcehut\n\n";

/// Sourcehut build manifest emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourcehutEmitter;

impl SourcehutEmitter {
    /// Create the emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Emitter for SourcehutEmitter {
    fn emit(&self, plan: &Plan) -> EmitResult<Vec<OutputFile>> {
        debug!(
            project = %plan.name,
            compilers = plan.jobs.len(),
            mode = ?plan.sourcehut.mode,
            "assembling sourcehut manifests"
        );
        if plan.sourcehut.sources.is_empty() {
            warn!("no sourcehut sources configured; manifests will have nothing to clone");
        }

        match plan.sourcehut.mode {
            ManifestMode::Parallel => {
                let mut files = Vec::with_capacity(plan.jobs.len());
                for job in &plan.jobs {
                    let tasks = member_tasks(plan, job)?
                        .into_iter()
                        .map(|(name, script)| Task::new(sanitize_task_name(&name), script))
                        .collect();
                    let manifest = manifest_for(plan, tasks);
                    let path = PathBuf::from(format!(".builds/{}.yml", job.id));
                    files.push(OutputFile::new(path, serialize_manifest(&manifest)?));
                }
                Ok(files)
            }
            ManifestMode::Sequential => {
                let mut tasks = Vec::new();
                for job in &plan.jobs {
                    for (name, script) in member_tasks(plan, job)? {
                        let full = sanitize_task_name(&format!("{}-{name}", job.id));
                        tasks.push(Task::new(full, script));
                    }
                }
                let manifest = manifest_for(plan, tasks);
                Ok(vec![OutputFile::new(
                    PathBuf::from(".build.yml"),
                    serialize_manifest(&manifest)?,
                )])
            }
        }
    }

    fn format_name(&self) -> &'static str {
        "sourcehut"
    }

    fn description(&self) -> &'static str {
        "Sourcehut build manifests"
    }
}

/// One compiler's tasks, in order, as `(name, script)` pairs. Names are
/// sanitized (and prefixed, in sequential mode) by the caller.
fn member_tasks(plan: &Plan, job: &JobPlan) -> Result<Vec<(String, String)>, InvariantError> {
    let universe = CompilerSet::singleton(job.id.clone());
    let checkout = checkout_dir(plan);
    let mut builder = StepBuilder::new();

    builder.shell("setup", &Decision::Always, &setup_script(job))?;
    builder.shell(
        "versions",
        &Decision::Always,
        &format!("{} --version\ncabal --version", job.id),
    )?;
    builder.shell("update", &Decision::Always, "cabal update")?;

    let mut build = Script::new();
    for package in &plan.packages {
        let applies = compile(&package.applies, &universe);
        build.emit(&applies, &format!("cabal build {}", package.name));
    }
    builder.shell(
        "build",
        &Decision::Always,
        &in_checkout(checkout.as_deref(), &build.text()),
    )?;

    let tests = compile(&plan.features.tests, &universe);
    builder.shell(
        "tests",
        &tests,
        &in_checkout(
            checkout.as_deref(),
            &per_package(
                plan,
                &universe,
                |p| p.has_test_target,
                |p| format!("cabal test {}", p.name),
            ),
        ),
    )?;

    let benchmarks = compile(&plan.features.benchmarks, &universe);
    builder.shell(
        "benchmarks",
        &benchmarks,
        &in_checkout(
            checkout.as_deref(),
            &per_package(plan, &universe, |_| true, |p| {
                format!("cabal bench {}", p.name)
            }),
        ),
    )?;

    let haddock = compile(&plan.features.haddock, &universe);
    builder.shell(
        "haddock",
        &haddock,
        &in_checkout(
            checkout.as_deref(),
            &per_package(
                plan,
                &universe,
                |p| p.has_library_target,
                |p| format!("cabal haddock {}", p.name),
            ),
        ),
    )?;

    let doctest = compile(&plan.features.doctest, &universe);
    let doctest_lines = per_package(
        plan,
        &universe,
        |p| p.has_library_target,
        |p| format!("(cd {} && doctest src)", p.dir),
    );
    let doctest_body = if doctest_lines.is_empty() {
        String::new()
    } else {
        format!(
            "cabal install -j2 doctest --overwrite-policy=always\n{}",
            in_checkout(checkout.as_deref(), &doctest_lines)
        )
    };
    builder.shell("doctest", &doctest, &doctest_body)?;

    let hlint = compile(&plan.features.hlint, &universe);
    let mut lint = Script::new();
    for package in &plan.packages {
        lint.line(format!("hlint {}", package.dir));
    }
    let hlint_body = format!(
        "cabal install -j2 hlint --overwrite-policy=always\n{}",
        in_checkout(checkout.as_deref(), &lint.text())
    );
    builder.shell("hlint", &hlint, &hlint_body)?;

    for set in &plan.constraint_sets {
        let applies = compile(&set.applies, &universe);
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
        builder.shell(
            &format!("constraints-{}", set.name),
            &applies,
            &in_checkout(checkout.as_deref(), &body.text()),
        )?;
    }

    Ok(builder
        .finish()
        .into_iter()
        .map(|step| match step.kind {
            StepKind::Shell { script } => (step.name, script),
            // The manifest assembler only appends shell steps.
            StepKind::Action { uses, .. } => (step.name, uses),
        })
        .collect())
}

/// Per-package lines under an Always/Never package decision. Against the
/// singleton universe no line can come out guarded. Packages the filter
/// rejects contribute no line.
fn per_package(
    plan: &Plan,
    universe: &CompilerSet,
    include: impl Fn(&PackagePlan) -> bool,
    line: impl Fn(&PackagePlan) -> String,
) -> String {
    let mut script = Script::new();
    for package in plan.packages.iter().filter(|p| include(p)) {
        let applies = compile(&package.applies, universe);
        script.emit(&applies, &line(package));
    }
    script.text()
}

/// The concrete installation script for one compiler. Exports PATH via
/// `~/.buildenv` so later tasks see the toolchain.
fn setup_script(job: &JobPlan) -> String {
    let kind = job.id.kind.as_str();
    let version = &job.id.version;
    match job.setup {
        SetupMethod::Ghcup => format!(
            "curl --proto '=https' --tlsv1.2 -sSf https://get-ghcup.haskell.org | BOOTSTRAP_HASKELL_NONINTERACTIVE=1 sh\n\
             export PATH=\"$HOME/.ghcup/bin:$PATH\"\n\
             ghcup install {kind} {version}\n\
             ghcup set {kind} {version}\n\
             ghcup install cabal latest\n\
             echo 'PATH=\"$HOME/.ghcup/bin:$PATH\"' >> ~/.buildenv"
        ),
        SetupMethod::Apt => format!(
            "sudo add-apt-repository -y ppa:hvr/ghc\n\
             sudo apt-get update\n\
             sudo apt-get install -y {id} cabal-install\n\
             echo 'PATH=\"/opt/{kind}/{version}/bin:$PATH\"' >> ~/.buildenv",
            id = job.id,
        ),
    }
}

/// Directory the first source clones into, if any. Tasks that touch the
/// project `cd` here first; build.sr.ht starts every task in `$HOME`.
fn checkout_dir(plan: &Plan) -> Option<String> {
    let source = plan.sourcehut.sources.first()?;
    let name = source
        .trim_end_matches('/')
        .rsplit('/')
        .next()?
        .trim_end_matches(".git");
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

fn in_checkout(dir: Option<&str>, body: &str) -> String {
    match dir {
        Some(dir) if !body.trim().is_empty() => format!("cd {dir}\n{body}"),
        _ => body.to_string(),
    }
}

fn manifest_for(plan: &Plan, tasks: Vec<Task>) -> Manifest {
    Manifest {
        image: plan.sourcehut.image.clone(),
        packages: plan.sourcehut.packages.clone(),
        sources: plan.sourcehut.sources.clone(),
        environment: IndexMap::new(),
        tasks,
        triggers: plan
            .sourcehut
            .email
            .as_ref()
            .map(|to| vec![Trigger::email_on_failure(to)])
            .unwrap_or_default(),
    }
}

fn serialize_manifest(manifest: &Manifest) -> EmitResult<String> {
    let yaml =
        serde_yaml::to_string(manifest).map_err(|e| EmitError::Serialization(e.to_string()))?;
    Ok(format!("{GENERATED_HEADER}{yaml}"))
}

/// Restrict a task name to the `[a-z0-9_-]` alphabet build.sr.ht accepts.
fn sanitize_task_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

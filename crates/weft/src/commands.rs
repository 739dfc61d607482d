//! Command implementations.
//!
//! `generate` is atomic: every selected backend validates and emits
//! before anything is written, so a failing backend leaves the output
//! directory untouched. `check` runs the same validation and stops short
//! of emission; `formats` lists what the binary was built with.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use weft_ci::{Config, EmitterRegistry, EmitterRegistryBuilder, OutputFile, Plan};
use weft_core::{Decision, compile};
use weft_github::GithubEmitter;
use weft_sourcehut::SourcehutEmitter;

use crate::cli::{Cli, CliError, Commands};

/// Every backend this binary ships.
fn registry() -> EmitterRegistry {
    EmitterRegistryBuilder::new()
        .with_emitter(GithubEmitter::new())
        .with_emitter(SourcehutEmitter::new())
        .build()
}

/// Dispatch a parsed command line.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Generate {
            config,
            format,
            output_dir,
        } => generate(config, format, output_dir),
        Commands::Check { config } => check(config),
        Commands::Formats { json } => formats(*json),
    }
}

fn load_plan(path: &Path) -> Result<Plan, CliError> {
    let config = Config::load(path)?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(Plan::from_config(config)?)
}

fn generate(config: &Path, format: &str, output_dir: &Path) -> Result<(), CliError> {
    let plan = load_plan(config)?;
    let registry = registry();

    let mut files: Vec<OutputFile> = Vec::new();
    if format == "all" {
        for name in registry.formats() {
            files.extend(registry.emit(name, &plan)?);
        }
    } else {
        files = registry.emit(format, &plan)?;
    }

    for file in &files {
        let target = output_dir.join(&file.path);
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                CliError::io(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&target, &file.contents)
            .map_err(|e| CliError::io(format!("failed to write {}: {e}", target.display())))?;
        println!("wrote {}", target.display());
    }
    info!(files = files.len(), format, "generation complete");
    Ok(())
}

fn check(config: &Path) -> Result<(), CliError> {
    let plan = load_plan(config)?;

    println!("configuration OK: project '{}'", plan.name);
    let compilers: Vec<String> = plan.jobs.iter().map(|job| job.id.to_string()).collect();
    println!("  compilers: {}", compilers.join(", "));
    let packages: Vec<&str> = plan.packages.iter().map(|p| p.name.as_str()).collect();
    println!("  packages: {}", packages.join(", "));
    for (name, range) in [
        ("tests", &plan.features.tests),
        ("benchmarks", &plan.features.benchmarks),
        ("haddock", &plan.features.haddock),
        ("doctest", &plan.features.doctest),
        ("hlint", &plan.features.hlint),
    ] {
        match compile(range, &plan.universe) {
            Decision::Always => println!("  {name}: every compiler"),
            Decision::Never => {}
            Decision::Guarded(guard) => println!("  {name}: where {}", guard.render()),
        }
    }
    for set in &plan.constraint_sets {
        println!("  constraint set '{}': {} constraints", set.name, set.constraints.len());
    }
    Ok(())
}

fn formats(json: bool) -> Result<(), CliError> {
    let infos = registry().info();
    if json {
        let text = serde_json::to_string_pretty(&infos)
            .map_err(|e| CliError::generate(format!("failed to encode format list: {e}")))?;
        println!("{text}");
    } else {
        for info in infos {
            println!("{:<12} {}", info.format, info.description);
        }
    }
    Ok(())
}

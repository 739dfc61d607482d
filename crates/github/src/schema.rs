//! GitHub Actions workflow schema types.
//!
//! The subset of the workflow syntax the matrix backend emits, modeled as
//! serde `Serialize` types. Field order in the structs is the order the
//! YAML comes out in; `IndexMap` keeps jobs and action inputs in insertion
//! order.
//! See: <https://docs.github.com/en/actions/using-workflows/workflow-syntax-for-github-actions>

use indexmap::IndexMap;
use serde::Serialize;

/// A GitHub Actions workflow definition, ready to serialize into
/// `.github/workflows/`.
#[derive(Debug, Clone, Serialize)]
pub struct Workflow {
    /// Workflow name displayed in the GitHub UI.
    pub name: String,

    /// Trigger configuration.
    #[serde(rename = "on")]
    pub on: WorkflowTriggers,

    /// Job definitions, order preserved.
    pub jobs: IndexMap<String, Job>,
}

/// When the workflow runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowTriggers {
    /// Trigger on push events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<PushTrigger>,

    /// Trigger on pull request events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestTrigger>,
}

/// Push event trigger. An empty branch list means every branch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PushTrigger {
    /// Branch patterns to trigger on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
}

/// Pull request event trigger. An empty branch list means every target
/// branch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PullRequestTrigger {
    /// Target branch patterns to trigger on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
}

/// A job in a GitHub Actions workflow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    /// Job display name. Matrix jobs use an expression here so each run
    /// shows up under its compiler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Runner label.
    pub runs_on: String,

    /// Job timeout in minutes. Passed through from configuration as data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u64>,

    /// Continue the workflow when this job fails. Holds an expression
    /// (`${{ matrix.allow-failure }}`) so the decision is per matrix
    /// entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<String>,

    /// Matrix strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,

    /// Steps, executed sequentially.
    pub steps: Vec<Step>,
}

/// Job matrix strategy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Strategy {
    /// The matrix itself.
    pub matrix: Matrix,

    /// Whether one failing entry cancels the rest. The matrix backend
    /// always sets this to `false`; allow-failure is the per-entry knob.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,
}

/// A job matrix given as explicit include entries, one per compiler.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Matrix {
    /// Matrix entries, in universe order. Each entry is an open map so
    /// backends control exactly which keys a run sees.
    pub include: Vec<IndexMap<String, serde_yaml::Value>>,
}

/// A step in a job. Either `uses` an action or `run`s a script.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    /// Step display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Conditional execution expression.
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_condition: Option<String>,

    /// Action to use (e.g. `actions/checkout@v4`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    /// Shell script to run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    /// Action inputs (for `uses` steps), in insertion order.
    #[serde(rename = "with", skip_serializing_if = "IndexMap::is_empty")]
    pub with_inputs: IndexMap<String, serde_yaml::Value>,

    /// Step environment variables.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
}

impl Step {
    /// Create a step that uses an action.
    pub fn uses(action: impl Into<String>) -> Self {
        Self {
            uses: Some(action.into()),
            ..Default::default()
        }
    }

    /// Create a step that runs a shell script.
    pub fn run(script: impl Into<String>) -> Self {
        Self {
            run: Some(script.into()),
            ..Default::default()
        }
    }

    /// Set the step name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add an action input.
    #[must_use]
    pub fn with_input(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_yaml::Value>,
    ) -> Self {
        self.with_inputs.insert(key.into(), value.into());
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set a condition.
    #[must_use]
    pub fn with_if(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_builders_compose() {
        let step = Step::uses("actions/cache@v4")
            .with_name("Cache")
            .with_input("key", "store-${{ matrix.compiler }}")
            .with_input("path", "~/.cabal/store")
            .with_if("matrix.setup == 'ghcup'");

        assert_eq!(step.name.as_deref(), Some("Cache"));
        assert_eq!(step.uses.as_deref(), Some("actions/cache@v4"));
        assert_eq!(step.if_condition.as_deref(), Some("matrix.setup == 'ghcup'"));
        let keys: Vec<_> = step.with_inputs.keys().cloned().collect();
        assert_eq!(keys, ["key", "path"]);
    }

    #[test]
    fn workflow_serializes_with_on_and_branches() {
        let workflow = Workflow {
            name: "servant".to_string(),
            on: WorkflowTriggers {
                push: Some(PushTrigger {
                    branches: vec!["master".to_string()],
                }),
                pull_request: Some(PullRequestTrigger::default()),
            },
            jobs: IndexMap::new(),
        };

        let yaml = serde_yaml::to_string(&workflow).unwrap();
        assert!(yaml.contains("name: servant"));
        assert!(yaml.contains("on:"));
        assert!(yaml.contains("push:"));
        assert!(yaml.contains("- master"));
        assert!(yaml.contains("pull_request:"));
    }

    #[test]
    fn strategy_serializes_kebab_case() {
        let mut entry = IndexMap::new();
        entry.insert(
            "compiler".to_string(),
            serde_yaml::Value::String("ghc-9.2.8".to_string()),
        );
        let strategy = Strategy {
            matrix: Matrix {
                include: vec![entry],
            },
            fail_fast: Some(false),
        };

        let yaml = serde_yaml::to_string(&strategy).unwrap();
        assert!(yaml.contains("fail-fast: false"));
        assert!(yaml.contains("include:"));
        assert!(yaml.contains("compiler: ghc-9.2.8"));
    }

    #[test]
    fn job_continue_on_error_holds_an_expression() {
        let job = Job {
            name: Some("${{ matrix.compiler }}".to_string()),
            runs_on: "ubuntu-latest".to_string(),
            timeout_minutes: Some(60),
            continue_on_error: Some("${{ matrix.allow-failure }}".to_string()),
            strategy: None,
            steps: vec![Step::run("true")],
        };

        let yaml = serde_yaml::to_string(&job).unwrap();
        assert!(yaml.contains("runs-on: ubuntu-latest"));
        assert!(yaml.contains("timeout-minutes: 60"));
        assert!(yaml.contains("continue-on-error: ${{ matrix.allow-failure }}"));
    }

    #[test]
    fn empty_step_maps_are_pruned() {
        let yaml = serde_yaml::to_string(&Step::run("cabal update").with_name("Update")).unwrap();
        assert!(!yaml.contains("with:"));
        assert!(!yaml.contains("env:"));
        assert!(!yaml.contains("if:"));
    }
}

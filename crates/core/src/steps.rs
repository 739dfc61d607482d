//! Ordered, append-only construction of backend-neutral job steps.
//!
//! Backends turn [`BuiltStep`]s into whatever their schema calls a step.
//! Appends are fallible and the assemblers stop at the first error, so a
//! job is either built whole or not at all.

use crate::compiler::SetupMethod;
use crate::error::InvariantError;
use crate::predicate::Decision;
use crate::script::Script;

/// One finished step of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltStep {
    /// Human-readable step name.
    pub name: String,
    /// When set, the step applies only to jobs using this setup method.
    pub setup: Option<SetupMethod>,
    /// What the step runs.
    pub kind: StepKind,
}

/// The payload of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// A shell script, possibly containing runtime conditionals.
    Shell {
        /// The script text.
        script: String,
    },
    /// A reusable action invocation, resolved at generation time.
    Action {
        /// Action reference, e.g. `actions/checkout@v4`.
        uses: String,
        /// Input key-value pairs, in insertion order.
        inputs: Vec<(String, String)>,
    },
}

/// Accumulates steps in order. Steps are only ever appended; nothing
/// reorders or removes them afterwards.
#[derive(Debug, Clone, Default)]
pub struct StepBuilder {
    steps: Vec<BuiltStep>,
}

impl StepBuilder {
    /// Start with no steps.
    #[must_use]
    pub const fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a shell step under a decision. The body runs verbatim for
    /// [`Decision::Always`], inside a runtime conditional for
    /// [`Decision::Guarded`], and the step is skipped entirely for
    /// [`Decision::Never`] or when the script comes out empty.
    pub fn shell(
        &mut self,
        name: &str,
        decision: &Decision,
        body: &str,
    ) -> Result<(), InvariantError> {
        self.check_name(name)?;
        let mut script = Script::new();
        script.emit(decision, body);
        if script.is_empty() {
            return Ok(());
        }
        self.steps.push(BuiltStep {
            name: name.to_string(),
            setup: None,
            kind: StepKind::Shell {
                script: script.text(),
            },
        });
        Ok(())
    }

    /// Append a shell step with a then-branch and an else-branch, picked
    /// or dispatched at runtime by the decision.
    pub fn shell_either(
        &mut self,
        name: &str,
        decision: &Decision,
        then_body: &str,
        else_body: &str,
    ) -> Result<(), InvariantError> {
        self.check_name(name)?;
        let mut script = Script::new();
        script.emit_either(decision, then_body, else_body);
        if script.is_empty() {
            return Ok(());
        }
        self.steps.push(BuiltStep {
            name: name.to_string(),
            setup: None,
            kind: StepKind::Shell {
                script: script.text(),
            },
        });
        Ok(())
    }

    /// Append an unconditional shell step that applies only to jobs using
    /// the given setup method. Backends decide how to express the
    /// restriction; the core only records it.
    pub fn shell_for_setup(
        &mut self,
        name: &str,
        setup: SetupMethod,
        body: &str,
    ) -> Result<(), InvariantError> {
        self.check_name(name)?;
        if body.trim().is_empty() {
            return Ok(());
        }
        self.steps.push(BuiltStep {
            name: name.to_string(),
            setup: Some(setup),
            kind: StepKind::Shell {
                script: body.to_string(),
            },
        });
        Ok(())
    }

    /// Append an action step. Actions resolve at generation time, so a
    /// [`Decision::Guarded`] here is an internal error: nothing at runtime
    /// could make the action conditional.
    pub fn action(
        &mut self,
        name: &str,
        decision: &Decision,
        uses: &str,
        inputs: &[(&str, &str)],
    ) -> Result<(), InvariantError> {
        self.check_name(name)?;
        match decision {
            Decision::Never => Ok(()),
            Decision::Always => {
                self.steps.push(BuiltStep {
                    name: name.to_string(),
                    setup: None,
                    kind: StepKind::Action {
                        uses: uses.to_string(),
                        inputs: inputs
                            .iter()
                            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                            .collect(),
                    },
                });
                Ok(())
            }
            Decision::Guarded(_) => Err(InvariantError::GuardedAction {
                name: name.to_string(),
            }),
        }
    }

    /// Finish building and hand the steps over, in append order.
    #[must_use]
    pub fn finish(self) -> Vec<BuiltStep> {
        self.steps
    }

    /// Number of steps appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn check_name(&self, name: &str) -> Result<(), InvariantError> {
        if name.trim().is_empty() {
            return Err(InvariantError::EmptyStepName);
        }
        Ok(())
    }
}

//! Shell fragment assembly driven by [`Decision`]s.
//!
//! Guarded fragments are wrapped in `if [ $((…)) -ne 0 ]` blocks so the
//! generated workflow tests the runtime encoding variables, never the
//! generator's idea of them. Fragments that decide to [`Decision::Never`]
//! leave no trace, not even an empty conditional.

use crate::predicate::Decision;

/// An ordered sequence of shell lines under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    lines: Vec<String>,
}

impl Script {
    /// Start an empty script.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Append one unconditional line.
    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append a fragment under a decision. [`Decision::Always`] appends the
    /// body verbatim, [`Decision::Never`] appends nothing, and
    /// [`Decision::Guarded`] wraps the body in a runtime conditional. A
    /// body that is empty after trimming appends nothing either way, so no
    /// dangling `if`/`fi` pair can appear.
    pub fn emit(&mut self, decision: &Decision, body: &str) {
        if body.trim().is_empty() {
            return;
        }
        match decision {
            Decision::Always => {
                for line in body.lines() {
                    self.lines.push(line.to_string());
                }
            }
            Decision::Never => {}
            Decision::Guarded(guard) => {
                self.lines
                    .push(format!("if [ $(({})) -ne 0 ] ; then", guard.render()));
                for line in body.lines() {
                    self.lines.push(format!("  {line}"));
                }
                self.lines.push("fi".to_string());
            }
        }
    }

    /// Append one of two fragments depending on the decision: the first
    /// where it holds, the second where it does not. When one branch is
    /// empty this degrades to a plain [`Self::emit`] of the other (negated
    /// for the else branch); it never drops both non-empty branches.
    pub fn emit_either(&mut self, decision: &Decision, then_body: &str, else_body: &str) {
        let then_empty = then_body.trim().is_empty();
        let else_empty = else_body.trim().is_empty();
        match decision {
            Decision::Always => self.emit(&Decision::Always, then_body),
            Decision::Never => self.emit(&Decision::Always, else_body),
            Decision::Guarded(guard) => {
                if then_empty && else_empty {
                    return;
                }
                if else_empty {
                    self.emit(decision, then_body);
                    return;
                }
                if then_empty {
                    self.lines
                        .push(format!("if [ $(({})) -eq 0 ] ; then", guard.render()));
                    for line in else_body.lines() {
                        self.lines.push(format!("  {line}"));
                    }
                    self.lines.push("fi".to_string());
                    return;
                }
                self.lines
                    .push(format!("if [ $(({})) -ne 0 ] ; then", guard.render()));
                for line in then_body.lines() {
                    self.lines.push(format!("  {line}"));
                }
                self.lines.push("else".to_string());
                for line in else_body.lines() {
                    self.lines.push(format!("  {line}"));
                }
                self.lines.push("fi".to_string());
            }
        }
    }

    /// The assembled script text, lines joined by newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

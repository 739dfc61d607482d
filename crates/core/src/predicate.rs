//! The predicate compiler: ranges plus a selected universe become
//! emission decisions.
//!
//! A feature range evaluated against every member of the universe either
//! holds everywhere ([`Decision::Always`]), nowhere ([`Decision::Never`]),
//! or for a proper subset, in which case the matching members are
//! described by a [`GuardExpr`] over their runtime encodings. The guard is
//! built from contiguous runs of matching members, so it stays short even
//! for awkward ranges.

use crate::compiler::{CompilerId, CompilerKind, CompilerSet};
use crate::range::CompilerRange;

/// What an assembler should do with one piece of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Emit unconditionally.
    Always,
    /// Emit nothing.
    Never,
    /// Emit wrapped in a runtime guard.
    Guarded(GuardExpr),
}

impl Decision {
    /// Whether this decision emits unconditionally.
    #[must_use]
    pub const fn is_always(&self) -> bool {
        matches!(self, Self::Always)
    }

    /// Whether this decision emits nothing.
    #[must_use]
    pub const fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }
}

/// A boolean expression over the runtime variables `HCNUMVER` (numeric
/// version encoding) and `HCJSARITH` (kind flag).
///
/// `All([])` is true and `Any([])` is false, the usual identities, so
/// construction never needs special cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardExpr {
    /// The job's compiler is of this kind.
    Kind(CompilerKind),
    /// `HCNUMVER >= n`.
    AtLeast(u64),
    /// `HCNUMVER < n`.
    Below(u64),
    /// Conjunction.
    All(Vec<GuardExpr>),
    /// Disjunction.
    Any(Vec<GuardExpr>),
}

impl GuardExpr {
    /// Statically evaluate the guard against one compiler, substituting
    /// its runtime encoding. This is the other half of the round-trip
    /// contract: for every universe member, evaluating the compiled guard
    /// agrees with evaluating the original range.
    #[must_use]
    pub fn eval(&self, id: &CompilerId) -> bool {
        match self {
            Self::Kind(kind) => id.kind == *kind,
            Self::AtLeast(n) => id.num_ver() >= *n,
            Self::Below(n) => id.num_ver() < *n,
            Self::All(parts) => parts.iter().all(|part| part.eval(id)),
            Self::Any(parts) => parts.iter().any(|part| part.eval(id)),
        }
    }

    /// Render as POSIX shell arithmetic, suitable for `[ $((…)) -ne 0 ]`.
    /// `&&` binds tighter than `||`, so only disjunctions nested inside
    /// conjunctions need parentheses.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Kind(kind) => format!("HCJSARITH == {}", kind.arith_flag()),
            Self::AtLeast(n) => format!("HCNUMVER >= {n}"),
            Self::Below(n) => format!("HCNUMVER < {n}"),
            Self::All(parts) => match parts.len() {
                0 => "1".to_string(),
                1 => parts[0].render(),
                _ => parts
                    .iter()
                    .map(|part| match part {
                        Self::Any(inner) if inner.len() > 1 => format!("({})", part.render()),
                        _ => part.render(),
                    })
                    .collect::<Vec<_>>()
                    .join(" && "),
            },
            Self::Any(parts) => match parts.len() {
                0 => "0".to_string(),
                1 => parts[0].render(),
                _ => parts
                    .iter()
                    .map(Self::render)
                    .collect::<Vec<_>>()
                    .join(" || "),
            },
        }
    }
}

/// Compile a range against the selected universe.
///
/// An empty universe yields [`Decision::Never`]; so does a range no member
/// matches. A range every member matches yields [`Decision::Always`].
/// Anything in between yields a guard that holds exactly for the matching
/// members.
#[must_use]
pub fn compile(range: &CompilerRange, set: &CompilerSet) -> Decision {
    if set.is_empty() {
        return Decision::Never;
    }
    let matching = set.iter().filter(|id| range.matches(id)).count();
    if matching == 0 {
        return Decision::Never;
    }
    if matching == set.len() {
        return Decision::Always;
    }
    Decision::Guarded(guard_for(range, set))
}

/// Build the guard for a proper, non-empty subset of the universe.
///
/// Per kind, the sorted member list is partitioned into contiguous runs of
/// matches; each run becomes a half-open encoding interval, with bounds at
/// the universe's edges dropped (a job's encoding is always one of the
/// members'). Kind atoms appear only when the universe spans both kinds.
fn guard_for(range: &CompilerRange, set: &CompilerSet) -> GuardExpr {
    let multi_kind = set.kinds().len() > 1;
    let mut branches = Vec::new();
    for kind in set.kinds() {
        let members: Vec<&CompilerId> = set.of_kind(kind).collect();
        let hits: Vec<bool> = members.iter().map(|id| range.matches(id)).collect();
        if !hits.contains(&true) {
            continue;
        }

        let mut runs = Vec::new();
        let mut covers_kind = false;
        let mut i = 0;
        while i < members.len() {
            if !hits[i] {
                i += 1;
                continue;
            }
            let start = i;
            while i < members.len() && hits[i] {
                i += 1;
            }
            let lower = (start > 0).then(|| GuardExpr::AtLeast(members[start].num_ver()));
            let upper = (i < members.len()).then(|| GuardExpr::Below(members[i].num_ver()));
            match (lower, upper) {
                (None, None) => covers_kind = true,
                (Some(lo), Some(hi)) => runs.push(GuardExpr::All(vec![lo, hi])),
                (Some(lo), None) => runs.push(lo),
                (None, Some(hi)) => runs.push(hi),
            }
        }

        let version_test = if covers_kind {
            None
        } else {
            Some(collapse_any(runs))
        };
        let branch = match (multi_kind, version_test) {
            (true, Some(test)) => GuardExpr::All(vec![GuardExpr::Kind(kind), test]),
            (true, None) => GuardExpr::Kind(kind),
            (false, Some(test)) => test,
            // A single-kind universe fully covered is Always, handled by
            // the caller; the true constant keeps this arm total.
            (false, None) => GuardExpr::All(Vec::new()),
        };
        branches.push(branch);
    }
    collapse_any(branches)
}

fn collapse_any(mut exprs: Vec<GuardExpr>) -> GuardExpr {
    if exprs.len() == 1 {
        return exprs.swap_remove(0);
    }
    GuardExpr::Any(exprs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse_lenient_version;
    use semver::Version;

    fn ghc(version: &str) -> CompilerId {
        CompilerId::new(CompilerKind::Ghc, parse_lenient_version(version).unwrap())
    }

    fn ghcjs(version: &str) -> CompilerId {
        CompilerId::new(CompilerKind::Ghcjs, parse_lenient_version(version).unwrap())
    }

    fn set(ids: Vec<CompilerId>) -> CompilerSet {
        CompilerSet::new(ids).unwrap()
    }

    fn range(source: &str) -> CompilerRange {
        source.parse().unwrap()
    }

    #[test]
    fn empty_universe_is_never() {
        let empty = CompilerSet::default();
        assert_eq!(compile(&range("all"), &empty), Decision::Never);
    }

    #[test]
    fn full_match_is_always() {
        let universe = set(vec![ghc("8.10.7"), ghc("9.2.8")]);
        assert_eq!(compile(&range("all"), &universe), Decision::Always);
        assert_eq!(compile(&range(">=8"), &universe), Decision::Always);
    }

    #[test]
    fn no_match_is_never() {
        let universe = set(vec![ghc("8.10.7"), ghc("9.2.8")]);
        assert_eq!(compile(&range("none"), &universe), Decision::Never);
        assert_eq!(compile(&range(">=9.6"), &universe), Decision::Never);
        assert_eq!(compile(&range("ghcjs"), &universe), Decision::Never);
    }

    #[test]
    fn upper_run_drops_the_upper_bound() {
        let universe = set(vec![ghc("8.10.7"), ghc("9.2.8")]);
        let Decision::Guarded(guard) = compile(&range(">=9.0"), &universe) else {
            panic!("expected a guard");
        };
        assert_eq!(guard.render(), "HCNUMVER >= 90208");
    }

    #[test]
    fn lower_run_drops_the_lower_bound() {
        let universe = set(vec![ghc("8.10.7"), ghc("9.2.8")]);
        let Decision::Guarded(guard) = compile(&range("<9.0"), &universe) else {
            panic!("expected a guard");
        };
        assert_eq!(guard.render(), "HCNUMVER < 90208");
    }

    #[test]
    fn interior_run_keeps_both_bounds() {
        let universe = set(vec![ghc("8.8.4"), ghc("8.10.7"), ghc("9.2.8")]);
        let Decision::Guarded(guard) = compile(&range(">=8.10 && <9.0"), &universe) else {
            panic!("expected a guard");
        };
        assert_eq!(guard.render(), "HCNUMVER >= 81007 && HCNUMVER < 90208");
    }

    #[test]
    fn disjoint_runs_join_with_or() {
        let universe = set(vec![ghc("8.0.2"), ghc("8.10.7"), ghc("9.2.8")]);
        let Decision::Guarded(guard) = compile(&range("==8.0.2 || ==9.2.8"), &universe) else {
            panic!("expected a guard");
        };
        assert_eq!(guard.render(), "HCNUMVER < 81007 || HCNUMVER >= 90208");
    }

    #[test]
    fn covered_kind_becomes_a_kind_atom() {
        let universe = set(vec![ghc("8.10.7"), ghc("9.2.8"), ghcjs("8.4")]);
        let Decision::Guarded(guard) = compile(&range("ghcjs"), &universe) else {
            panic!("expected a guard");
        };
        assert_eq!(guard.render(), "HCJSARITH == 1");
    }

    #[test]
    fn mixed_kind_guards_carry_kind_atoms() {
        let universe = set(vec![ghc("8.10.7"), ghc("9.2.8"), ghcjs("8.4")]);
        let Decision::Guarded(guard) = compile(&range("ghc && >=9.0"), &universe) else {
            panic!("expected a guard");
        };
        assert_eq!(guard.render(), "HCJSARITH == 0 && HCNUMVER >= 90208");
    }

    #[test]
    fn single_kind_guards_skip_kind_atoms() {
        let universe = set(vec![ghc("8.10.7"), ghc("9.2.8")]);
        let Decision::Guarded(guard) = compile(&range(">=9.0"), &universe) else {
            panic!("expected a guard");
        };
        assert!(!guard.render().contains("HCJSARITH"));
    }

    #[test]
    fn guards_round_trip_against_members() {
        let universe = set(vec![
            ghc("8.0.2"),
            ghc("8.10.7"),
            ghc("9.2.8"),
            ghcjs("8.4"),
            ghcjs("8.10.7"),
        ]);
        let ranges = [
            range(">=8.10"),
            range("<8.10"),
            range("ghcjs && >=8.10"),
            range("==8.0.2 || ==9.2.8"),
            range("ghc && (>=8.10 && <9.0)"),
        ];
        for r in &ranges {
            match compile(r, &universe) {
                Decision::Always => {
                    assert!(universe.iter().all(|id| r.matches(id)));
                }
                Decision::Never => {
                    assert!(universe.iter().all(|id| !r.matches(id)));
                }
                Decision::Guarded(guard) => {
                    for id in &universe {
                        assert_eq!(guard.eval(id), r.matches(id), "{r} on {id}");
                    }
                }
            }
        }
    }

    #[test]
    fn disjunction_parenthesized_inside_conjunction() {
        let expr = GuardExpr::All(vec![
            GuardExpr::Kind(CompilerKind::Ghc),
            GuardExpr::Any(vec![GuardExpr::Below(80400), GuardExpr::AtLeast(90000)]),
        ]);
        assert_eq!(
            expr.render(),
            "HCJSARITH == 0 && (HCNUMVER < 80400 || HCNUMVER >= 90000)"
        );
    }

    #[test]
    fn empty_connectives_render_as_constants() {
        assert_eq!(GuardExpr::All(Vec::new()).render(), "1");
        assert_eq!(GuardExpr::Any(Vec::new()).render(), "0");
        let id = ghc("9.2.8");
        assert!(GuardExpr::All(Vec::new()).eval(&id));
        assert!(!GuardExpr::Any(Vec::new()).eval(&id));
    }

    #[test]
    fn head_flag_does_not_change_decisions() {
        let head = CompilerId::new(CompilerKind::Ghc, Version::new(9, 9, 0)).with_head(true);
        let universe = set(vec![ghc("9.2.8"), head.clone()]);
        let Decision::Guarded(guard) = compile(&range(">=9.9"), &universe) else {
            panic!("expected a guard");
        };
        assert!(guard.eval(&head));
        assert!(!guard.eval(&ghc("9.2.8")));
    }
}

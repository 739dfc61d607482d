//! Property-based tests for the predicate compiler.
//!
//! These tests verify the behavioral contracts of compilation:
//! - Decisions agree with the range on every universe member
//! - An empty universe always compiles to Never
//! - Guards for single-kind universes never test the kind flag
//! - Compilation and range display are deterministic

use proptest::prelude::*;
use semver::Version;
use weft_core::{CompilerId, CompilerKind, CompilerRange, CompilerSet, Decision, VersionOp, compile};

// =============================================================================
// Strategies for generating test data
// =============================================================================

fn kind_strategy() -> impl Strategy<Value = CompilerKind> {
    prop_oneof![Just(CompilerKind::Ghc), Just(CompilerKind::Ghcjs)]
}

/// Versions in the realistic band. Patch stays below the clamp so every
/// generated version has a distinct encoding and set construction cannot
/// fail.
fn version_strategy() -> impl Strategy<Value = Version> {
    (8..=9_u64, 0..=10_u64, 0..=8_u64).prop_map(|(major, minor, patch)| {
        Version::new(major, minor, patch)
    })
}

fn id_strategy() -> impl Strategy<Value = CompilerId> {
    (kind_strategy(), version_strategy())
        .prop_map(|(kind, version)| CompilerId::new(kind, version))
}

fn universe_strategy() -> impl Strategy<Value = CompilerSet> {
    proptest::collection::vec(id_strategy(), 0..=8)
        .prop_map(|ids| CompilerSet::new(ids).expect("generated encodings are distinct"))
}

fn op_strategy() -> impl Strategy<Value = VersionOp> {
    prop_oneof![
        Just(VersionOp::Lt),
        Just(VersionOp::Le),
        Just(VersionOp::Eq),
        Just(VersionOp::Ge),
        Just(VersionOp::Gt),
    ]
}

fn range_strategy() -> impl Strategy<Value = CompilerRange> {
    let leaf = prop_oneof![
        Just(CompilerRange::anything()),
        Just(CompilerRange::nothing()),
        kind_strategy().prop_map(CompilerRange::Kind),
        (op_strategy(), version_strategy()).prop_map(|(op, v)| CompilerRange::Bound(op, v)),
        proptest::collection::btree_set(version_strategy(), 1..=3).prop_map(CompilerRange::Points),
    ];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner).prop_map(|(a, b)| a.or(b)),
        ]
    })
}

// =============================================================================
// Property Tests: Compilation Round-Trip
// =============================================================================

proptest! {
    /// Contract: the decision agrees with the range on every member.
    ///
    /// Always means every member matches, Never means none does, and a
    /// guard evaluates on each member exactly as the range does. Guards
    /// only appear for proper subsets.
    #[test]
    fn decision_agrees_with_range_on_every_member(
        universe in universe_strategy(),
        range in range_strategy(),
    ) {
        match compile(&range, &universe) {
            Decision::Always => {
                prop_assert!(!universe.is_empty(), "Always from an empty universe");
                for id in &universe {
                    prop_assert!(range.matches(id), "Always but {id} does not match {range}");
                }
            }
            Decision::Never => {
                for id in &universe {
                    prop_assert!(!range.matches(id), "Never but {id} matches {range}");
                }
            }
            Decision::Guarded(guard) => {
                let matching = universe.iter().filter(|id| range.matches(id)).count();
                prop_assert!(
                    matching > 0 && matching < universe.len(),
                    "guard for a non-proper subset ({matching} of {})",
                    universe.len()
                );
                for id in &universe {
                    prop_assert_eq!(
                        guard.eval(id),
                        range.matches(id),
                        "guard '{}' disagrees with {} on {}",
                        guard.render(), range, id
                    );
                }
            }
        }
    }

    /// Contract: an empty universe compiles to Never, whatever the range.
    #[test]
    fn empty_universe_compiles_to_never(range in range_strategy()) {
        let empty = CompilerSet::default();
        prop_assert_eq!(compile(&range, &empty), Decision::Never);
    }

    /// Contract: compilation is deterministic.
    #[test]
    fn compilation_is_deterministic(
        universe in universe_strategy(),
        range in range_strategy(),
    ) {
        prop_assert_eq!(compile(&range, &universe), compile(&range, &universe));
    }
}

// =============================================================================
// Property Tests: Guard Shape
// =============================================================================

proptest! {
    /// Contract: a single-kind universe never produces a kind test.
    #[test]
    fn single_kind_guards_never_test_the_kind_flag(
        kind in kind_strategy(),
        versions in proptest::collection::btree_set(version_strategy(), 1..=6),
        range in range_strategy(),
    ) {
        let ids: Vec<CompilerId> = versions
            .into_iter()
            .map(|version| CompilerId::new(kind, version))
            .collect();
        let universe = CompilerSet::new(ids).expect("distinct encodings");
        if let Decision::Guarded(guard) = compile(&range, &universe) {
            prop_assert!(
                !guard.render().contains("HCJSARITH"),
                "kind test in a single-kind guard: {}",
                guard.render()
            );
        }
    }
}

// =============================================================================
// Property Tests: Range Syntax
// =============================================================================

proptest! {
    /// Contract: displaying a range and reparsing it preserves matching.
    #[test]
    fn display_reparse_preserves_matching(
        range in range_strategy(),
        probes in proptest::collection::vec(id_strategy(), 1..=6),
    ) {
        let reparsed: CompilerRange = range
            .to_string()
            .parse()
            .expect("displayed range should reparse");
        for id in &probes {
            prop_assert_eq!(
                range.matches(id),
                reparsed.matches(id),
                "'{}' changed meaning after reparse",
                range
            );
        }
    }
}

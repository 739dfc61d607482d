//! Compiler identities and the selected universe.
//!
//! A [`CompilerId`] names one compiler a pipeline builds with: its kind,
//! its version, and whether it is a pre-release head snapshot.
//! [`CompilerSet`] is the ordered universe a pipeline was configured with;
//! range predicates are compiled against it.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The family a compiler belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CompilerKind {
    /// Standard GHC.
    #[default]
    Ghc,
    /// The JavaScript-targeting GHCJS runtime.
    Ghcjs,
}

impl CompilerKind {
    /// Lowercase name as it appears in configuration and generated output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ghc => "ghc",
            Self::Ghcjs => "ghcjs",
        }
    }

    /// Value of the `HCJSARITH` variable in generated guard arithmetic.
    #[must_use]
    pub const fn arith_flag(self) -> u64 {
        match self {
            Self::Ghc => 0,
            Self::Ghcjs => 1,
        }
    }
}

impl fmt::Display for CompilerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a compiler gets installed on a CI worker.
///
/// A closed set: the matrix backend's dual-path setup and the manifest
/// backend's static scripts both match on it exhaustively.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SetupMethod {
    /// ghcup bootstrap into `$HOME/.ghcup`.
    #[default]
    Ghcup,
    /// Distribution packages from the hvr PPA under `/opt`.
    Apt,
}

impl SetupMethod {
    /// Lowercase name as it appears in configuration and matrix metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ghcup => "ghcup",
            Self::Apt => "apt",
        }
    }
}

impl fmt::Display for SetupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a version leniently: one, two, or three numeric components,
/// missing components zero-filled (`"8.10"` is 8.10.0).
pub fn parse_lenient_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidVersion {
            input: input.to_string(),
            reason: "empty version".to_string(),
        });
    }
    let mut parts = [0_u64; 3];
    let mut count = 0_usize;
    for piece in trimmed.split('.') {
        if count == parts.len() {
            return Err(Error::InvalidVersion {
                input: input.to_string(),
                reason: "more than three components".to_string(),
            });
        }
        parts[count] = piece.parse().map_err(|_| Error::InvalidVersion {
            input: input.to_string(),
            reason: format!("component '{piece}' is not a number"),
        })?;
        count += 1;
    }
    Ok(Version::new(parts[0], parts[1], parts[2]))
}

/// Numeric runtime encoding of a version: `major * 10000 + minor * 100 +
/// patch`, with the patch clamped at 99 so date-stamped head snapshots
/// stay in range.
#[must_use]
pub fn encode_version(version: &Version) -> u64 {
    version.major * 10_000 + version.minor * 100 + version.patch.min(99)
}

/// One concrete compiler in the selected universe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompilerId {
    /// Compiler family.
    pub kind: CompilerKind,
    /// Resolved version; lenient inputs are zero-filled.
    pub version: Version,
    /// Pre-release head snapshot marker. Range evaluation never consults
    /// it; it drives allow-failure defaults.
    pub head: bool,
}

impl CompilerId {
    /// A released compiler of the given kind.
    #[must_use]
    pub const fn new(kind: CompilerKind, version: Version) -> Self {
        Self {
            kind,
            version,
            head: false,
        }
    }

    /// Set the head snapshot marker.
    #[must_use]
    pub const fn with_head(mut self, head: bool) -> Self {
        self.head = head;
        self
    }

    /// Parse `"ghc-9.2.8"`, `"ghcjs-8.4"`, or a bare version (the kind
    /// defaults to GHC).
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Some(rest) = trimmed.strip_prefix("ghcjs-") {
            return Ok(Self::new(CompilerKind::Ghcjs, parse_lenient_version(rest)?));
        }
        if let Some(rest) = trimmed.strip_prefix("ghc-") {
            return Ok(Self::new(CompilerKind::Ghc, parse_lenient_version(rest)?));
        }
        Ok(Self::new(CompilerKind::Ghc, parse_lenient_version(trimmed)?))
    }

    /// Numeric runtime encoding (see [`encode_version`]). Injective per
    /// kind within any accepted [`CompilerSet`].
    #[must_use]
    pub fn num_ver(&self) -> u64 {
        encode_version(&self.version)
    }
}

impl fmt::Display for CompilerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.version)
    }
}

impl FromStr for CompilerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// The ordered universe of selected compilers.
///
/// Construction sorts by (kind, version), deduplicates, and rejects
/// same-kind members whose numeric encodings collide. Guard construction
/// depends on both properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerSet {
    ids: Vec<CompilerId>,
}

impl CompilerSet {
    /// Build a set from arbitrary members.
    pub fn new(mut ids: Vec<CompilerId>) -> Result<Self> {
        ids.sort();
        ids.dedup();
        for pair in ids.windows(2) {
            if pair[0].kind == pair[1].kind && pair[0].num_ver() == pair[1].num_ver() {
                return Err(Error::EncodingCollision {
                    first: pair[0].to_string(),
                    second: pair[1].to_string(),
                    encoding: pair[0].num_ver(),
                });
            }
        }
        Ok(Self { ids })
    }

    /// Single-member universe. Manifest backends assemble against these,
    /// which is what keeps their scripts guard-free.
    #[must_use]
    pub fn singleton(id: CompilerId) -> Self {
        Self { ids: vec![id] }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Members in (kind, version) order.
    pub fn iter(&self) -> std::slice::Iter<'_, CompilerId> {
        self.ids.iter()
    }

    /// Distinct kinds present, in member order.
    #[must_use]
    pub fn kinds(&self) -> Vec<CompilerKind> {
        let mut kinds = Vec::new();
        for id in &self.ids {
            if !kinds.contains(&id.kind) {
                kinds.push(id.kind);
            }
        }
        kinds
    }

    /// Members of one kind, in version order.
    pub fn of_kind(&self, kind: CompilerKind) -> impl Iterator<Item = &CompilerId> {
        self.ids.iter().filter(move |id| id.kind == kind)
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, id: &CompilerId) -> bool {
        self.ids.binary_search(id).is_ok()
    }
}

impl<'a> IntoIterator for &'a CompilerSet {
    type Item = &'a CompilerId;
    type IntoIter = std::slice::Iter<'a, CompilerId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ghc(version: &str) -> CompilerId {
        CompilerId::new(CompilerKind::Ghc, parse_lenient_version(version).unwrap())
    }

    #[test]
    fn lenient_parsing_zero_fills() {
        assert_eq!(parse_lenient_version("9").unwrap(), Version::new(9, 0, 0));
        assert_eq!(
            parse_lenient_version("8.10").unwrap(),
            Version::new(8, 10, 0)
        );
        assert_eq!(
            parse_lenient_version("8.10.7").unwrap(),
            Version::new(8, 10, 7)
        );
    }

    #[test]
    fn lenient_parsing_rejects_garbage() {
        assert!(parse_lenient_version("").is_err());
        assert!(parse_lenient_version("9.x").is_err());
        assert!(parse_lenient_version("9.2.8.1").is_err());
        assert!(parse_lenient_version("9..2").is_err());
    }

    #[test]
    fn id_parsing_accepts_prefixes() {
        let id = CompilerId::parse("ghcjs-8.4").unwrap();
        assert_eq!(id.kind, CompilerKind::Ghcjs);
        assert_eq!(id.version, Version::new(8, 4, 0));

        let id = CompilerId::parse("ghc-9.2.8").unwrap();
        assert_eq!(id.kind, CompilerKind::Ghc);

        let id = CompilerId::parse("9.2.8").unwrap();
        assert_eq!(id.kind, CompilerKind::Ghc);
    }

    #[test]
    fn display_round_trips() {
        let id = ghc("9.2.8");
        assert_eq!(id.to_string(), "ghc-9.2.8");
        assert_eq!(CompilerId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn encoding_examples() {
        assert_eq!(ghc("9.2.8").num_ver(), 90208);
        assert_eq!(ghc("8.10.7").num_ver(), 81007);
        assert_eq!(ghc("9.0").num_ver(), 90000);
    }

    #[test]
    fn encoding_clamps_date_patches() {
        assert_eq!(ghc("9.9.20260101").num_ver(), 90999);
    }

    #[test]
    fn set_sorts_and_dedupes() {
        let set = CompilerSet::new(vec![ghc("9.2.8"), ghc("8.10.7"), ghc("9.2.8")]).unwrap();
        let names: Vec<String> = set.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["ghc-8.10.7", "ghc-9.2.8"]);
    }

    #[test]
    fn set_orders_kinds_apart() {
        let js = CompilerId::new(CompilerKind::Ghcjs, Version::new(8, 4, 0));
        let set = CompilerSet::new(vec![js.clone(), ghc("9.2.8"), ghc("8.10.7")]).unwrap();
        assert_eq!(set.kinds(), vec![CompilerKind::Ghc, CompilerKind::Ghcjs]);
        assert_eq!(set.of_kind(CompilerKind::Ghcjs).count(), 1);
        assert!(set.contains(&js));
    }

    #[test]
    fn set_rejects_encoding_collisions() {
        let err = CompilerSet::new(vec![ghc("9.9.20260101"), ghc("9.9.20260102")]).unwrap_err();
        assert!(matches!(err, Error::EncodingCollision { encoding: 90999, .. }));
    }

    #[test]
    fn same_versions_of_different_kinds_coexist() {
        let js = CompilerId::new(CompilerKind::Ghcjs, Version::new(8, 10, 7));
        let set = CompilerSet::new(vec![ghc("8.10.7"), js]).unwrap();
        assert_eq!(set.len(), 2);
    }
}

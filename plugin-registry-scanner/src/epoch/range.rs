//! Platform-core dependency range analysis.
//!
//! Supports the npm range grammar as found in real manifests:
//! - `1.2.3` - exact version
//! - `^1.2.3` - compatible with version
//! - `~1.2.3` - approximately equivalent
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.x`, `1.2.x`, `1`, `1.2`, `*` - wildcards and x-ranges
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - `>=1.0.0 <2.0.0` - space-separated intersections
//! - `^1.0.0 || ^2.0.0` - unions
//!
//! Anything else (the `latest` dist-tag, `workspace:`/`catalog:` protocols,
//! URLs, filesystem paths, malformed text) normalizes to a non-range value
//! instead of an error, so parsing is total over arbitrary manifest input.

use semver::{BuildMetadata, Prerelease, Version};

use super::Epoch;

/// A parsed platform-core dependency range.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreRange {
    /// The literal `latest` dist-tag: tracks every release line.
    Latest,
    /// A decidable semver range.
    Semantic(RangeSpec),
    /// `workspace:`/`catalog:` protocol, resolvable only inside the
    /// package's own monorepo.
    WorkspacePlaceholder,
    /// URLs, filesystem paths, git references, and malformed text.
    Opaque,
}

impl CoreRange {
    /// Parse a raw manifest dependency string. Total: undecidable input
    /// becomes [`CoreRange::Opaque`], never an error.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("latest") {
            return CoreRange::Latest;
        }
        if raw.starts_with("workspace:") || raw.starts_with("catalog:") {
            return CoreRange::WorkspacePlaceholder;
        }
        if is_reference(raw) {
            return CoreRange::Opaque;
        }
        match RangeSpec::parse(raw) {
            Some(spec) => CoreRange::Semantic(spec),
            None => CoreRange::Opaque,
        }
    }

    /// Whether this range is a workspace-internal placeholder that a
    /// secondary manifest may resolve.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, CoreRange::WorkspacePlaceholder)
    }

    /// Whether some version accepted by this range falls inside the epoch's
    /// band, pre-releases included.
    ///
    /// An exact version is treated as `>=` that version: a manifest pinning
    /// one release is assumed forward-compatible with later lines rather
    /// than hard-pinned. `latest` intersects every epoch; placeholders and
    /// opaque references intersect none.
    #[must_use]
    pub fn intersects(&self, epoch: Epoch) -> bool {
        match self {
            CoreRange::Latest => true,
            CoreRange::Semantic(spec) => spec.intersects(&band_interval(epoch)),
            CoreRange::WorkspacePlaceholder | CoreRange::Opaque => false,
        }
    }

    /// The epoch of the range's anchor version, when that epoch really
    /// intersects the range; `None` for `latest`, `*`, placeholders, opaque
    /// references, and degenerate ranges.
    #[must_use]
    pub fn classify(&self) -> Option<Epoch> {
        let CoreRange::Semantic(spec) = self else {
            return None;
        };
        let epoch = Epoch(spec.base_version()?.major);
        self.intersects(epoch).then_some(epoch)
    }

    /// The single epoch this range is unambiguously anchored to: a full
    /// exact version, a caret form, or a tilde form. Unions, compounds,
    /// inequalities, wildcards, and hyphen ranges answer `None`.
    ///
    /// Used to detect contradictions between a published version's major and
    /// the core line its manifest declares, never to assert support.
    #[must_use]
    pub fn dominant_epoch(&self) -> Option<Epoch> {
        let CoreRange::Semantic(spec) = self else {
            return None;
        };
        let [group] = spec.branches.as_slice() else {
            return None;
        };
        let [comparator] = group.as_slice() else {
            return None;
        };
        match comparator {
            Comparator::Exact(v)
            | Comparator::Caret { from: v, .. }
            | Comparator::Tilde { from: v, .. } => Some(Epoch(v.major)),
            _ => None,
        }
    }
}

/// Dependency strings that point at code rather than versions.
fn is_reference(raw: &str) -> bool {
    const PROTOCOLS: [&str; 6] = ["file:", "link:", "portal:", "patch:", "npm:", "git+"];

    raw.contains("://")
        || raw.contains('/')
        || PROTOCOLS.iter().any(|p| raw.starts_with(p))
        || raw.starts_with("github:")
        || raw.starts_with("git:")
}

/// A decidable range: `||` branches, each branch an intersection of
/// space-separated comparators.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSpec {
    branches: Vec<Vec<Comparator>>,
}

impl RangeSpec {
    fn parse(spec: &str) -> Option<Self> {
        let branches = spec
            .split("||")
            .map(str::trim)
            .map(parse_intersection)
            .collect::<Option<Vec<_>>>()?;
        if branches.is_empty() {
            return None;
        }
        Some(RangeSpec { branches })
    }

    /// Whether any branch's comparator intersection overlaps the band.
    fn intersects(&self, band: &Interval) -> bool {
        self.branches.iter().any(|group| {
            let mut acc = Interval::unbounded();
            for comparator in group {
                match acc.intersect(&comparator.interval()) {
                    Some(narrowed) => acc = narrowed,
                    None => return false,
                }
            }
            acc.overlaps(band)
        })
    }

    /// The anchor version of the first branch's first comparator.
    fn base_version(&self) -> Option<Version> {
        self.branches.first()?.first()?.base_version()
    }
}

/// Parse one `||` branch into its comparator intersection.
fn parse_intersection(branch: &str) -> Option<Vec<Comparator>> {
    let tokens: Vec<&str> = branch.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let mut comparators = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if i + 2 < tokens.len() && tokens[i + 1] == "-" {
            comparators.push(Comparator::hyphen(tokens[i], tokens[i + 2])?);
            i += 3;
        } else if tokens[i] == "-" {
            return None;
        } else {
            comparators.push(Comparator::parse(tokens[i])?);
            i += 1;
        }
    }
    Some(comparators)
}

/// One comparator, with caret/tilde/hyphen upper bounds already resolved at
/// parse time.
#[derive(Debug, Clone, PartialEq)]
enum Comparator {
    Exact(Version),
    /// `from` inclusive, `to` exclusive.
    Caret { from: Version, to: Version },
    /// `from` inclusive, `to` exclusive.
    Tilde { from: Version, to: Version },
    Gte(Version),
    Gt(Version),
    Lte(Version),
    Lt(Version),
    Any,
    WildcardMajor(u64),
    WildcardMinor(u64, u64),
    Hyphen {
        from: Version,
        to: Version,
        to_inclusive: bool,
    },
}

impl Comparator {
    fn parse(token: &str) -> Option<Self> {
        if let Some(rest) = token.strip_prefix(">=") {
            Some(Comparator::Gte(Partial::parse(rest)?.floored()))
        } else if let Some(rest) = token.strip_prefix('>') {
            Some(Comparator::Gt(Partial::parse(rest)?.floored()))
        } else if let Some(rest) = token.strip_prefix("<=") {
            Some(Comparator::Lte(Partial::parse(rest)?.floored()))
        } else if let Some(rest) = token.strip_prefix('<') {
            Some(Comparator::Lt(Partial::parse(rest)?.exclusive_ceiling()))
        } else if let Some(rest) = token.strip_prefix('^') {
            let partial = Partial::parse(rest)?;
            Some(Comparator::Caret {
                from: partial.floored(),
                to: caret_ceiling(&partial),
            })
        } else if let Some(rest) = token.strip_prefix('~') {
            let partial = Partial::parse(rest)?;
            Some(Comparator::Tilde {
                from: partial.floored(),
                to: tilde_ceiling(&partial),
            })
        } else if token == "*" || token.eq_ignore_ascii_case("x") {
            Some(Comparator::Any)
        } else {
            Self::parse_plain(token)
        }
    }

    /// A bare version token: full versions are exact, missing or `x`/`*`
    /// components make it an x-range.
    fn parse_plain(token: &str) -> Option<Self> {
        let is_x = |part: &str| part == "*" || part.eq_ignore_ascii_case("x");
        let parts: Vec<&str> = token.split('.').collect();
        match parts.as_slice() {
            [major, rest @ ..] if !rest.is_empty() && rest.iter().all(|p| is_x(p)) => {
                Some(Comparator::WildcardMajor(major.parse().ok()?))
            }
            [major, minor, x] if is_x(x) => Some(Comparator::WildcardMinor(
                major.parse().ok()?,
                minor.parse().ok()?,
            )),
            _ => {
                let partial = Partial::parse(token)?;
                match (partial.minor, partial.patch) {
                    (Some(_), Some(_)) => Some(Comparator::Exact(partial.floored())),
                    (Some(minor), None) => {
                        Some(Comparator::WildcardMinor(partial.major, minor))
                    }
                    (None, _) => Some(Comparator::WildcardMajor(partial.major)),
                }
            }
        }
    }

    fn hyphen(from: &str, to: &str) -> Option<Self> {
        let from = Partial::parse(from)?.floored();
        let to_partial = Partial::parse(to)?;
        let to_inclusive = to_partial.minor.is_some() && to_partial.patch.is_some();
        let to = if to_inclusive {
            to_partial.floored()
        } else {
            tilde_ceiling(&to_partial)
        };
        Some(Comparator::Hyphen {
            from,
            to,
            to_inclusive,
        })
    }

    /// The version interval this comparator admits, with exact versions
    /// widened to their forward-compatible floor.
    fn interval(&self) -> Interval {
        match self {
            Comparator::Exact(v) | Comparator::Gte(v) => Interval::at_least(v.clone()),
            Comparator::Caret { from, to } | Comparator::Tilde { from, to } => {
                Interval::half_open(from.clone(), to.clone())
            }
            Comparator::Gt(v) => Interval {
                lo: Bound::Exclusive(v.clone()),
                hi: Bound::Unbounded,
            },
            Comparator::Lte(v) => Interval {
                lo: Bound::Unbounded,
                hi: Bound::Inclusive(v.clone()),
            },
            Comparator::Lt(v) => Interval {
                lo: Bound::Unbounded,
                hi: Bound::Exclusive(v.clone()),
            },
            Comparator::Any => Interval::unbounded(),
            Comparator::WildcardMajor(major) => Interval::half_open(
                Version::new(*major, 0, 0),
                band_floor(major.saturating_add(1)),
            ),
            Comparator::WildcardMinor(major, minor) => Interval::half_open(
                Version::new(*major, *minor, 0),
                version_floor(*major, minor.saturating_add(1), 0),
            ),
            Comparator::Hyphen {
                from,
                to,
                to_inclusive,
            } => Interval {
                lo: Bound::Inclusive(from.clone()),
                hi: if *to_inclusive {
                    Bound::Inclusive(to.clone())
                } else {
                    Bound::Exclusive(to.clone())
                },
            },
        }
    }

    fn base_version(&self) -> Option<Version> {
        match self {
            Comparator::Exact(v)
            | Comparator::Gte(v)
            | Comparator::Gt(v)
            | Comparator::Lte(v)
            | Comparator::Lt(v) => Some(v.clone()),
            Comparator::Caret { from, .. }
            | Comparator::Tilde { from, .. }
            | Comparator::Hyphen { from, .. } => Some(from.clone()),
            Comparator::Any => None,
            Comparator::WildcardMajor(major) => Some(Version::new(*major, 0, 0)),
            Comparator::WildcardMinor(major, minor) => Some(Version::new(*major, *minor, 0)),
        }
    }
}

/// A version with possibly missing minor/patch components, as written in
/// range comparators (`1`, `1.2`, `1.2.3`, `1.2.3-beta.1`). An `x`/`*`
/// component counts as missing, so `^1.x` and `>=1.x` stay decidable.
struct Partial {
    major: u64,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(v) = Version::parse(text) {
            return Some(Partial {
                major: v.major,
                minor: Some(v.minor),
                patch: Some(v.patch),
                pre: v.pre,
            });
        }

        // Not a full version: accept bare numeric components, with x/* as
        // a missing component. Anything after an x is noise and ignored.
        let is_x = |part: &str| part == "*" || part.eq_ignore_ascii_case("x");
        let mut parts = text.split('.');
        let major_part = parts.next()?;
        if is_x(major_part) {
            return None;
        }
        let major = major_part.parse().ok()?;
        let minor = match parts.next() {
            None => None,
            Some(part) if is_x(part) => None,
            Some(part) => Some(part.parse().ok()?),
        };
        let patch = match parts.next() {
            None => None,
            _ if minor.is_none() => None,
            Some(part) if is_x(part) => None,
            Some(part) => Some(part.parse().ok()?),
        };
        if patch.is_some() && parts.next().is_some() {
            return None;
        }
        Some(Partial {
            major,
            minor,
            patch,
            pre: Prerelease::EMPTY,
        })
    }

    /// Missing components padded with zeros.
    fn floored(&self) -> Version {
        Version {
            major: self.major,
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            pre: self.pre.clone(),
            build: BuildMetadata::EMPTY,
        }
    }

    /// Like [`Partial::floored`], but with the `-0` pre-release appended
    /// when the written version has no pre-release tag. Exclusive upper
    /// bounds built from it reject the named line's own pre-releases, the
    /// same way computed caret/tilde ceilings already do: `<2.0.0` stops
    /// short of `2.0.0-rc.1`, while `<2.0.0-rc.1` keeps admitting the
    /// earlier `2.0.0` pre-releases it was anchored in.
    fn exclusive_ceiling(&self) -> Version {
        if self.pre.is_empty() {
            version_floor(
                self.major,
                self.minor.unwrap_or(0),
                self.patch.unwrap_or(0),
            )
        } else {
            self.floored()
        }
    }
}

/// `^` upper bound: first non-zero component locks, with precision of the
/// written version respected (`^0` admits all of `0.x`, `^0.2` stops at
/// `0.3.0`).
fn caret_ceiling(partial: &Partial) -> Version {
    if partial.major > 0 {
        return band_floor(partial.major.saturating_add(1));
    }
    match (partial.minor, partial.patch) {
        (Some(0), Some(patch)) => version_floor(0, 0, patch.saturating_add(1)),
        (Some(minor), _) => version_floor(0, minor.saturating_add(1), 0),
        (None, _) => band_floor(1),
    }
}

/// `~` upper bound: next minor when one was written, next major otherwise.
fn tilde_ceiling(partial: &Partial) -> Version {
    match partial.minor {
        Some(minor) => version_floor(partial.major, minor.saturating_add(1), 0),
        None => band_floor(partial.major.saturating_add(1)),
    }
}

/// The lowest version of a release line, `-0` pre-release included, so
/// exclusive upper bounds reject the line's pre-releases as well.
fn version_floor(major: u64, minor: u64, patch: u64) -> Version {
    let mut version = Version::new(major, minor, patch);
    version.pre = Prerelease::new("0").unwrap_or(Prerelease::EMPTY);
    version
}

fn band_floor(major: u64) -> Version {
    version_floor(major, 0, 0)
}

/// Epoch `N` as the interval `[N.0.0-0, (N+1).0.0-0)`.
fn band_interval(epoch: Epoch) -> Interval {
    Interval::half_open(band_floor(epoch.0), band_floor(epoch.0.saturating_add(1)))
}

#[derive(Debug, Clone, PartialEq)]
enum Bound {
    Unbounded,
    Inclusive(Version),
    Exclusive(Version),
}

/// A contiguous version interval.
#[derive(Debug, Clone, PartialEq)]
struct Interval {
    lo: Bound,
    hi: Bound,
}

impl Interval {
    fn unbounded() -> Self {
        Interval {
            lo: Bound::Unbounded,
            hi: Bound::Unbounded,
        }
    }

    fn at_least(version: Version) -> Self {
        Interval {
            lo: Bound::Inclusive(version),
            hi: Bound::Unbounded,
        }
    }

    fn half_open(from: Version, to: Version) -> Self {
        Interval {
            lo: Bound::Inclusive(from),
            hi: Bound::Exclusive(to),
        }
    }

    /// The intersection of two intervals, `None` when it is empty.
    fn intersect(&self, other: &Interval) -> Option<Interval> {
        let narrowed = Interval {
            lo: highest_floor(&self.lo, &other.lo),
            hi: lowest_ceiling(&self.hi, &other.hi),
        };
        if narrowed.is_empty() {
            None
        } else {
            Some(narrowed)
        }
    }

    fn overlaps(&self, other: &Interval) -> bool {
        self.intersect(other).is_some()
    }

    fn is_empty(&self) -> bool {
        match (&self.lo, &self.hi) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (Bound::Inclusive(lo), Bound::Inclusive(hi)) => lo > hi,
            (Bound::Inclusive(lo), Bound::Exclusive(hi))
            | (Bound::Exclusive(lo), Bound::Inclusive(hi))
            | (Bound::Exclusive(lo), Bound::Exclusive(hi)) => lo >= hi,
        }
    }
}

/// The tighter of two lower bounds; at equal versions the exclusive bound
/// is tighter.
fn highest_floor(a: &Bound, b: &Bound) -> Bound {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Inclusive(av), Bound::Inclusive(bv)) => {
            Bound::Inclusive(std::cmp::max(av, bv).clone())
        }
        (Bound::Exclusive(av), Bound::Exclusive(bv)) => {
            Bound::Exclusive(std::cmp::max(av, bv).clone())
        }
        (Bound::Inclusive(iv), Bound::Exclusive(ev))
        | (Bound::Exclusive(ev), Bound::Inclusive(iv)) => {
            if ev >= iv {
                Bound::Exclusive(ev.clone())
            } else {
                Bound::Inclusive(iv.clone())
            }
        }
    }
}

/// The tighter of two upper bounds; at equal versions the exclusive bound
/// is tighter.
fn lowest_ceiling(a: &Bound, b: &Bound) -> Bound {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Inclusive(av), Bound::Inclusive(bv)) => {
            Bound::Inclusive(std::cmp::min(av, bv).clone())
        }
        (Bound::Exclusive(av), Bound::Exclusive(bv)) => {
            Bound::Exclusive(std::cmp::min(av, bv).clone())
        }
        (Bound::Inclusive(iv), Bound::Exclusive(ev))
        | (Bound::Exclusive(ev), Bound::Inclusive(iv)) => {
            if ev <= iv {
                Bound::Exclusive(ev.clone())
            } else {
                Bound::Inclusive(iv.clone())
            }
        }
    }
}

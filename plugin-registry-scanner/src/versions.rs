//! Lenient version parsing and per-epoch selection.

use semver::Version;

use crate::epoch::Epoch;

/// A candidate that survived parsing, original text preserved so tag names
/// round-trip into the report verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selected {
    pub raw: String,
    pub version: Version,
}

/// Parse a version string as written in tags and manifests.
///
/// Strips an optional `v`/`V` prefix and pads partial versions with zeros:
/// - "v1.2.3" -> Version(1, 2, 3)
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
///
/// Returns `None` for anything that still fails to parse.
#[must_use]
pub fn parse_loose(raw: &str) -> Option<Version> {
    let text = raw.trim();
    let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
    let parts: Vec<&str> = text.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => text.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// The best representative of an epoch among arbitrary candidate strings:
/// the highest stable version inside the epoch's band, or the highest
/// pre-release when no stable exists. Malformed candidates are skipped.
#[must_use]
pub fn select_best(candidates: &[String], epoch: Epoch) -> Option<Selected> {
    let in_band: Vec<Selected> = candidates
        .iter()
        .filter_map(|raw| {
            parse_loose(raw).map(|version| Selected {
                raw: raw.clone(),
                version,
            })
        })
        .filter(|candidate| epoch.contains(&candidate.version))
        .collect();

    let best_stable = in_band
        .iter()
        .filter(|candidate| candidate.version.pre.is_empty())
        .max_by(|a, b| a.version.cmp(&b.version))
        .cloned();
    best_stable.or_else(|| {
        in_band
            .into_iter()
            .max_by(|a, b| a.version.cmp(&b.version))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", Some("1.2.3"))]
    #[case("v1.2.3", Some("1.2.3"))]
    #[case("V2.0.0-beta.1", Some("2.0.0-beta.1"))]
    #[case("  1.2.3 ", Some("1.2.3"))]
    #[case("1", Some("1.0.0"))]
    #[case("1.2", Some("1.2.0"))]
    #[case("v2", Some("2.0.0"))]
    #[case("not-a-version", None)]
    #[case("", None)]
    #[case("v", None)]
    #[case("1.2.3.4", None)]
    fn parse_loose_normalizes_tags(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            parse_loose(raw),
            expected.map(|s| Version::parse(s).unwrap())
        );
    }

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    // Stable beats pre-release inside the band, even a higher pre-release.
    #[case(&["2.0.0-beta.1", "2.0.0"], 2, Some("2.0.0"))]
    #[case(&["1.5.0", "1.6.0-rc.1"], 1, Some("1.5.0"))]
    // Without a stable, the highest pre-release wins.
    #[case(&["2.0.0-alpha.2", "2.0.0-beta.1"], 2, Some("2.0.0-beta.1"))]
    // Only the requested epoch's band participates.
    #[case(&["0.9.0", "1.5.0", "2.3.0"], 1, Some("1.5.0"))]
    #[case(&["1.0.0"], 2, None)]
    // Original text is preserved, malformed candidates are skipped.
    #[case(&["v1.9.1", "1.4.0"], 1, Some("v1.9.1"))]
    #[case(&["garbage", "1.2.0"], 1, Some("1.2.0"))]
    #[case(&["garbage"], 1, None)]
    #[case(&[], 0, None)]
    fn select_best_picks_epoch_representative(
        #[case] candidates: &[&str],
        #[case] epoch: u64,
        #[case] expected: Option<&str>,
    ) {
        let selected = select_best(&strings(candidates), Epoch(epoch));
        assert_eq!(selected.map(|s| s.raw), expected.map(|s| s.to_string()));
    }

    #[test]
    fn select_best_is_idempotent() {
        let candidates = strings(&["1.0.0", "v1.2.0", "1.2.0-rc.1", "2.0.0"]);
        let first = select_best(&candidates, Epoch(1));
        let second = select_best(&candidates, Epoch(1));
        assert_eq!(first, second);
        assert_eq!(first.map(|s| s.raw), Some("v1.2.0".to_string()));
    }
}

//! Major-version compatibility epochs.
//!
//! The platform ships incompatible major lines; a plugin supports an epoch
//! when some version it accepts for the platform-core dependency falls inside
//! that epoch's band.

use std::fmt;

use semver::Version;

mod range;

pub use range::CoreRange;

/// A platform major-version line.
///
/// Epoch `N` covers the band `[N.0.0, (N+1).0.0)`, pre-releases of major `N`
/// included, so a plugin that only tracks `2.0.0-beta` builds still counts as
/// an epoch-2 plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(pub u64);

impl Epoch {
    /// Whether a concrete version belongs to this epoch's band.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        version.major == self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_v_prefixed_label() {
        assert_eq!(Epoch(0).to_string(), "v0");
        assert_eq!(Epoch(2).to_string(), "v2");
    }

    #[test]
    fn contains_checks_major_component_only() {
        let epoch = Epoch(2);
        assert!(epoch.contains(&Version::parse("2.0.0").unwrap()));
        assert!(epoch.contains(&Version::parse("2.99.1").unwrap()));
        assert!(epoch.contains(&Version::parse("2.0.0-beta.1").unwrap()));
        assert!(!epoch.contains(&Version::parse("1.9.9").unwrap()));
        assert!(!epoch.contains(&Version::parse("3.0.0-0").unwrap()));
    }

    #[test]
    fn epochs_order_by_major() {
        assert!(Epoch(0) < Epoch(1));
        assert!(Epoch(1) < Epoch(10));
    }
}

//! Buildpack release identification

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Product name used in migration warnings
pub const PRODUCT_NAME: &str = "PWA Studio Buildpack";

/// The buildpack release whose definitions are being applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackRelease {
    /// Product name (e.g., "PWA Studio Buildpack")
    pub product: String,
    /// Semantic version (e.g., "1.2.3")
    pub version: Version,
}

impl BuildpackRelease {
    pub fn new(product: impl Into<String>, version: Version) -> Self {
        Self {
            product: product.into(),
            version,
        }
    }

    /// The release of this crate
    pub fn current() -> Self {
        let version = Version::parse(env!("CARGO_PKG_VERSION"))
            .unwrap_or_else(|_| Version::new(0, 0, 0));
        Self::new(PRODUCT_NAME, version)
    }

    /// Create from a version string, with or without a leading 'v'
    pub fn parse(version_str: &str) -> Result<Self, semver::Error> {
        let version_str = version_str.strip_prefix('v').unwrap_or(version_str);
        let version = Version::parse(version_str)?;
        Ok(Self::new(PRODUCT_NAME, version))
    }

    /// Get the tag string (e.g., "v1.2.3")
    pub fn tag_string(&self) -> String {
        format!("v{}", self.version)
    }
}

impl Default for BuildpackRelease {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for BuildpackRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.product, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_parsing() {
        let release = BuildpackRelease::parse("2.1.0").unwrap();
        assert_eq!(release.tag_string(), "v2.1.0");
        assert_eq!(release.to_string(), "PWA Studio Buildpack v2.1.0");
    }

    #[test]
    fn test_release_with_v_prefix() {
        let release = BuildpackRelease::parse("v3.0.0-beta.1").unwrap();
        assert_eq!(release.version.major, 3);
        assert!(!release.version.pre.is_empty());
    }

    #[test]
    fn test_release_rejects_garbage() {
        assert!(BuildpackRelease::parse("next").is_err());
    }

    #[test]
    fn test_current_release_matches_crate() {
        let release = BuildpackRelease::current();
        assert_eq!(release.version.to_string(), env!("CARGO_PKG_VERSION"));
    }
}

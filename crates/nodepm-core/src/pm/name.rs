//! The closed set of supported package managers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A JavaScript package manager this crate knows how to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManagerName {
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManagerName {
    /// All managers in lockfile priority order (npm > yarn > pnpm).
    pub const ALL: [Self; 3] = [Self::Npm, Self::Yarn, Self::Pnpm];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
        }
    }

    /// Filename of the lockfile this manager writes.
    #[must_use]
    pub fn lockfile_name(&self) -> &'static str {
        match self {
            Self::Npm => "package-lock.json",
            Self::Yarn => "yarn.lock",
            Self::Pnpm => "pnpm-lock.yaml",
        }
    }

    /// Parse an exact lowercase manager name. Anything else is `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pm| pm.as_str() == name)
    }
}

impl fmt::Display for PackageManagerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManagerName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| crate::Error::UnknownPackageManager(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_exact_only() {
        assert_eq!(PackageManagerName::from_name("npm"), Some(PackageManagerName::Npm));
        assert_eq!(PackageManagerName::from_name("pnpm"), Some(PackageManagerName::Pnpm));
        assert_eq!(PackageManagerName::from_name("NPM"), None);
        assert_eq!(PackageManagerName::from_name("bun"), None);
        assert_eq!(PackageManagerName::from_name(""), None);
    }

    #[test]
    fn test_from_str_error() {
        let err = "berry".parse::<PackageManagerName>().unwrap_err();
        assert!(matches!(err, crate::Error::UnknownPackageManager(ref s) if s == "berry"));
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            PackageManagerName::ALL,
            [PackageManagerName::Npm, PackageManagerName::Yarn, PackageManagerName::Pnpm]
        );
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&PackageManagerName::Yarn).unwrap();
        assert_eq!(json, "\"yarn\"");
    }
}
